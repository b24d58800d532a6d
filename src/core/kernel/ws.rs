use crate::core::config::StreamConfig;
use crate::core::errors::ExchangeError;
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{debug, instrument, warn};

/// Transport budget applied when dialing
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub connect_timeout: Duration,
    pub max_frame_size: usize,
    pub write_buffer_size: usize,
    pub max_message_size: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self::from(&StreamConfig::default())
    }
}

impl From<&StreamConfig> for WsConfig {
    fn from(config: &StreamConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
            max_frame_size: config.max_frame_size,
            write_buffer_size: config.write_buffer_size,
            max_message_size: config.max_message_size,
        }
    }
}

/// Dials a message-oriented connection and hands back its two halves
///
/// The writer is shared by every caller that sends requests; the reader is owned
/// by the session's single read loop.
#[async_trait]
pub trait WsTransport: Send + Sync + 'static {
    type Writer: FrameWriter;
    type Reader: FrameReader;

    async fn dial(
        &self,
        url: &str,
        config: &WsConfig,
    ) -> Result<(Self::Writer, Self::Reader), ExchangeError>;
}

#[async_trait]
pub trait FrameWriter: Send + 'static {
    async fn send_text(&mut self, payload: String) -> Result<(), ExchangeError>;

    async fn close(&mut self) -> Result<(), ExchangeError>;
}

#[async_trait]
pub trait FrameReader: Send + 'static {
    /// Blocks until the next data frame arrives.
    ///
    /// An empty frame means the peer closed the connection; no further frames follow.
    async fn read_frame(&mut self) -> Result<Vec<u8>, ExchangeError>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Tungstenite-based transport
#[derive(Debug, Clone)]
pub struct TungsteniteWs {
    exchange_name: String,
}

impl TungsteniteWs {
    pub fn new(exchange_name: impl Into<String>) -> Self {
        Self {
            exchange_name: exchange_name.into(),
        }
    }
}

pub struct TungsteniteWriter {
    sink: SplitSink<WsStream, Message>,
    closed: bool,
}

pub struct TungsteniteReader {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl WsTransport for TungsteniteWs {
    type Writer = TungsteniteWriter;
    type Reader = TungsteniteReader;

    #[instrument(skip(self, config), fields(exchange = %self.exchange_name, url = %url))]
    async fn dial(
        &self,
        url: &str,
        config: &WsConfig,
    ) -> Result<(Self::Writer, Self::Reader), ExchangeError> {
        let ws_config = WebSocketConfig {
            write_buffer_size: config.write_buffer_size,
            max_message_size: Some(config.max_message_size),
            max_frame_size: Some(config.max_frame_size),
            ..WebSocketConfig::default()
        };

        let (ws_stream, _) = tokio::time::timeout(
            config.connect_timeout,
            connect_async_with_config(url, Some(ws_config), true),
        )
        .await
        .map_err(|_| {
            ExchangeError::ConnectionError(format!(
                "connection to {} timed out after {:?}",
                url, config.connect_timeout
            ))
        })?
        .map_err(|e| ExchangeError::ConnectionError(format!("WebSocket dial failed: {}", e)))?;

        debug!("WebSocket connected");
        let (sink, stream) = ws_stream.split();
        Ok((
            TungsteniteWriter {
                sink,
                closed: false,
            },
            TungsteniteReader { stream },
        ))
    }
}

#[async_trait]
impl FrameWriter for TungsteniteWriter {
    async fn send_text(&mut self, payload: String) -> Result<(), ExchangeError> {
        if self.closed {
            return Err(ExchangeError::ConnectionError(
                "WebSocket already closed".to_string(),
            ));
        }

        self.sink.send(Message::Text(payload)).await.map_err(|e| {
            ExchangeError::ConnectionError(format!("Failed to send WebSocket message: {}", e))
        })
    }

    async fn close(&mut self) -> Result<(), ExchangeError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        match self.sink.send(Message::Close(None)).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(ExchangeError::ConnectionError(format!(
                "Failed to close WebSocket: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl FrameReader for TungsteniteReader {
    async fn read_frame(&mut self) -> Result<Vec<u8>, ExchangeError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) if !text.is_empty() => return Ok(text.into_bytes()),
                Some(Ok(Message::Binary(data))) if !data.is_empty() => return Ok(data),
                // Pings are answered by tungstenite itself
                Some(Ok(Message::Text(_) | Message::Binary(_) | Message::Ping(_))) => {}
                Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "WebSocket closed by peer");
                    return Ok(Vec::new());
                }
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    return Ok(Vec::new());
                }
                Some(Err(e)) => {
                    warn!("WebSocket read failed: {}", e);
                    return Err(ExchangeError::ConnectionError(format!(
                        "WebSocket error: {}",
                        e
                    )));
                }
            }
        }
    }
}
