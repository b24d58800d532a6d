#![allow(dead_code)]

use async_trait::async_trait;
use mexcx::core::errors::ExchangeError;
use mexcx::core::kernel::{FrameReader, FrameWriter, WsConfig, WsTransport};
use serde_json::Value;
use std::env;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// Test configuration utilities
pub struct TestConfig;

impl TestConfig {
    /// Check if live API tests should run (network access to the venue)
    pub fn should_run_live_tests() -> bool {
        env::var("RUN_LIVE_TESTS").unwrap_or_default() == "true"
    }

    /// Get test timeout duration
    pub fn test_timeout() -> Duration {
        Duration::from_secs(
            env::var("TEST_TIMEOUT_SECONDS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(30),
        )
    }
}

/// In-memory transport: the test plays the venue through [`MockVenue`]
pub struct MockTransport {
    halves: Mutex<Option<(MockWriter, MockReader)>>,
}

pub struct MockWriter {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedSender<Vec<u8>>,
    closed: bool,
}

pub struct MockReader {
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// Venue side of a [`MockTransport`]
pub struct MockVenue {
    requests: mpsc::UnboundedReceiver<String>,
    frames: mpsc::UnboundedSender<Vec<u8>>,
}

impl MockTransport {
    pub fn pair() -> (Self, MockVenue) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let transport = Self {
            halves: Mutex::new(Some((
                MockWriter {
                    outbound: outbound_tx,
                    inbound: inbound_tx.clone(),
                    closed: false,
                },
                MockReader {
                    inbound: inbound_rx,
                },
            ))),
        };
        let venue = MockVenue {
            requests: outbound_rx,
            frames: inbound_tx,
        };
        (transport, venue)
    }

    /// A transport whose dial always fails
    pub fn unreachable() -> Self {
        Self {
            halves: Mutex::new(None),
        }
    }
}

#[async_trait]
impl WsTransport for MockTransport {
    type Writer = MockWriter;
    type Reader = MockReader;

    async fn dial(
        &self,
        url: &str,
        _config: &WsConfig,
    ) -> Result<(Self::Writer, Self::Reader), ExchangeError> {
        self.halves
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ExchangeError::ConnectionError(format!("cannot reach {}", url)))
    }
}

#[async_trait]
impl FrameWriter for MockWriter {
    async fn send_text(&mut self, payload: String) -> Result<(), ExchangeError> {
        if self.closed {
            return Err(ExchangeError::ConnectionError("closed".to_string()));
        }
        self.outbound
            .send(payload)
            .map_err(|_| ExchangeError::ConnectionError("venue hung up".to_string()))
    }

    async fn close(&mut self) -> Result<(), ExchangeError> {
        self.closed = true;
        // Echo the close so the read loop sees the connection end
        let _ = self.inbound.send(Vec::new());
        Ok(())
    }
}

#[async_trait]
impl FrameReader for MockReader {
    async fn read_frame(&mut self) -> Result<Vec<u8>, ExchangeError> {
        Ok(self.inbound.recv().await.unwrap_or_default())
    }
}

impl MockVenue {
    pub fn push(&self, frame: &str) {
        self.frames.send(frame.as_bytes().to_vec()).unwrap();
    }

    /// Close the connection from the venue side
    pub fn hang_up(&self) {
        self.frames.send(Vec::new()).unwrap();
    }

    /// Next request the client wrote, skipping keep-alive pings
    pub async fn next_request(&mut self) -> Value {
        loop {
            let text = tokio::time::timeout(Duration::from_secs(5), self.requests.recv())
                .await
                .expect("no request within 5s")
                .expect("client writer dropped");
            let value: Value = serde_json::from_str(&text).unwrap();
            if value["method"] != "ping" {
                return value;
            }
        }
    }

    /// Next raw request, pings included
    pub async fn next_raw_request(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(5), self.requests.recv())
            .await
            .expect("no request within 5s")
            .expect("client writer dropped")
    }

    pub fn try_next_request(&mut self) -> Option<String> {
        self.requests.try_recv().ok()
    }

    /// Stop reading requests; later sends by the client fail
    pub fn stop_listening(&mut self) {
        self.requests.close();
        while self.requests.try_recv().is_ok() {}
    }
}
