use super::channels::{Subscription, SubscriptionAction};
use super::codec::{MexcCodec, LOGIN_CHANNEL};
use super::router::{payload_text, ChannelRouter};
use super::types::{InboundFrame, MexcWsRequest};
use crate::core::config::StreamConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    EndpointLimit, FrameReader, FrameWriter, PendingRequests, RateGate, Signer, WsCodec, WsConfig,
    WsTransport,
};
use crate::core::traits::PairFormatter;
use crate::core::types::StreamEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

/// Lifecycle of one session instance; reconnecting means building a new instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected { authenticated: bool },
}

impl SessionState {
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    pub const fn is_authenticated(self) -> bool {
        matches!(
            self,
            Self::Connected {
                authenticated: true
            }
        )
    }
}

/// Writer half shared by callers and the keep-alive task; every send passes the rate gate
struct Outbound<W> {
    writer: Mutex<Option<W>>,
    codec: MexcCodec,
    gate: RateGate,
}

impl<W: FrameWriter> Outbound<W> {
    async fn send(
        &self,
        request: &MexcWsRequest,
        endpoint: EndpointLimit,
    ) -> Result<(), ExchangeError> {
        self.gate.acquire(endpoint).await?;
        let payload = self.codec.encode_request(request)?;

        let mut writer = self.writer.lock().await;
        let writer = writer.as_mut().ok_or_else(|| {
            ExchangeError::ConnectionError("session is not connected".to_string())
        })?;
        trace!(method = %request.method, "sending request");
        writer.send_text(payload).await
    }

    async fn close(&self) -> Result<(), ExchangeError> {
        match self.writer.lock().await.take() {
            Some(mut writer) => writer.close().await,
            None => Ok(()),
        }
    }
}

/// Streaming session against the MEXC contract WebSocket
///
/// Decoded events go to the receiver returned by [`MexcStream::new`]. The
/// session never reconnects by itself; after closure build a new instance and
/// resend the subscriptions.
pub struct MexcStream<T: WsTransport> {
    transport: T,
    config: StreamConfig,
    signer: Option<Arc<dyn Signer>>,
    outbound: Arc<Outbound<T::Writer>>,
    router: Arc<ChannelRouter>,
    pending: Arc<PendingRequests<InboundFrame>>,
    state: Arc<watch::Sender<SessionState>>,
    auth_lock: Mutex<()>,
    dialed: AtomicBool,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl<T: WsTransport> MexcStream<T> {
    pub fn new(
        transport: T,
        config: StreamConfig,
        signer: Option<Arc<dyn Signer>>,
        pairs: Arc<dyn PairFormatter>,
        gate: RateGate,
    ) -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (sink, events) = mpsc::unbounded_channel();
        let pending = Arc::new(PendingRequests::new());
        let router = Arc::new(ChannelRouter::new(pairs, pending.clone(), sink));
        let (state, _) = watch::channel(SessionState::Disconnected);

        let stream = Self {
            transport,
            config,
            signer,
            outbound: Arc::new(Outbound {
                writer: Mutex::new(None),
                codec: MexcCodec::new(),
                gate,
            }),
            router,
            pending,
            state: Arc::new(state),
            auth_lock: Mutex::new(()),
            dialed: AtomicBool::new(false),
            tasks: StdMutex::new(Vec::new()),
        };

        (stream, events)
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn has_credentials(&self) -> bool {
        self.signer.is_some()
    }

    /// Dial, start the read loop and, with credentials, log in
    ///
    /// A failed login leaves the session connected for public channels.
    #[instrument(skip(self), fields(exchange = "mexc", url = %self.config.ws_url))]
    pub async fn connect(&self) -> Result<(), ExchangeError> {
        if !self.config.enabled {
            return Err(ExchangeError::FeatureDisabled(
                "MEXC streaming is disabled by configuration".to_string(),
            ));
        }
        if self.dialed.swap(true, Ordering::SeqCst) {
            return Err(ExchangeError::ConnectionError(
                "session already dialed; create a new session to reconnect".to_string(),
            ));
        }

        self.state.send_replace(SessionState::Connecting);
        let (writer, reader) = match self
            .transport
            .dial(&self.config.ws_url, &WsConfig::from(&self.config))
            .await
        {
            Ok(halves) => halves,
            Err(e) => {
                self.state.send_replace(SessionState::Disconnected);
                return Err(e);
            }
        };

        *self.outbound.writer.lock().await = Some(writer);
        self.state.send_replace(SessionState::Connected {
            authenticated: false,
        });
        info!("stream connected");

        let read_loop = tokio::spawn(read_loop(
            reader,
            self.outbound.clone(),
            self.router.clone(),
            self.pending.clone(),
            self.state.clone(),
        ));
        self.track(read_loop);

        if !self.config.ping_interval.is_zero() {
            let keep_alive = tokio::spawn(keep_alive(
                self.outbound.clone(),
                self.config.ping_interval,
                self.state.subscribe(),
            ));
            self.track(keep_alive);
        }

        if self.signer.is_some() {
            if let Err(e) = self.authenticate().await {
                warn!(error = %e, "login failed, continuing with public channels only");
            }
        }

        Ok(())
    }

    /// Send a signed login and wait for the correlated reply
    #[instrument(skip(self), fields(exchange = "mexc"))]
    pub async fn authenticate(&self) -> Result<(), ExchangeError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| ExchangeError::auth(None, "no credentials configured"))?;
        if !self.state().is_connected() {
            return Err(ExchangeError::ConnectionError(
                "cannot log in before connecting".to_string(),
            ));
        }

        let _guard = self.auth_lock.lock().await;
        let outcome = self.login(signer.as_ref()).await;
        self.set_authenticated(outcome.is_ok());

        match &outcome {
            Ok(()) => info!("authenticated"),
            Err(e) => warn!(error = %e, "authentication failed"),
        }
        outcome
    }

    async fn login(&self, signer: &dyn Signer) -> Result<(), ExchangeError> {
        let timestamp = u64::try_from(chrono::Utc::now().timestamp_millis())
            .map_err(|_| ExchangeError::auth(None, "system clock is before the epoch"))?;
        let request = MexcCodec::login_request(&signer.sign_login(timestamp)?);

        // Registered before sending so a fast reply cannot be missed
        let reply = self.pending.register(LOGIN_CHANNEL);
        if let Err(e) = self.outbound.send(&request, EndpointLimit::WsLogin).await {
            self.pending.cancel(LOGIN_CHANNEL);
            return Err(e);
        }

        let frame = match tokio::time::timeout(self.config.auth_timeout, reply).await {
            Ok(Ok(frame)) => frame,
            Ok(Err(_)) => {
                return Err(ExchangeError::auth(
                    None,
                    "session closed before the login reply arrived",
                ))
            }
            Err(_) => {
                self.pending.cancel(LOGIN_CHANNEL);
                return Err(ExchangeError::auth(
                    None,
                    format!("no login reply within {:?}", self.config.auth_timeout),
                ));
            }
        };

        login_outcome(&frame)
    }

    fn set_authenticated(&self, authenticated: bool) {
        self.state.send_if_modified(|state| match state {
            SessionState::Connected {
                authenticated: current,
            } if *current != authenticated => {
                *current = authenticated;
                true
            }
            _ => false,
        });
    }

    pub async fn subscribe(&self, subscriptions: &[Subscription]) -> Result<(), ExchangeError> {
        self.send_subscriptions(subscriptions, SubscriptionAction::Subscribe)
            .await
    }

    pub async fn unsubscribe(&self, subscriptions: &[Subscription]) -> Result<(), ExchangeError> {
        self.send_subscriptions(subscriptions, SubscriptionAction::Unsubscribe)
            .await
    }

    /// Requests go out one by one; the first failed send aborts the rest
    ///
    /// Earlier requests of the batch may already have been sent. Resending the
    /// whole batch is safe since the venue ignores duplicate subscriptions.
    #[instrument(skip(self, subscriptions), fields(exchange = "mexc", count = subscriptions.len()))]
    pub async fn send_subscriptions(
        &self,
        subscriptions: &[Subscription],
        action: SubscriptionAction,
    ) -> Result<(), ExchangeError> {
        let batches = subscriptions
            .iter()
            .map(|subscription| subscription.requests(action))
            .collect::<Result<Vec<_>, _>>()?;

        if !self.is_authenticated()
            && subscriptions.iter().any(|s| s.family.is_private())
        {
            debug!("private channel requested on an unauthenticated session");
        }

        for request in batches.into_iter().flatten() {
            self.outbound
                .send(&request, action.endpoint())
                .await
                .map_err(|e| ExchangeError::SubscriptionError {
                    channel: request.method.clone(),
                    reason: e.to_string(),
                })?;
            debug!(
                method = %request.method,
                symbol = ?request.param.as_ref().and_then(|p| p.symbol.as_deref()),
                "request sent"
            );
        }

        Ok(())
    }

    /// Close the transport; the read loop ends once the peer confirms
    pub async fn close(&self) -> Result<(), ExchangeError> {
        let result = self.outbound.close().await;
        self.pending.cancel(LOGIN_CHANNEL);
        self.state.send_replace(SessionState::Disconnected);
        result
    }

    fn track(&self, task: JoinHandle<()>) {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);
    }
}

impl<T: WsTransport> Drop for MexcStream<T> {
    fn drop(&mut self) {
        for task in self
            .tasks
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
        {
            task.abort();
        }
    }
}

fn login_outcome(frame: &InboundFrame) -> Result<(), ExchangeError> {
    if frame.channel == LOGIN_CHANNEL && frame.data.as_str() == Some("success") {
        return Ok(());
    }

    let message = frame
        .msg
        .clone()
        .unwrap_or_else(|| payload_text(&frame.data));
    Err(ExchangeError::auth(frame.code, message))
}

async fn read_loop<R: FrameReader, W: FrameWriter>(
    mut reader: R,
    outbound: Arc<Outbound<W>>,
    router: Arc<ChannelRouter>,
    pending: Arc<PendingRequests<InboundFrame>>,
    state: Arc<watch::Sender<SessionState>>,
) {
    let codec = MexcCodec::new();

    loop {
        let raw = match reader.read_frame().await {
            Ok(raw) if raw.is_empty() => {
                debug!("transport closed, read loop exiting");
                break;
            }
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "transport read failed, read loop exiting");
                router.emit(StreamEvent::Error(e));
                break;
            }
        };

        if let Err(e) = codec.decode_frame(&raw).and_then(|frame| router.route(frame)) {
            if e.is_frame_local() {
                debug!(error = %e, "dropping frame");
            } else {
                warn!(error = %e, "venue reported an error");
            }
            router.emit(StreamEvent::Error(e));
        }

        if router.is_consumer_closed() {
            debug!("consumer dropped, read loop exiting");
            break;
        }
    }

    // Later sends fail instead of writing into a dead connection
    outbound.writer.lock().await.take();
    pending.cancel(LOGIN_CHANNEL);
    state.send_replace(SessionState::Disconnected);
}

async fn keep_alive<W: FrameWriter>(
    outbound: Arc<Outbound<W>>,
    period: Duration,
    mut state: watch::Receiver<SessionState>,
) {
    let mut ticker = tokio::time::interval(period);
    // First tick fires immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = outbound.send(&MexcCodec::ping_request(), EndpointLimit::WsPing).await {
                    debug!(error = %e, "keep-alive stopped");
                    break;
                }
            }
            changed = state.changed() => {
                if changed.is_err() || !state.borrow().is_connected() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::mexc::codec::ERROR_CHANNEL;
    use serde_json::json;

    fn frame(channel: &str, data: serde_json::Value) -> InboundFrame {
        InboundFrame {
            channel: channel.to_string(),
            data,
            ..InboundFrame::default()
        }
    }

    #[test]
    fn test_login_outcome() {
        assert!(login_outcome(&frame(LOGIN_CHANNEL, json!("success"))).is_ok());

        let rejected = InboundFrame {
            code: Some(602),
            ..frame(LOGIN_CHANNEL, json!("Signature verification failed!"))
        };
        match login_outcome(&rejected) {
            Err(ExchangeError::AuthenticationError { code, message }) => {
                assert_eq!(code, Some(602));
                assert_eq!(message, "Signature verification failed!");
            }
            other => panic!("unexpected {:?}", other),
        }

    }

    #[test]
    fn test_error_channel_login_keeps_venue_text() {
        let rejected = InboundFrame {
            code: Some(401),
            msg: Some("Api key info invalid".to_string()),
            ..frame(ERROR_CHANNEL, json!("bad key"))
        };
        match login_outcome(&rejected) {
            Err(ExchangeError::AuthenticationError { code, message }) => {
                assert_eq!(code, Some(401));
                assert_eq!(message, "Api key info invalid");
            }
            other => panic!("unexpected {:?}", other),
        }

        match login_outcome(&frame(ERROR_CHANNEL, json!("bad key"))) {
            Err(ExchangeError::AuthenticationError { code, message }) => {
                assert_eq!(code, None);
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_state_flags() {
        assert!(!SessionState::Disconnected.is_connected());
        assert!(!SessionState::Connecting.is_authenticated());
        assert!(SessionState::Connected {
            authenticated: false
        }
        .is_connected());
        assert!(SessionState::Connected {
            authenticated: true
        }
        .is_authenticated());
    }
}
