use crate::core::config::{ExchangeConfig, StreamConfig};
use crate::core::kernel::{
    GovernorRateLimiter, HmacSigner, RateGate, RateLimiter, Signer, TungsteniteWs, WsTransport,
};
use crate::core::traits::{DelimitedPairs, PairFormatter};
use crate::core::types::StreamEvent;
use crate::exchanges::mexc::session::MexcStream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Builder for MEXC streaming sessions
///
/// Without credentials the session stays public-only and never attempts to log in.
pub struct MexcBuilder {
    config: ExchangeConfig,
    stream: StreamConfig,
    pairs: Arc<dyn PairFormatter>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
}

impl Default for MexcBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MexcBuilder {
    pub fn new() -> Self {
        Self {
            config: ExchangeConfig::read_only(),
            stream: StreamConfig::default(),
            pairs: Arc::new(DelimitedPairs::default()),
            rate_limiter: None,
        }
    }

    /// Set the exchange configuration
    pub fn with_config(mut self, config: ExchangeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set API credentials
    pub fn with_credentials(mut self, api_key: String, secret_key: String) -> Self {
        self.config = ExchangeConfig::new(api_key, secret_key);
        self
    }

    pub fn with_stream_config(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_ws_url(mut self, ws_url: impl Into<String>) -> Self {
        self.stream = self.stream.ws_url(ws_url);
        self
    }

    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.stream = self.stream.auth_timeout(timeout);
        self
    }

    /// Set the keep-alive ping interval; zero disables pings
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.stream = self.stream.ping_interval(interval);
        self
    }

    pub fn with_pair_formatter(mut self, pairs: Arc<dyn PairFormatter>) -> Self {
        self.pairs = pairs;
        self
    }

    /// Share an existing limiter, e.g. one also used by a REST client on the same account
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Build a session over tokio-tungstenite
    pub fn build(self) -> (MexcStream<TungsteniteWs>, mpsc::UnboundedReceiver<StreamEvent>) {
        self.build_with_transport(TungsteniteWs::new("mexc"))
    }

    pub fn build_with_transport<T: WsTransport>(
        self,
        transport: T,
    ) -> (MexcStream<T>, mpsc::UnboundedReceiver<StreamEvent>) {
        let signer = self.config.has_credentials().then(|| {
            Arc::new(HmacSigner::new(
                self.config.api_key().to_string(),
                self.config.secret_key().to_string(),
            )) as Arc<dyn Signer>
        });
        let limiter = self
            .rate_limiter
            .unwrap_or_else(|| Arc::new(GovernorRateLimiter::default()) as Arc<dyn RateLimiter>);
        let gate = RateGate::new(limiter, self.stream.rate_limit_window);

        MexcStream::new(transport, self.stream, signer, self.pairs, gate)
    }
}

/// Public or private session from credentials and default settings
pub fn build_stream(
    config: ExchangeConfig,
) -> (MexcStream<TungsteniteWs>, mpsc::UnboundedReceiver<StreamEvent>) {
    MexcBuilder::new().with_config(config).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::mexc::session::SessionState;

    #[test]
    fn test_read_only_build_has_no_signer() {
        let (stream, _events) = MexcBuilder::new().build();
        assert!(!stream.has_credentials());
        assert_eq!(stream.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_credentials_enable_login() {
        let (stream, _events) =
            build_stream(ExchangeConfig::new("key".to_string(), "secret".to_string()));
        assert!(stream.has_credentials());
        assert!(!stream.is_authenticated());
    }
}
