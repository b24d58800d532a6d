use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Feature disabled: {0}")]
    FeatureDisabled(String),

    #[error("Authentication error: {message} (code: {code:?})")]
    AuthenticationError { code: Option<i64>, message: String },

    #[error("Unsupported kline interval: {0}")]
    UnsupportedInterval(String),

    #[error("Unsupported {kind} code: {code}")]
    UnsupportedCode { kind: &'static str, code: String },

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Subscription to {channel} failed: {reason}")]
    SubscriptionError { channel: String, reason: String },

    #[error("Venue error: {message} (code: {code:?})")]
    VenueError { code: Option<i64>, message: String },

    #[error("Rate limit exceeded for {0}")]
    RateLimited(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

impl ExchangeError {
    #[cold]
    #[inline(never)]
    pub fn auth(code: Option<i64>, message: impl Into<String>) -> Self {
        Self::AuthenticationError {
            code,
            message: message.into(),
        }
    }

    #[cold]
    #[inline(never)]
    pub fn unsupported_code(kind: &'static str, code: impl ToString) -> Self {
        Self::UnsupportedCode {
            kind,
            code: code.to_string(),
        }
    }

    #[cold]
    #[inline(never)]
    pub fn decode(details: impl Into<String>) -> Self {
        Self::DecodeError(details.into())
    }

    /// Whether the error came from a single malformed frame rather than the session
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            Self::DecodeError(_) | Self::JsonError(_) | Self::UnsupportedCode { .. }
        )
    }
}
