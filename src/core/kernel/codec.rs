use crate::core::errors::ExchangeError;

/// Converts between a venue's wire text and its typed requests and frames
///
/// Implementations are stateless; the session owns one and calls it from both
/// the sending callers and the read loop.
pub trait WsCodec: Send + Sync + 'static {
    /// Outbound request understood by the venue
    type Request: Send + Sync;

    /// Inbound envelope, decoded far enough to be routed
    type Frame: Send;

    /// Serialize a request into the text payload written to the transport
    fn encode_request(&self, request: &Self::Request) -> Result<String, ExchangeError>;

    /// Parse one raw transport frame into its envelope
    ///
    /// Fails with [`ExchangeError::DecodeError`] or [`ExchangeError::JsonError`]
    /// when the outer envelope is not valid; the payload itself stays undecoded.
    fn decode_frame(&self, raw: &[u8]) -> Result<Self::Frame, ExchangeError>;
}
