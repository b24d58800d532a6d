/// `mexcx` Kernel - exchange-agnostic streaming plumbing
///
/// The kernel holds transport, signing, rate gating and request correlation.
/// Nothing in here knows about a particular venue's channels or payloads.
///
/// ## Transport
/// - `WsTransport`: dials a connection and splits it into a shared `FrameWriter`
///   and a `FrameReader` owned by the read loop
/// - `TungsteniteWs`: tokio-tungstenite implementation
///
/// ## Message Handling
/// - `WsCodec`: venue request encoding and envelope decoding
///
/// ## Authentication
/// - `Signer` / `HmacSigner`: login signatures
///
/// ## Outbound Rate Gate
/// - `RateLimiter`: weighted bucket limiter contract
/// - `GovernorRateLimiter`: `governor`-backed default
/// - `RateGate`: per-endpoint acquisition bounded by a window
///
/// ## Correlation
/// - `PendingRequests`: callers waiting on a reply delivered by the read loop
///
/// # Example
/// ```rust,no_run
/// use mexcx::core::kernel::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gate = RateGate::new(Arc::new(GovernorRateLimiter::default()), Duration::from_secs(10));
/// gate.acquire(EndpointLimit::WsSubscribe).await?;
///
/// let transport = TungsteniteWs::new("mexc");
/// let (mut writer, mut reader) = transport
///     .dial("wss://contract.mexc.com/edge", &WsConfig::default())
///     .await?;
/// writer.send_text(r#"{"method":"ping"}"#.to_string()).await?;
/// let frame = reader.read_frame().await?;
/// assert!(!frame.is_empty());
/// # Ok(())
/// # }
/// ```
pub mod codec;
pub mod pending;
pub mod rate_limit;
pub mod signer;
pub mod ws;

pub use codec::WsCodec;
pub use pending::PendingRequests;
pub use rate_limit::{BucketFamily, EndpointLimit, GovernorRateLimiter, RateGate, RateLimiter};
pub use signer::{HmacSigner, LoginSignature, Signer};
pub use ws::{
    FrameReader, FrameWriter, TungsteniteReader, TungsteniteWriter, TungsteniteWs, WsConfig,
    WsTransport,
};
