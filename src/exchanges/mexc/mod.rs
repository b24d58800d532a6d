pub mod channels;
pub mod codec;
pub mod conversions;
pub mod converters;
pub mod types;

pub mod builder;
pub mod router;
pub mod session;

// Re-export main components
pub use builder::{build_stream, MexcBuilder};
pub use channels::{ChannelFamily, Subscription, SubscriptionAction};
pub use codec::MexcCodec;
pub use router::ChannelRouter;
pub use session::{MexcStream, SessionState};
pub use types::{InboundFrame, MexcRequestParam, MexcWsRequest};
