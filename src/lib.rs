pub mod core;
pub mod exchanges;

pub use crate::core::{errors::ExchangeError, traits::PairFormatter, types::*};
pub use crate::exchanges::mexc::{MexcBuilder, MexcStream, SessionState, Subscription};
