use crate::core::{errors::ExchangeError, types::Symbol};

/// Translates between a venue's symbol spelling and the canonical [`Symbol`]
///
/// The stream treats venue symbols as opaque strings and only calls this when it
/// builds a domain event.
pub trait PairFormatter: Send + Sync {
    fn to_pair(&self, venue_symbol: &str) -> Result<Symbol, ExchangeError>;

    fn to_venue(&self, pair: &Symbol) -> String;
}

/// `BASE<delimiter>QUOTE` spelling, e.g. `BTC_USDT`
#[derive(Debug, Clone, Copy)]
pub struct DelimitedPairs {
    delimiter: char,
}

impl DelimitedPairs {
    pub const fn new(delimiter: char) -> Self {
        Self { delimiter }
    }
}

impl Default for DelimitedPairs {
    fn default() -> Self {
        Self::new('_')
    }
}

impl PairFormatter for DelimitedPairs {
    fn to_pair(&self, venue_symbol: &str) -> Result<Symbol, ExchangeError> {
        let (base, quote) = venue_symbol.split_once(self.delimiter).ok_or_else(|| {
            ExchangeError::decode(format!(
                "symbol '{}' has no '{}' separator",
                venue_symbol, self.delimiter
            ))
        })?;

        if quote.contains(self.delimiter) {
            return Err(ExchangeError::decode(format!(
                "symbol '{}' has more than one '{}' separator",
                venue_symbol, self.delimiter
            )));
        }

        Symbol::new(base, quote)
            .map_err(|_| ExchangeError::decode(format!("malformed symbol '{}'", venue_symbol)))
    }

    fn to_venue(&self, pair: &Symbol) -> String {
        format!("{}{}{}", pair.base, self.delimiter, pair.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underscore_pairs_round_trip() {
        let pairs = DelimitedPairs::default();
        let symbol = pairs.to_pair("BTC_USDT").unwrap();
        assert_eq!(symbol.base, "BTC");
        assert_eq!(symbol.quote, "USDT");
        assert_eq!(pairs.to_venue(&symbol), "BTC_USDT");
    }

    #[test]
    fn test_malformed_symbols_rejected() {
        let pairs = DelimitedPairs::default();
        assert!(pairs.to_pair("BTCUSDT").is_err());
        assert!(pairs.to_pair("_USDT").is_err());
        assert!(pairs.to_pair("BTC_USDT_PERP").is_err());
    }
}
