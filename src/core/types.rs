use crate::core::errors::ExchangeError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical trading pair, independent of any venue's symbol spelling
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub base: String,
    pub quote: String,
}

impl Symbol {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Result<Self, ExchangeError> {
        let base = base.into();
        let quote = quote.into();

        if base.is_empty() || quote.is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "Base and quote assets cannot be empty".to_string(),
            ));
        }

        Ok(Self { base, quote })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Type-safe price representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::str")] pub Decimal);

impl Price {
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe quantity representation (contracts for futures, base units for balances)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(#[serde(with = "rust_decimal::serde::str")] pub Decimal);

impl Quantity {
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Candle widths a caller can ask for; each venue supports a subset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KlineInterval {
    Seconds1,
    Minutes1,
    Minutes3,
    Minutes5,
    Minutes15,
    Minutes30,
    Hours1,
    Hours2,
    Hours4,
    Hours6,
    Hours8,
    Hours12,
    Days1,
    Days3,
    Weeks1,
    Months1,
}

impl KlineInterval {
    pub const ALL: [Self; 16] = [
        Self::Seconds1,
        Self::Minutes1,
        Self::Minutes3,
        Self::Minutes5,
        Self::Minutes15,
        Self::Minutes30,
        Self::Hours1,
        Self::Hours2,
        Self::Hours4,
        Self::Hours6,
        Self::Hours8,
        Self::Hours12,
        Self::Days1,
        Self::Days3,
        Self::Weeks1,
        Self::Months1,
    ];
}

impl fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            Self::Seconds1 => "1 second",
            Self::Minutes1 => "1 minute",
            Self::Minutes3 => "3 minutes",
            Self::Minutes5 => "5 minutes",
            Self::Minutes15 => "15 minutes",
            Self::Minutes30 => "30 minutes",
            Self::Hours1 => "1 hour",
            Self::Hours2 => "2 hours",
            Self::Hours4 => "4 hours",
            Self::Hours6 => "6 hours",
            Self::Hours8 => "8 hours",
            Self::Hours12 => "12 hours",
            Self::Days1 => "1 day",
            Self::Days3 => "3 days",
            Self::Weeks1 => "1 week",
            Self::Months1 => "1 month",
        };
        write!(f, "{}", description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    GTC,      // Good Till Canceled
    PostOnly, // Maker only
    IOC,      // Immediate or Cancel
    FOK,      // Fill or Kill
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted locally, not yet on the book
    Pending,
    /// Working on the book, possibly partially filled
    Open,
    Filled,
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarginType {
    Isolated,
    Cross,
}

/// What a fill or order does to the holder's position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionEffect {
    Open,
    Close,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionState {
    Holding,
    SystemHolding,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionMode {
    Hedge,
    OneWay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: Symbol,
    pub last_price: Price,
    /// Book, range and interest fields are absent from the aggregate all-symbols feed
    pub bid_price: Option<Price>,
    pub ask_price: Option<Price>,
    pub high_24h: Option<Price>,
    pub low_24h: Option<Price>,
    pub volume_24h: Option<Quantity>,
    pub open_interest: Option<Quantity>,
    pub price_change_24h: Option<Decimal>,
    pub price_change_ratio_24h: Decimal,
    pub index_price: Option<Price>,
    pub fair_price: Option<Price>,
    pub funding_rate: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub price: Price,
    pub quantity: Quantity,
    pub side: OrderSide,
    pub position_effect: PositionEffect,
    pub is_self_trade: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    pub price: Price,
    pub quantity: Quantity,
    /// Resting orders at this level, when the venue reports it
    pub order_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderBookUpdateKind {
    /// Levels replace the book up to the subscribed depth
    Snapshot,
    /// Levels patch the book; zero quantity removes a level
    Delta,
}

/// Book payload for a downstream order-book store; entries keep wire order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookUpdate {
    pub symbol: Symbol,
    pub kind: OrderBookUpdateKind,
    pub bids: Vec<OrderBookEntry>,
    pub asks: Vec<OrderBookEntry>,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub symbol: Symbol,
    pub interval: KlineInterval,
    pub open_time: DateTime<Utc>,
    pub open_price: Price,
    pub high_price: Price,
    pub low_price: Price,
    pub close_price: Price,
    pub volume: Quantity,
    pub quote_volume: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRate {
    pub symbol: Symbol,
    pub funding_rate: Decimal,
    pub next_funding_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePrice {
    pub symbol: Symbol,
    pub price: Price,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub asset: String,
    pub available: Quantity,
    pub frozen: Quantity,
    pub position_margin: Quantity,
    pub cash_balance: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub order_id: String,
    pub client_order_id: Option<String>,
    pub symbol: Symbol,
    pub position_id: Option<u64>,
    pub side: PositionSide,
    /// Whether the order reduces an existing position
    pub position_effect: PositionEffect,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub margin_type: MarginType,
    pub status: OrderStatus,
    pub price: Price,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub average_fill_price: Price,
    pub leverage: Decimal,
    pub taker_fee: Decimal,
    pub maker_fee: Decimal,
    pub realized_pnl: Decimal,
    pub fee_asset: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub position_id: u64,
    pub symbol: Symbol,
    pub side: PositionSide,
    pub margin_type: MarginType,
    pub state: PositionState,
    pub quantity: Quantity,
    pub frozen_quantity: Quantity,
    pub entry_price: Price,
    pub liquidation_price: Option<Price>,
    pub margin: Decimal,
    pub realized_pnl: Decimal,
    pub adl_level: Option<u8>,
    pub leverage: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdlLevelUpdate {
    pub position_id: u64,
    pub adl_level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimitUpdate {
    pub symbol: Symbol,
    pub side: PositionSide,
    pub level: u32,
    pub max_quantity: Quantity,
    pub max_leverage: Decimal,
    pub maintenance_margin_rate: Decimal,
    pub initial_margin_rate: Decimal,
}

/// Typed, decoded venue push, ready for consumption independent of the wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainEvent {
    Ticker(Ticker),
    Tickers(Vec<Ticker>),
    Trades { symbol: Symbol, trades: Vec<Trade> },
    OrderBook(OrderBookUpdate),
    Kline(Kline),
    FundingRate(FundingRate),
    IndexPrice(ReferencePrice),
    FairPrice(ReferencePrice),
    Balance(BalanceUpdate),
    Order(OrderUpdate),
    Position(PositionUpdate),
    AdlLevel(AdlLevelUpdate),
    PositionMode(PositionMode),
    RiskLimit(RiskLimitUpdate),
}

/// Everything the stream writes to its consumer
#[derive(Debug)]
pub enum StreamEvent {
    Data(DomainEvent),
    /// A frame nobody claimed, kept so unexpected wire shapes stay observable
    Unhandled { channel: String, payload: String },
    /// A per-frame failure; the stream keeps running
    Error(ExchangeError),
}

impl StreamEvent {
    pub fn data(&self) -> Option<&DomainEvent> {
        match self {
            Self::Data(event) => Some(event),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_symbol_rejects_empty_assets() {
        assert!(Symbol::new("", "USDT").is_err());
        assert!(Symbol::new("BTC", "").is_err());
        assert_eq!(Symbol::new("BTC", "USDT").unwrap().to_string(), "BTC/USDT");
    }

    #[test]
    fn test_price_serializes_as_exact_string() {
        let price = Price::new(dec!(93220.00));
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"93220.00\"");
        let back: Price = serde_json::from_str("\"93220.00\"").unwrap();
        assert_eq!(back.to_string(), "93220.00");
    }

    #[test]
    fn test_domain_event_serde_round_trip() {
        use chrono::TimeZone;

        let event = DomainEvent::Trades {
            symbol: Symbol::new("BTC", "USDT").unwrap(),
            trades: vec![Trade {
                price: Price::new(dec!(6866.50)),
                quantity: Quantity::new(dec!(2096)),
                side: OrderSide::Buy,
                position_effect: PositionEffect::Open,
                is_self_trade: false,
                timestamp: Utc.timestamp_millis_opt(1_587_442_049_632).unwrap(),
            }],
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"6866.50\""));
        let back: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_all_intervals_listed_once() {
        let mut seen = std::collections::HashSet::new();
        for interval in KlineInterval::ALL {
            assert!(seen.insert(interval));
        }
        assert_eq!(seen.len(), 16);
    }
}
