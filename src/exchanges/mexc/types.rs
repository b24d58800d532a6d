use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One inbound frame as it arrives: routing envelope plus an undecoded payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InboundFrame {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub ts: Option<i64>,
}

/// Outbound request: `{"method": "<prefix>.<family>", "param": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MexcWsRequest {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<MexcRequestParam>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcRequestParam {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// `push.ticker` payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcTicker {
    pub symbol: String,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub last_price: Decimal,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub bid1: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub ask1: Option<Decimal>,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub volume24: Decimal,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub hold_vol: Option<Decimal>,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub lower24_price: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub high24_price: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub rise_fall_rate: Decimal,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub rise_fall_value: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub index_price: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub fair_price: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub funding_rate: Option<Decimal>,
    pub timestamp: i64,
}

/// One entry of the `push.tickers` array; the time is on the envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcTickersItem {
    pub symbol: String,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub last_price: Decimal,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub fair_price: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub volume24: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub lower24_price: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub high24_price: Option<Decimal>,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub rise_fall_rate: Decimal,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// `push.deal` fill
#[derive(Debug, Clone, Deserialize)]
pub struct MexcDeal {
    #[serde(rename = "p", deserialize_with = "decimal::deserialize")]
    pub price: Decimal,
    #[serde(rename = "v", deserialize_with = "decimal::deserialize")]
    pub volume: Decimal,
    #[serde(rename = "T")]
    pub side: i64,
    #[serde(rename = "O")]
    pub open_flag: i64,
    #[serde(rename = "M")]
    pub self_trade: i64,
    #[serde(rename = "t")]
    pub timestamp: i64,
}

/// `push.depth` / `push.depth.full` payload; levels are `[price, volume, order_count]`
#[derive(Debug, Clone, Deserialize)]
pub struct MexcDepth {
    #[serde(default)]
    pub asks: Vec<Vec<Value>>,
    #[serde(default)]
    pub bids: Vec<Vec<Value>>,
    pub version: u64,
}

/// `push.kline` bar; `t` is in seconds
#[derive(Debug, Clone, Deserialize)]
pub struct MexcKline {
    pub symbol: String,
    pub interval: String,
    #[serde(rename = "t")]
    pub open_time: i64,
    #[serde(rename = "o", deserialize_with = "decimal::deserialize")]
    pub open: Decimal,
    #[serde(rename = "h", deserialize_with = "decimal::deserialize")]
    pub high: Decimal,
    #[serde(rename = "l", deserialize_with = "decimal::deserialize")]
    pub low: Decimal,
    #[serde(rename = "c", deserialize_with = "decimal::deserialize")]
    pub close: Decimal,
    #[serde(rename = "q", deserialize_with = "decimal::deserialize")]
    pub volume: Decimal,
    #[serde(rename = "a", deserialize_with = "decimal::deserialize")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcFundingRate {
    pub symbol: String,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub rate: Decimal,
    #[serde(default)]
    pub next_settle_time: Option<i64>,
}

/// `push.index.price` and `push.fair.price`
#[derive(Debug, Clone, Deserialize)]
pub struct MexcReferencePrice {
    pub symbol: String,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcAsset {
    pub currency: String,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub position_margin: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub frozen_balance: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub available_balance: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub cash_balance: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcOrder {
    #[serde(deserialize_with = "string_or_number")]
    pub order_id: String,
    pub symbol: String,
    #[serde(default)]
    pub position_id: Option<u64>,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub price: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub vol: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub leverage: Decimal,
    pub side: i64,
    pub order_type: i64,
    pub open_type: i64,
    pub state: i64,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub deal_avg_price: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub deal_vol: Decimal,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub taker_fee: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub maker_fee: Option<Decimal>,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub profit: Option<Decimal>,
    #[serde(default)]
    pub fee_currency: Option<String>,
    #[serde(default)]
    pub external_oid: Option<String>,
    pub create_time: i64,
    pub update_time: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcPosition {
    pub position_id: u64,
    pub symbol: String,
    pub position_type: i64,
    pub open_type: i64,
    pub state: i64,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub hold_vol: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub frozen_vol: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub hold_avg_price: Decimal,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub liquidate_price: Option<Decimal>,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub im: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub realised: Decimal,
    #[serde(default)]
    pub adl_level: Option<u8>,
    #[serde(default, deserialize_with = "decimal::deserialize_opt")]
    pub leverage: Option<Decimal>,
    pub update_time: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcAdlLevel {
    pub adl_level: u8,
    pub position_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcPositionMode {
    pub position_mode: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcRiskLimit {
    pub symbol: String,
    pub position_type: i64,
    pub level: u32,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub max_vol: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub max_leverage: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub mmr: Decimal,
    #[serde(deserialize_with = "decimal::deserialize")]
    pub imr: Decimal,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Lossless decimal decoding for fields sent either as strings or as JSON numbers
///
/// `serde_json` keeps the source text of numbers (`arbitrary_precision`), so
/// `93220.00` decodes with its scale intact and never passes through `f64`.
pub mod decimal {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn parse_text(text: &str) -> Result<Decimal, String> {
        let text = text.trim();
        Decimal::from_str_exact(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|e| format!("invalid decimal '{}': {}", text, e))
    }

    pub fn parse_value(value: &Value) -> Result<Decimal, String> {
        match value {
            Value::String(s) => parse_text(s),
            Value::Number(n) => parse_text(&n.to_string()),
            other => Err(format!("expected decimal, got {}", other)),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let value = Value::deserialize(deserializer)?;
        parse_value(&value).map_err(serde::de::Error::custom)
    }

    /// Null and empty strings decode to `None`
    pub fn deserialize_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            value => parse_value(&value)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
