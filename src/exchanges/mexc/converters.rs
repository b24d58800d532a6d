use super::conversions::{
    interval_from_wire, margin_type_from_code, order_side_from_code, order_status_from_code,
    order_type_from_code, position_mode_from_code, position_side_from_code,
    position_state_from_code, self_trade_from_code, time_in_force_from_code,
    trade_effect_from_code, trade_side_from_code,
};
use super::types::{
    decimal, MexcAdlLevel, MexcAsset, MexcDeal, MexcDepth, MexcFundingRate, MexcKline, MexcOrder,
    MexcPosition, MexcPositionMode, MexcReferencePrice, MexcRiskLimit, MexcTicker,
    MexcTickersItem,
};
use crate::core::errors::ExchangeError;
use crate::core::traits::PairFormatter;
use crate::core::types::{
    AdlLevelUpdate, BalanceUpdate, FundingRate, Kline, OrderBookEntry, OrderBookUpdate,
    OrderBookUpdateKind, OrderUpdate, PositionMode, PositionUpdate, Price, Quantity,
    ReferencePrice, RiskLimitUpdate, Ticker, Trade,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

fn from_payload<T: DeserializeOwned>(kind: &str, raw: &Value) -> Result<T, ExchangeError> {
    T::deserialize(raw).map_err(|e| ExchangeError::decode(format!("{} payload: {}", kind, e)))
}

pub(crate) fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>, ExchangeError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| ExchangeError::decode(format!("timestamp {} ms out of range", ms)))
}

fn seconds_to_datetime(secs: i64) -> Result<DateTime<Utc>, ExchangeError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| ExchangeError::decode(format!("timestamp {} s out of range", secs)))
}

pub fn convert_ticker(raw: &Value, pairs: &dyn PairFormatter) -> Result<Ticker, ExchangeError> {
    ticker_from_wire(from_payload("ticker", raw)?, pairs)
}

/// Aggregate feed: every contract in one array, in wire order
///
/// Items carry no time of their own; `envelope_ts` is the frame's `ts` in milliseconds.
pub fn convert_tickers(
    raw: &Value,
    envelope_ts: Option<i64>,
    pairs: &dyn PairFormatter,
) -> Result<Vec<Ticker>, ExchangeError> {
    let items: Vec<MexcTickersItem> = from_payload("tickers", raw)?;
    items
        .into_iter()
        .map(|item| {
            let ms = item
                .timestamp
                .or(envelope_ts)
                .ok_or_else(|| ExchangeError::decode("tickers frame carries no timestamp"))?;
            Ok(Ticker {
                symbol: pairs.to_pair(&item.symbol)?,
                last_price: Price::new(item.last_price),
                bid_price: None,
                ask_price: None,
                high_24h: item.high24_price.map(Price::new),
                low_24h: item.lower24_price.map(Price::new),
                volume_24h: item.volume24.map(Quantity::new),
                open_interest: None,
                price_change_24h: None,
                price_change_ratio_24h: item.rise_fall_rate,
                index_price: None,
                fair_price: item.fair_price.map(Price::new),
                funding_rate: None,
                timestamp: millis_to_datetime(ms)?,
            })
        })
        .collect()
}

fn ticker_from_wire(
    ticker: MexcTicker,
    pairs: &dyn PairFormatter,
) -> Result<Ticker, ExchangeError> {
    Ok(Ticker {
        symbol: pairs.to_pair(&ticker.symbol)?,
        last_price: Price::new(ticker.last_price),
        bid_price: ticker.bid1.map(Price::new),
        ask_price: ticker.ask1.map(Price::new),
        high_24h: Some(Price::new(ticker.high24_price)),
        low_24h: Some(Price::new(ticker.lower24_price)),
        volume_24h: Some(Quantity::new(ticker.volume24)),
        open_interest: ticker.hold_vol.map(Quantity::new),
        price_change_24h: ticker.rise_fall_value,
        price_change_ratio_24h: ticker.rise_fall_rate,
        index_price: ticker.index_price.map(Price::new),
        fair_price: ticker.fair_price.map(Price::new),
        funding_rate: ticker.funding_rate,
        timestamp: millis_to_datetime(ticker.timestamp)?,
    })
}

/// Fills arrive either as one object or as an array; wire order is kept
pub fn convert_deals(raw: &Value) -> Result<Vec<Trade>, ExchangeError> {
    let deals: Vec<MexcDeal> = match raw {
        Value::Array(_) => from_payload("deal", raw)?,
        _ => vec![from_payload("deal", raw)?],
    };

    deals
        .into_iter()
        .map(|deal| {
            Ok(Trade {
                price: Price::new(deal.price),
                quantity: Quantity::new(deal.volume),
                side: trade_side_from_code(deal.side)?,
                position_effect: trade_effect_from_code(deal.open_flag)?,
                is_self_trade: self_trade_from_code(deal.self_trade)?,
                timestamp: millis_to_datetime(deal.timestamp)?,
            })
        })
        .collect()
}

pub fn convert_depth(
    raw: &Value,
    symbol: &str,
    kind: OrderBookUpdateKind,
    pairs: &dyn PairFormatter,
) -> Result<OrderBookUpdate, ExchangeError> {
    let depth: MexcDepth = from_payload("depth", raw)?;

    Ok(OrderBookUpdate {
        symbol: pairs.to_pair(symbol)?,
        kind,
        bids: convert_levels(&depth.bids)?,
        asks: convert_levels(&depth.asks)?,
        version: depth.version,
    })
}

fn convert_levels(levels: &[Vec<Value>]) -> Result<Vec<OrderBookEntry>, ExchangeError> {
    levels
        .iter()
        .map(|level| match level.as_slice() {
            [price, quantity, rest @ ..] => {
                let order_count = match rest.first() {
                    Some(count) => Some(
                        count
                            .as_u64()
                            .and_then(|c| u32::try_from(c).ok())
                            .ok_or_else(|| {
                                ExchangeError::decode(format!("invalid order count {}", count))
                            })?,
                    ),
                    None => None,
                };
                Ok(OrderBookEntry {
                    price: Price::new(decimal::parse_value(price).map_err(ExchangeError::decode)?),
                    quantity: Quantity::new(
                        decimal::parse_value(quantity).map_err(ExchangeError::decode)?,
                    ),
                    order_count,
                })
            }
            _ => Err(ExchangeError::decode(format!(
                "depth level needs price and quantity, got {:?}",
                level
            ))),
        })
        .collect()
}

pub fn convert_kline(raw: &Value, pairs: &dyn PairFormatter) -> Result<Kline, ExchangeError> {
    let kline: MexcKline = from_payload("kline", raw)?;

    Ok(Kline {
        symbol: pairs.to_pair(&kline.symbol)?,
        interval: interval_from_wire(&kline.interval)?,
        open_time: seconds_to_datetime(kline.open_time)?,
        open_price: Price::new(kline.open),
        high_price: Price::new(kline.high),
        low_price: Price::new(kline.low),
        close_price: Price::new(kline.close),
        volume: Quantity::new(kline.volume),
        quote_volume: kline.amount,
    })
}

pub fn convert_funding_rate(
    raw: &Value,
    pairs: &dyn PairFormatter,
) -> Result<FundingRate, ExchangeError> {
    let funding: MexcFundingRate = from_payload("funding rate", raw)?;

    Ok(FundingRate {
        symbol: pairs.to_pair(&funding.symbol)?,
        funding_rate: funding.rate,
        next_funding_time: funding
            .next_settle_time
            .map(millis_to_datetime)
            .transpose()?,
    })
}

/// Index and fair price pushes share one shape
pub fn convert_reference_price(
    raw: &Value,
    pairs: &dyn PairFormatter,
) -> Result<ReferencePrice, ExchangeError> {
    let reference: MexcReferencePrice = from_payload("reference price", raw)?;

    Ok(ReferencePrice {
        symbol: pairs.to_pair(&reference.symbol)?,
        price: Price::new(reference.price),
    })
}

pub fn convert_asset(raw: &Value) -> Result<BalanceUpdate, ExchangeError> {
    let asset: MexcAsset = from_payload("asset", raw)?;

    Ok(BalanceUpdate {
        asset: asset.currency,
        available: Quantity::new(asset.available_balance),
        frozen: Quantity::new(asset.frozen_balance),
        position_margin: Quantity::new(asset.position_margin),
        cash_balance: Quantity::new(asset.cash_balance),
    })
}

pub fn convert_order(raw: &Value, pairs: &dyn PairFormatter) -> Result<OrderUpdate, ExchangeError> {
    let order: MexcOrder = from_payload("order", raw)?;
    let (side, position_effect) = order_side_from_code(order.side)?;

    Ok(OrderUpdate {
        order_id: order.order_id,
        client_order_id: order.external_oid.filter(|oid| !oid.is_empty()),
        symbol: pairs.to_pair(&order.symbol)?,
        position_id: order.position_id.filter(|id| *id != 0),
        side,
        position_effect,
        order_type: order_type_from_code(order.order_type)?,
        time_in_force: time_in_force_from_code(order.order_type)?,
        margin_type: margin_type_from_code(order.open_type)?,
        status: order_status_from_code(order.state)?,
        price: Price::new(order.price),
        quantity: Quantity::new(order.vol),
        filled_quantity: Quantity::new(order.deal_vol),
        average_fill_price: Price::new(order.deal_avg_price),
        leverage: order.leverage,
        taker_fee: order.taker_fee.unwrap_or_default(),
        maker_fee: order.maker_fee.unwrap_or_default(),
        realized_pnl: order.profit.unwrap_or_default(),
        fee_asset: order.fee_currency,
        created_at: millis_to_datetime(order.create_time)?,
        updated_at: millis_to_datetime(order.update_time)?,
    })
}

pub fn convert_position(
    raw: &Value,
    pairs: &dyn PairFormatter,
) -> Result<PositionUpdate, ExchangeError> {
    let position: MexcPosition = from_payload("position", raw)?;

    Ok(PositionUpdate {
        position_id: position.position_id,
        symbol: pairs.to_pair(&position.symbol)?,
        side: position_side_from_code(position.position_type)?,
        margin_type: margin_type_from_code(position.open_type)?,
        state: position_state_from_code(position.state)?,
        quantity: Quantity::new(position.hold_vol),
        frozen_quantity: Quantity::new(position.frozen_vol),
        entry_price: Price::new(position.hold_avg_price),
        liquidation_price: position
            .liquidate_price
            .filter(|price| !price.is_zero())
            .map(Price::new),
        margin: position.im,
        realized_pnl: position.realised,
        adl_level: position.adl_level,
        leverage: position.leverage,
        updated_at: millis_to_datetime(position.update_time)?,
    })
}

pub fn convert_adl_level(raw: &Value) -> Result<AdlLevelUpdate, ExchangeError> {
    let adl: MexcAdlLevel = from_payload("adl level", raw)?;

    Ok(AdlLevelUpdate {
        position_id: adl.position_id,
        adl_level: adl.adl_level,
    })
}

pub fn convert_position_mode(raw: &Value) -> Result<PositionMode, ExchangeError> {
    let mode: MexcPositionMode = from_payload("position mode", raw)?;
    position_mode_from_code(mode.position_mode)
}

pub fn convert_risk_limit(
    raw: &Value,
    pairs: &dyn PairFormatter,
) -> Result<RiskLimitUpdate, ExchangeError> {
    let limit: MexcRiskLimit = from_payload("risk limit", raw)?;

    Ok(RiskLimitUpdate {
        symbol: pairs.to_pair(&limit.symbol)?,
        side: position_side_from_code(limit.position_type)?,
        level: limit.level,
        max_quantity: Quantity::new(limit.max_vol),
        max_leverage: limit.max_leverage,
        maintenance_margin_rate: limit.mmr,
        initial_margin_rate: limit.imr,
    })
}
