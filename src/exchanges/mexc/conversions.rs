//! Venue code tables
//!
//! Each function is total over the documented codes and rejects everything else
//! with [`ExchangeError::UnsupportedCode`]. Nothing falls back to a default state.

use crate::core::errors::ExchangeError;
use crate::core::types::{
    KlineInterval, MarginType, OrderSide, OrderStatus, OrderType, PositionEffect, PositionMode,
    PositionSide, PositionState, TimeInForce,
};

/// Taker side of a public fill (`T`)
pub fn trade_side_from_code(code: i64) -> Result<OrderSide, ExchangeError> {
    match code {
        1 => Ok(OrderSide::Buy),
        2 => Ok(OrderSide::Sell),
        other => Err(ExchangeError::unsupported_code("trade side", other)),
    }
}

/// Position effect of a public fill (`O`)
pub fn trade_effect_from_code(code: i64) -> Result<PositionEffect, ExchangeError> {
    match code {
        1 => Ok(PositionEffect::Open),
        2 => Ok(PositionEffect::Close),
        3 => Ok(PositionEffect::Unchanged),
        other => Err(ExchangeError::unsupported_code("trade effect", other)),
    }
}

/// Self-trade flag of a public fill (`M`)
pub fn self_trade_from_code(code: i64) -> Result<bool, ExchangeError> {
    match code {
        1 => Ok(true),
        2 => Ok(false),
        other => Err(ExchangeError::unsupported_code("self trade flag", other)),
    }
}

/// Side of a private order; codes 3 and 4 carry closing intent on the same two sides
pub fn order_side_from_code(code: i64) -> Result<(PositionSide, PositionEffect), ExchangeError> {
    match code {
        1 => Ok((PositionSide::Long, PositionEffect::Open)),
        2 => Ok((PositionSide::Short, PositionEffect::Open)),
        3 => Ok((PositionSide::Short, PositionEffect::Close)),
        4 => Ok((PositionSide::Long, PositionEffect::Close)),
        other => Err(ExchangeError::unsupported_code("order side", other)),
    }
}

/// Direction of a held position or risk tier
pub fn position_side_from_code(code: i64) -> Result<PositionSide, ExchangeError> {
    match code {
        1 => Ok(PositionSide::Long),
        2 => Ok(PositionSide::Short),
        other => Err(ExchangeError::unsupported_code("position type", other)),
    }
}

pub fn order_type_from_code(code: i64) -> Result<OrderType, ExchangeError> {
    match code {
        1..=4 => Ok(OrderType::Limit),
        5 | 6 => Ok(OrderType::Market),
        other => Err(ExchangeError::unsupported_code("order type", other)),
    }
}

/// Execution constraint implied by the order type code
pub fn time_in_force_from_code(code: i64) -> Result<TimeInForce, ExchangeError> {
    match code {
        1 | 6 => Ok(TimeInForce::GTC),
        2 => Ok(TimeInForce::PostOnly),
        3 | 5 => Ok(TimeInForce::IOC),
        4 => Ok(TimeInForce::FOK),
        other => Err(ExchangeError::unsupported_code("time in force", other)),
    }
}

pub fn order_status_from_code(code: i64) -> Result<OrderStatus, ExchangeError> {
    match code {
        1 => Ok(OrderStatus::Pending),
        2 => Ok(OrderStatus::Open),
        3 => Ok(OrderStatus::Filled),
        4 => Ok(OrderStatus::Cancelled),
        5 => Ok(OrderStatus::Rejected),
        other => Err(ExchangeError::unsupported_code("order status", other)),
    }
}

/// `openType`
pub fn margin_type_from_code(code: i64) -> Result<MarginType, ExchangeError> {
    match code {
        1 => Ok(MarginType::Isolated),
        2 => Ok(MarginType::Cross),
        other => Err(ExchangeError::unsupported_code("open type", other)),
    }
}

pub fn position_state_from_code(code: i64) -> Result<PositionState, ExchangeError> {
    match code {
        1 => Ok(PositionState::Holding),
        2 => Ok(PositionState::SystemHolding),
        3 => Ok(PositionState::Closed),
        other => Err(ExchangeError::unsupported_code("position state", other)),
    }
}

pub fn position_mode_from_code(code: i64) -> Result<PositionMode, ExchangeError> {
    match code {
        1 => Ok(PositionMode::Hedge),
        2 => Ok(PositionMode::OneWay),
        other => Err(ExchangeError::unsupported_code("position mode", other)),
    }
}

/// Wire spelling of a candle width
pub fn interval_to_wire(interval: KlineInterval) -> Result<&'static str, ExchangeError> {
    match interval {
        KlineInterval::Minutes1 => Ok("Min1"),
        KlineInterval::Minutes5 => Ok("Min5"),
        KlineInterval::Minutes15 => Ok("Min15"),
        KlineInterval::Minutes30 => Ok("Min30"),
        KlineInterval::Hours1 => Ok("Min60"),
        KlineInterval::Hours4 => Ok("Hour4"),
        KlineInterval::Hours8 => Ok("Hour8"),
        KlineInterval::Days1 => Ok("Day1"),
        KlineInterval::Weeks1 => Ok("Week1"),
        KlineInterval::Months1 => Ok("Month1"),
        other => Err(ExchangeError::UnsupportedInterval(other.to_string())),
    }
}

pub fn interval_from_wire(interval: &str) -> Result<KlineInterval, ExchangeError> {
    match interval {
        "Min1" => Ok(KlineInterval::Minutes1),
        "Min5" => Ok(KlineInterval::Minutes5),
        "Min15" => Ok(KlineInterval::Minutes15),
        "Min30" => Ok(KlineInterval::Minutes30),
        "Min60" => Ok(KlineInterval::Hours1),
        "Hour4" => Ok(KlineInterval::Hours4),
        "Hour8" => Ok(KlineInterval::Hours8),
        "Day1" => Ok(KlineInterval::Days1),
        "Week1" => Ok(KlineInterval::Weeks1),
        "Month1" => Ok(KlineInterval::Months1),
        other => Err(ExchangeError::UnsupportedInterval(other.to_string())),
    }
}
