use super::channels::ChannelFamily;
use super::codec::{ERROR_CHANNEL, LOGIN_CHANNEL, PONG_CHANNEL};
use super::converters::{
    convert_adl_level, convert_asset, convert_deals, convert_depth, convert_funding_rate,
    convert_kline, convert_order, convert_position, convert_position_mode,
    convert_reference_price, convert_risk_limit, convert_ticker, convert_tickers,
};
use super::types::InboundFrame;
use crate::core::errors::ExchangeError;
use crate::core::kernel::PendingRequests;
use crate::core::traits::PairFormatter;
use crate::core::types::{DomainEvent, OrderBookUpdateKind, StreamEvent};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Classifies inbound frames and turns pushes into domain events
///
/// The read loop is the only caller of [`ChannelRouter::route`]; the sink is never read here.
pub struct ChannelRouter {
    pairs: Arc<dyn PairFormatter>,
    pending: Arc<PendingRequests<InboundFrame>>,
    sink: mpsc::UnboundedSender<StreamEvent>,
}

impl ChannelRouter {
    pub fn new(
        pairs: Arc<dyn PairFormatter>,
        pending: Arc<PendingRequests<InboundFrame>>,
        sink: mpsc::UnboundedSender<StreamEvent>,
    ) -> Self {
        Self {
            pairs,
            pending,
            sink,
        }
    }

    /// Route one frame
    ///
    /// Errors are local to this frame; the caller surfaces them and keeps reading.
    pub fn route(&self, frame: InboundFrame) -> Result<(), ExchangeError> {
        if frame.channel.is_empty() {
            if let Some(msg) = frame.msg.as_deref() {
                info!(message = %msg, code = ?frame.code, "venue notice");
            } else {
                self.unhandled(frame);
            }
            return Ok(());
        }

        match frame.channel.as_str() {
            LOGIN_CHANNEL => {
                if let Err(frame) = self.pending.resolve(LOGIN_CHANNEL, frame) {
                    warn!("login reply arrived with nobody waiting");
                    self.unhandled(frame);
                }
                Ok(())
            }
            ERROR_CHANNEL => self.venue_error(frame),
            PONG_CHANNEL => {
                trace!("pong");
                Ok(())
            }
            channel if channel.starts_with("rs.sub.") || channel.starts_with("rs.unsub.") => {
                Self::acknowledge(&frame)
            }
            channel => match ChannelFamily::from_channel(channel) {
                Some(family) => {
                    let event = self.decode(family, &frame)?;
                    self.emit(StreamEvent::Data(event));
                    Ok(())
                }
                None => {
                    warn!(channel = %channel, "no handler for channel");
                    Ok(())
                }
            },
        }
    }

    pub fn emit(&self, event: StreamEvent) {
        if self.sink.send(event).is_err() {
            trace!("event dropped, consumer is gone");
        }
    }

    pub fn is_consumer_closed(&self) -> bool {
        self.sink.is_closed()
    }

    fn decode(
        &self,
        family: ChannelFamily,
        frame: &InboundFrame,
    ) -> Result<DomainEvent, ExchangeError> {
        let pairs = self.pairs.as_ref();
        let data = &frame.data;

        let event = match family {
            ChannelFamily::Tickers => {
                DomainEvent::Tickers(convert_tickers(data, frame.ts, pairs)?)
            }
            ChannelFamily::Ticker => DomainEvent::Ticker(convert_ticker(data, pairs)?),
            ChannelFamily::Deal => DomainEvent::Trades {
                symbol: pairs.to_pair(Self::envelope_symbol(frame)?)?,
                trades: convert_deals(data)?,
            },
            ChannelFamily::Depth => DomainEvent::OrderBook(convert_depth(
                data,
                Self::envelope_symbol(frame)?,
                OrderBookUpdateKind::Delta,
                pairs,
            )?),
            ChannelFamily::DepthFull => DomainEvent::OrderBook(convert_depth(
                data,
                Self::envelope_symbol(frame)?,
                OrderBookUpdateKind::Snapshot,
                pairs,
            )?),
            ChannelFamily::Kline => DomainEvent::Kline(convert_kline(data, pairs)?),
            ChannelFamily::FundingRate => {
                DomainEvent::FundingRate(convert_funding_rate(data, pairs)?)
            }
            ChannelFamily::IndexPrice => {
                DomainEvent::IndexPrice(convert_reference_price(data, pairs)?)
            }
            ChannelFamily::FairPrice => {
                DomainEvent::FairPrice(convert_reference_price(data, pairs)?)
            }
            ChannelFamily::PersonalOrder => DomainEvent::Order(convert_order(data, pairs)?),
            ChannelFamily::PersonalAsset => DomainEvent::Balance(convert_asset(data)?),
            ChannelFamily::PersonalPosition => {
                DomainEvent::Position(convert_position(data, pairs)?)
            }
            ChannelFamily::PersonalAdlLevel => DomainEvent::AdlLevel(convert_adl_level(data)?),
            ChannelFamily::PersonalPositionMode => {
                DomainEvent::PositionMode(convert_position_mode(data)?)
            }
            ChannelFamily::PersonalRiskLimit => {
                DomainEvent::RiskLimit(convert_risk_limit(data, pairs)?)
            }
        };

        Ok(event)
    }

    fn envelope_symbol(frame: &InboundFrame) -> Result<&str, ExchangeError> {
        frame.symbol.as_deref().ok_or_else(|| {
            ExchangeError::decode(format!("{} frame carries no symbol", frame.channel))
        })
    }

    /// A pending login takes the failure as its reply; otherwise it is surfaced as an error
    fn venue_error(&self, frame: InboundFrame) -> Result<(), ExchangeError> {
        if self.pending.is_pending(LOGIN_CHANNEL) {
            if let Err(frame) = self.pending.resolve(LOGIN_CHANNEL, frame) {
                return Err(venue_error_from(&frame));
            }
            return Ok(());
        }
        Err(venue_error_from(&frame))
    }

    fn acknowledge(frame: &InboundFrame) -> Result<(), ExchangeError> {
        if frame.data.as_str() == Some("success") {
            debug!(channel = %frame.channel, "request acknowledged");
            return Ok(());
        }

        Err(ExchangeError::SubscriptionError {
            channel: frame.channel.clone(),
            reason: payload_text(&frame.data),
        })
    }

    fn unhandled(&self, frame: InboundFrame) {
        self.emit(StreamEvent::Unhandled {
            channel: frame.channel,
            payload: payload_text(&frame.data),
        });
    }
}

pub(crate) fn venue_error_from(frame: &InboundFrame) -> ExchangeError {
    ExchangeError::VenueError {
        code: frame.code,
        message: frame
            .msg
            .clone()
            .unwrap_or_else(|| payload_text(&frame.data)),
    }
}

/// Payload as text, without quoting plain strings
pub(crate) fn payload_text(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::DelimitedPairs;
    use crate::core::kernel::WsCodec;
    use crate::exchanges::mexc::codec::MexcCodec;

    type Harness = (
        ChannelRouter,
        Arc<PendingRequests<InboundFrame>>,
        mpsc::UnboundedReceiver<StreamEvent>,
    );

    fn router() -> Harness {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(PendingRequests::new());
        let router = ChannelRouter::new(Arc::new(DelimitedPairs::default()), pending.clone(), tx);
        (router, pending, rx)
    }

    fn route(router: &ChannelRouter, raw: &str) -> Result<(), ExchangeError> {
        router.route(MexcCodec.decode_frame(raw.as_bytes()).unwrap())
    }

    fn sample_frames() -> Vec<(ChannelFamily, String)> {
        vec![
            (ChannelFamily::Tickers, r#"{"channel":"push.tickers","data":[{"fairPrice":183.01,"lastPrice":183,"riseFallRate":-0.0708,"symbol":"BSV_USDT","volume24":200}],"ts":1587442022003}"#.to_string()),
            (ChannelFamily::Ticker, r#"{"channel":"push.ticker","data":{"symbol":"BTC_USDT","lastPrice":1,"bid1":1,"ask1":1,"volume24":1,"holdVol":1,"lower24Price":1,"high24Price":1,"riseFallRate":0,"riseFallValue":0,"timestamp":1},"symbol":"BTC_USDT"}"#.to_string()),
            (ChannelFamily::Deal, r#"{"channel":"push.deal","data":{"p":1,"v":1,"T":1,"O":1,"M":2,"t":1},"symbol":"BTC_USDT"}"#.to_string()),
            (ChannelFamily::Depth, r#"{"channel":"push.depth","data":{"asks":[],"bids":[[1,1,1]],"version":2},"symbol":"BTC_USDT"}"#.to_string()),
            (ChannelFamily::DepthFull, r#"{"channel":"push.depth.full","data":{"asks":[[2,1,1]],"bids":[[1,1,1]],"version":3},"symbol":"BTC_USDT"}"#.to_string()),
            (ChannelFamily::Kline, r#"{"channel":"push.kline","data":{"symbol":"BTC_USDT","interval":"Min1","t":1,"o":1,"c":1,"h":1,"l":1,"a":1,"q":1},"symbol":"BTC_USDT"}"#.to_string()),
            (ChannelFamily::FundingRate, r#"{"channel":"push.funding.rate","data":{"symbol":"BTC_USDT","rate":0.001,"nextSettleTime":1},"symbol":"BTC_USDT"}"#.to_string()),
            (ChannelFamily::IndexPrice, r#"{"channel":"push.index.price","data":{"symbol":"BTC_USDT","price":1},"symbol":"BTC_USDT"}"#.to_string()),
            (ChannelFamily::FairPrice, r#"{"channel":"push.fair.price","data":{"symbol":"BTC_USDT","price":1},"symbol":"BTC_USDT"}"#.to_string()),
            (ChannelFamily::PersonalOrder, r#"{"channel":"push.personal.order","data":{"orderId":"1","symbol":"BTC_USDT","positionId":1,"price":1,"vol":1,"leverage":10,"side":1,"orderType":1,"openType":1,"state":2,"dealAvgPrice":0,"dealVol":0,"createTime":1,"updateTime":1}}"#.to_string()),
            (ChannelFamily::PersonalAsset, r#"{"channel":"push.personal.asset","data":{"currency":"USDT","positionMargin":0,"frozenBalance":0,"availableBalance":1,"cashBalance":1}}"#.to_string()),
            (ChannelFamily::PersonalPosition, r#"{"channel":"push.personal.position","data":{"positionId":1,"symbol":"BTC_USDT","holdVol":1,"positionType":1,"openType":1,"state":1,"frozenVol":0,"holdAvgPrice":1,"im":1,"realised":0,"updateTime":1}}"#.to_string()),
            (ChannelFamily::PersonalAdlLevel, r#"{"channel":"push.personal.adl.level","data":{"adlLevel":1,"positionId":1}}"#.to_string()),
            (ChannelFamily::PersonalPositionMode, r#"{"channel":"push.personal.position.mode","data":{"positionMode":1}}"#.to_string()),
            (ChannelFamily::PersonalRiskLimit, r#"{"channel":"push.personal.risk.limit","data":{"symbol":"BTC_USDT","positionType":1,"level":1,"maxVol":1,"maxLeverage":1,"mmr":0.01,"imr":0.02}}"#.to_string()),
        ]
    }

    fn matches_family(family: ChannelFamily, event: &DomainEvent) -> bool {
        match (family, event) {
            (ChannelFamily::Tickers, DomainEvent::Tickers(_))
            | (ChannelFamily::Ticker, DomainEvent::Ticker(_))
            | (ChannelFamily::Deal, DomainEvent::Trades { .. })
            | (ChannelFamily::Kline, DomainEvent::Kline(_))
            | (ChannelFamily::FundingRate, DomainEvent::FundingRate(_))
            | (ChannelFamily::IndexPrice, DomainEvent::IndexPrice(_))
            | (ChannelFamily::FairPrice, DomainEvent::FairPrice(_))
            | (ChannelFamily::PersonalOrder, DomainEvent::Order(_))
            | (ChannelFamily::PersonalAsset, DomainEvent::Balance(_))
            | (ChannelFamily::PersonalPosition, DomainEvent::Position(_))
            | (ChannelFamily::PersonalAdlLevel, DomainEvent::AdlLevel(_))
            | (ChannelFamily::PersonalPositionMode, DomainEvent::PositionMode(_))
            | (ChannelFamily::PersonalRiskLimit, DomainEvent::RiskLimit(_)) => true,
            (ChannelFamily::Depth, DomainEvent::OrderBook(book)) => {
                book.kind == OrderBookUpdateKind::Delta
            }
            (ChannelFamily::DepthFull, DomainEvent::OrderBook(book)) => {
                book.kind == OrderBookUpdateKind::Snapshot
            }
            _ => false,
        }
    }

    #[test]
    fn test_every_family_yields_exactly_one_event() {
        let frames = sample_frames();
        assert_eq!(frames.len(), ChannelFamily::ALL.len());

        for (family, raw) in frames {
            let (router, _, mut rx) = router();
            route(&router, &raw).unwrap_or_else(|e| panic!("{} failed: {}", family, e));

            let event = rx.try_recv().unwrap();
            let data = event.data().unwrap_or_else(|| panic!("{} gave {:?}", family, event));
            assert!(matches_family(family, data), "{} gave {:?}", family, data);
            assert!(rx.try_recv().is_err(), "{} emitted more than one event", family);
        }
    }

    #[test]
    fn test_unknown_family_is_silent() {
        let (router, _, mut rx) = router();
        route(&router, r#"{"channel":"push.brand.new.feed","data":{"x":1}}"#).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_notice_and_pong_are_not_dispatched() {
        let (router, _, mut rx) = router();
        route(&router, r#"{"msg":"maintenance at 02:00"}"#).unwrap();
        route(&router, r#"{"channel":"pong","data":1587453241453}"#).unwrap();
        route(&router, r#"{"channel":"rs.sub.deal","data":"success"}"#).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_rejected_subscription_ack() {
        let (router, _, _rx) = router();
        let result = route(&router, r#"{"channel":"rs.sub.kline","data":"invalid interval"}"#);
        assert!(matches!(
            result,
            Err(ExchangeError::SubscriptionError { ref reason, .. }) if reason == "invalid interval"
        ));
    }

    #[tokio::test]
    async fn test_login_reply_reaches_waiter() {
        let (router, pending, mut rx) = router();
        let waiter = pending.register(LOGIN_CHANNEL);

        route(&router, r#"{"channel":"rs.login","data":"success"}"#).unwrap();

        let reply = waiter.await.unwrap();
        assert_eq!(reply.data, Value::String("success".to_string()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unclaimed_login_reply_is_surfaced() {
        let (router, _, mut rx) = router();
        route(&router, r#"{"channel":"rs.login","data":"success"}"#).unwrap();

        match rx.try_recv().unwrap() {
            StreamEvent::Unhandled { channel, payload } => {
                assert_eq!(channel, "rs.login");
                assert_eq!(payload, "success");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_channel_fails_pending_login() {
        let (router, pending, _rx) = router();
        let waiter = pending.register(LOGIN_CHANNEL);

        route(&router, r#"{"channel":"rs.error","data":"signature verification failed"}"#)
            .unwrap();
        assert_eq!(waiter.await.unwrap().channel, ERROR_CHANNEL);

        let result = route(&router, r#"{"channel":"rs.error","data":"later failure"}"#);
        assert!(matches!(result, Err(ExchangeError::VenueError { .. })));
    }

    #[test]
    fn test_bad_payload_is_error_without_event() {
        let (router, _, mut rx) = router();
        let result = route(&router, r#"{"channel":"push.deal","data":{"p":"x"},"symbol":"BTC_USDT"}"#);
        assert!(matches!(result, Err(ExchangeError::DecodeError(_))));

        let result = route(&router, r#"{"channel":"push.depth","data":{"asks":[],"bids":[],"version":1}}"#);
        assert!(matches!(result, Err(ExchangeError::DecodeError(_))));
        assert!(rx.try_recv().is_err());
    }
}
