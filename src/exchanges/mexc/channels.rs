use super::conversions::interval_to_wire;
use super::types::{MexcRequestParam, MexcWsRequest};
use crate::core::errors::ExchangeError;
use crate::core::kernel::EndpointLimit;
use crate::core::types::KlineInterval;

/// Order-book levels requested from `depth.full` when none are given
pub const DEFAULT_FULL_DEPTH_LIMIT: u32 = 20;

/// Depth-limit hint sent with every `deal` request unless overridden
pub const DEFAULT_DEAL_LIMIT: u32 = 100;

/// Prefix-independent name of a data topic; the stable dispatch key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelFamily {
    /// Every contract's ticker in one push
    Tickers,
    Ticker,
    Deal,
    Depth,
    DepthFull,
    Kline,
    FundingRate,
    IndexPrice,
    FairPrice,
    PersonalOrder,
    PersonalAsset,
    PersonalPosition,
    PersonalAdlLevel,
    PersonalPositionMode,
    PersonalRiskLimit,
}

impl ChannelFamily {
    pub const ALL: [Self; 15] = [
        Self::Tickers,
        Self::Ticker,
        Self::Deal,
        Self::Depth,
        Self::DepthFull,
        Self::Kline,
        Self::FundingRate,
        Self::IndexPrice,
        Self::FairPrice,
        Self::PersonalOrder,
        Self::PersonalAsset,
        Self::PersonalPosition,
        Self::PersonalAdlLevel,
        Self::PersonalPositionMode,
        Self::PersonalRiskLimit,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tickers => "tickers",
            Self::Ticker => "ticker",
            Self::Deal => "deal",
            Self::Depth => "depth",
            Self::DepthFull => "depth.full",
            Self::Kline => "kline",
            Self::FundingRate => "funding.rate",
            Self::IndexPrice => "index.price",
            Self::FairPrice => "fair.price",
            Self::PersonalOrder => "personal.order",
            Self::PersonalAsset => "personal.asset",
            Self::PersonalPosition => "personal.position",
            Self::PersonalAdlLevel => "personal.adl.level",
            Self::PersonalPositionMode => "personal.position.mode",
            Self::PersonalRiskLimit => "personal.risk.limit",
        }
    }

    pub fn from_family(family: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == family)
    }

    /// Family of a full channel identifier such as `push.depth.full`
    pub fn from_channel(channel: &str) -> Option<Self> {
        let (_, family) = channel.split_once('.')?;
        Self::from_family(family)
    }

    pub const fn is_private(self) -> bool {
        matches!(
            self,
            Self::PersonalOrder
                | Self::PersonalAsset
                | Self::PersonalPosition
                | Self::PersonalAdlLevel
                | Self::PersonalPositionMode
                | Self::PersonalRiskLimit
        )
    }

    /// Whether requests name a symbol; account-wide and aggregate channels do not
    pub const fn is_per_symbol(self) -> bool {
        !self.is_private() && !matches!(self, Self::Tickers)
    }
}

impl std::fmt::Display for ChannelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    Subscribe,
    Unsubscribe,
}

impl SubscriptionAction {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Subscribe => "sub",
            Self::Unsubscribe => "unsub",
        }
    }

    pub const fn endpoint(self) -> EndpointLimit {
        match self {
            Self::Subscribe => EndpointLimit::WsSubscribe,
            Self::Unsubscribe => EndpointLimit::WsUnsubscribe,
        }
    }
}

/// One desired feed; consumed to build its wire requests and not retained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub family: ChannelFamily,
    /// Venue spelling, e.g. `BTC_USDT`
    pub symbols: Vec<String>,
    pub interval: Option<KlineInterval>,
    pub limit: Option<u32>,
    pub compress: Option<bool>,
}

impl Subscription {
    pub fn new(family: ChannelFamily) -> Self {
        Self {
            family,
            symbols: Vec::new(),
            interval: None,
            limit: None,
            compress: None,
        }
    }

    pub fn tickers() -> Self {
        Self::new(ChannelFamily::Tickers)
    }

    pub fn ticker<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self::new(ChannelFamily::Ticker).with_symbols(symbols)
    }

    pub fn deals<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self::new(ChannelFamily::Deal)
            .with_symbols(symbols)
            .with_compress(false)
    }

    pub fn depth<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self::new(ChannelFamily::Depth).with_symbols(symbols)
    }

    pub fn full_depth<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self::new(ChannelFamily::DepthFull)
            .with_symbols(symbols)
            .with_limit(DEFAULT_FULL_DEPTH_LIMIT)
    }

    pub fn klines<S: Into<String>>(
        symbols: impl IntoIterator<Item = S>,
        interval: KlineInterval,
    ) -> Self {
        Self::new(ChannelFamily::Kline)
            .with_symbols(symbols)
            .with_interval(interval)
    }

    pub fn funding_rate<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self::new(ChannelFamily::FundingRate).with_symbols(symbols)
    }

    pub fn index_price<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self::new(ChannelFamily::IndexPrice).with_symbols(symbols)
    }

    pub fn fair_price<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self::new(ChannelFamily::FairPrice).with_symbols(symbols)
    }

    pub fn with_symbols<S: Into<String>>(mut self, symbols: impl IntoIterator<Item = S>) -> Self {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    pub const fn with_interval(mut self, interval: KlineInterval) -> Self {
        self.interval = Some(interval);
        self
    }

    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub const fn with_compress(mut self, compress: bool) -> Self {
        self.compress = Some(compress);
        self
    }

    /// Wire requests for this feed, validated before anything is sent
    ///
    /// Per-symbol channels yield one request per symbol sharing the same
    /// parameters; account-wide and aggregate channels yield exactly one request
    /// without a symbol.
    pub fn requests(
        &self,
        action: SubscriptionAction,
    ) -> Result<Vec<MexcWsRequest>, ExchangeError> {
        let method = format!("{}.{}", action.prefix(), self.family.as_str());

        if !self.family.is_per_symbol() {
            return Ok(vec![MexcWsRequest {
                method,
                param: Some(MexcRequestParam::default()),
            }]);
        }

        if self.symbols.is_empty() {
            return Err(ExchangeError::InvalidParameters(format!(
                "{} needs at least one symbol",
                self.family
            )));
        }

        let template = self.shared_params()?;
        Ok(self
            .symbols
            .iter()
            .map(|symbol| MexcWsRequest {
                method: method.clone(),
                param: Some(MexcRequestParam {
                    symbol: Some(symbol.clone()),
                    ..template.clone()
                }),
            })
            .collect())
    }

    fn shared_params(&self) -> Result<MexcRequestParam, ExchangeError> {
        let mut param = MexcRequestParam::default();

        match self.family {
            ChannelFamily::Kline => {
                let interval = self.interval.ok_or_else(|| {
                    ExchangeError::InvalidParameters("kline needs an interval".to_string())
                })?;
                param.interval = Some(interval_to_wire(interval)?.to_string());
            }
            ChannelFamily::Deal => {
                param.compress = Some(self.compress.unwrap_or(false));
                param.limit = Some(self.limit.unwrap_or(DEFAULT_DEAL_LIMIT));
            }
            ChannelFamily::Depth => {
                param.compress = self.compress;
            }
            ChannelFamily::DepthFull => {
                param.limit = Some(self.limit.unwrap_or(DEFAULT_FULL_DEPTH_LIMIT));
            }
            _ => {}
        }

        Ok(param)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_names_are_unique_and_parse_back() {
        for family in ChannelFamily::ALL {
            assert_eq!(ChannelFamily::from_family(family.as_str()), Some(family));
            assert_eq!(
                ChannelFamily::from_channel(&format!("push.{}", family)),
                Some(family)
            );
        }
    }

    #[test]
    fn test_channel_prefix_is_stripped() {
        assert_eq!(
            ChannelFamily::from_channel("push.depth.full"),
            Some(ChannelFamily::DepthFull)
        );
        assert_eq!(
            ChannelFamily::from_channel("push.personal.adl.level"),
            Some(ChannelFamily::PersonalAdlLevel)
        );
        assert_eq!(ChannelFamily::from_channel("push.brand.new"), None);
        assert_eq!(ChannelFamily::from_channel("deal"), None);
        assert_eq!(ChannelFamily::from_channel(""), None);
    }

    #[test]
    fn test_kline_request_per_symbol_with_shared_interval() {
        let requests = Subscription::klines(["BTC_USDT", "ETH_USDT"], KlineInterval::Minutes1)
            .requests(SubscriptionAction::Subscribe)
            .unwrap();

        assert_eq!(requests.len(), 2);
        for (request, symbol) in requests.iter().zip(["BTC_USDT", "ETH_USDT"]) {
            assert_eq!(request.method, "sub.kline");
            let param = request.param.as_ref().unwrap();
            assert_eq!(param.symbol.as_deref(), Some(symbol));
            assert_eq!(param.interval.as_deref(), Some("Min1"));
        }
    }

    #[test]
    fn test_unsupported_interval_builds_nothing() {
        let result = Subscription::klines(["BTC_USDT"], KlineInterval::Minutes3)
            .requests(SubscriptionAction::Subscribe);
        assert!(matches!(result, Err(ExchangeError::UnsupportedInterval(_))));

        let result = Subscription::new(ChannelFamily::Kline)
            .with_symbols(["BTC_USDT"])
            .requests(SubscriptionAction::Subscribe);
        assert!(matches!(result, Err(ExchangeError::InvalidParameters(_))));
    }

    #[test]
    fn test_deal_defaults_compress_and_limit() {
        let requests = Subscription::deals(["BTC_USDT", "ETH_USDT"])
            .requests(SubscriptionAction::Subscribe)
            .unwrap();

        assert_eq!(requests.len(), 2);
        for request in &requests {
            let param = request.param.as_ref().unwrap();
            assert_eq!(param.compress, Some(false));
            assert_eq!(param.limit, Some(DEFAULT_DEAL_LIMIT));
        }
    }

    #[test]
    fn test_deal_carries_compress_and_limit() {
        let requests = Subscription::deals(["BTC_USDT"])
            .with_limit(50)
            .requests(SubscriptionAction::Unsubscribe)
            .unwrap();

        assert_eq!(requests[0].method, "unsub.deal");
        let param = requests[0].param.as_ref().unwrap();
        assert_eq!(param.compress, Some(false));
        assert_eq!(param.limit, Some(50));
    }

    #[test]
    fn test_account_wide_and_aggregate_channels_send_one_request() {
        let private = Subscription::new(ChannelFamily::PersonalOrder)
            .with_symbols(["BTC_USDT", "ETH_USDT"])
            .requests(SubscriptionAction::Subscribe)
            .unwrap();
        assert_eq!(private.len(), 1);
        assert_eq!(private[0].method, "sub.personal.order");
        assert!(private[0].param.as_ref().unwrap().symbol.is_none());

        let tickers = Subscription::tickers()
            .requests(SubscriptionAction::Subscribe)
            .unwrap();
        assert_eq!(tickers.len(), 1);
        assert_eq!(tickers[0].method, "sub.tickers");
    }

    #[test]
    fn test_per_symbol_channel_without_symbols() {
        let result =
            Subscription::depth(Vec::<String>::new()).requests(SubscriptionAction::Subscribe);
        assert!(matches!(result, Err(ExchangeError::InvalidParameters(_))));
    }

    #[test]
    fn test_full_depth_default_limit() {
        let requests = Subscription::full_depth(["BTC_USDT"])
            .requests(SubscriptionAction::Subscribe)
            .unwrap();
        assert_eq!(requests[0].method, "sub.depth.full");
        assert_eq!(
            requests[0].param.as_ref().unwrap().limit,
            Some(DEFAULT_FULL_DEPTH_LIMIT)
        );
    }
}
