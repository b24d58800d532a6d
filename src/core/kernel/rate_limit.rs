use crate::core::errors::ExchangeError;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Identity a request is counted against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketFamily {
    /// Client network address
    Ip,
    /// Authenticated account
    Account,
}

/// Cost declaration for every outbound operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointLimit {
    WsSubscribe,
    WsUnsubscribe,
    WsLogin,
    WsPing,
    PublicMarket,
    PrivateAccount,
    PrivateOrderQuery,
    BulkOrderList,
}

impl EndpointLimit {
    pub const fn family(self) -> BucketFamily {
        match self {
            Self::WsSubscribe | Self::WsUnsubscribe | Self::WsPing | Self::PublicMarket => {
                BucketFamily::Ip
            }
            Self::WsLogin
            | Self::PrivateAccount
            | Self::PrivateOrderQuery
            | Self::BulkOrderList => BucketFamily::Account,
        }
    }

    pub fn weight(self) -> NonZeroU32 {
        match self {
            Self::BulkOrderList => nonzero!(40u32),
            _ => nonzero!(1u32),
        }
    }
}

/// Weighted-bucket limiter consumed by the stream
///
/// Bucket refill policy belongs to the implementation; callers only wait for capacity.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn acquire(&self, family: BucketFamily, weight: NonZeroU32)
        -> Result<(), ExchangeError>;
}

/// One `governor` GCRA limiter per bucket family
pub struct GovernorRateLimiter {
    ip: DefaultDirectRateLimiter,
    account: DefaultDirectRateLimiter,
}

impl GovernorRateLimiter {
    pub fn new(ip_quota: Quota, account_quota: Quota) -> Self {
        Self {
            ip: governor::RateLimiter::direct(ip_quota),
            account: governor::RateLimiter::direct(account_quota),
        }
    }

    fn bucket(&self, family: BucketFamily) -> &DefaultDirectRateLimiter {
        match family {
            BucketFamily::Ip => &self.ip,
            BucketFamily::Account => &self.account,
        }
    }
}

impl Default for GovernorRateLimiter {
    /// 20 units per second per family, bursting to 40 so bulk operations fit
    fn default() -> Self {
        let quota = Quota::per_second(nonzero!(20u32)).allow_burst(nonzero!(40u32));
        Self::new(quota, quota)
    }
}

#[async_trait]
impl RateLimiter for GovernorRateLimiter {
    async fn acquire(
        &self,
        family: BucketFamily,
        weight: NonZeroU32,
    ) -> Result<(), ExchangeError> {
        self.bucket(family)
            .until_n_ready(weight)
            .await
            .map_err(|e| {
                ExchangeError::RateLimited(format!(
                    "{:?} bucket cannot hold weight {}: {}",
                    family, weight, e
                ))
            })
    }
}

/// Acquires capacity for an endpoint, waiting at most one window
#[derive(Clone)]
pub struct RateGate {
    limiter: Arc<dyn RateLimiter>,
    window: Duration,
}

impl RateGate {
    pub fn new(limiter: Arc<dyn RateLimiter>, window: Duration) -> Self {
        Self { limiter, window }
    }

    pub async fn acquire(&self, endpoint: EndpointLimit) -> Result<(), ExchangeError> {
        let family = endpoint.family();
        let weight = endpoint.weight();
        trace!(?endpoint, ?family, weight = weight.get(), "acquiring rate capacity");

        tokio::time::timeout(self.window, self.limiter.acquire(family, weight))
            .await
            .map_err(|_| {
                ExchangeError::RateLimited(format!(
                    "{:?} waited longer than {:?} for {:?} capacity",
                    endpoint, self.window, family
                ))
            })?
    }
}

impl std::fmt::Debug for RateGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGate")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
