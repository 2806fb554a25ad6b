// src/connectors/traits.rs
use crate::config::TokenSource;
use crate::error::{FeedError, NotifierError};
use crate::types::{BalanceSnapshot, PriceSnapshot};
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;

pub trait Clock: Send + Sync {
    /// Current time in the trading window's zone.
    fn now(&self) -> DateTime<Tz>;
}

#[async_trait]
pub trait PriceFeedProvider: Send + Sync {
    async fn fetch(&self, feed_symbol: &str, quote_currency: &str)
        -> Result<PriceSnapshot, FeedError>;
}

/// One holding to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRequest {
    pub symbol: String,
    pub token: Option<TokenSource>,
}

#[async_trait]
pub trait BalanceProvider: Send + Sync {
    /// Never fails as a whole: a holding that cannot be read is reported as zero.
    /// Implementations bound every read with their own timeout.
    async fn fetch_all(&self, requests: &[BalanceRequest]) -> BalanceSnapshot;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotifierError>;
}
