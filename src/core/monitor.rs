// src/core/monitor.rs
use crate::config::{AssetConfig, Settings};
use crate::connectors::traits::{BalanceProvider, BalanceRequest, Clock, Notifier, PriceFeedProvider};
use crate::core::aggregator;
use crate::core::engine::AlertEngine;
use crate::core::scheduler::TickRunner;
use crate::error::FeedError;
use crate::types::{BalanceSnapshot, TickReport};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssetOutcome {
    FeedFailed,
    Quiet,
    Dispatched,
    DeliveryFailed,
}

/// One evaluation cycle across every tracked asset.
pub struct Monitor {
    settings: Arc<Settings>,
    engine: Arc<AlertEngine>,
    clock: Arc<dyn Clock>,
    prices: Arc<dyn PriceFeedProvider>,
    balances: Arc<dyn BalanceProvider>,
    notifier: Arc<dyn Notifier>,
    balance_requests: Vec<BalanceRequest>,
}

impl Monitor {
    pub fn new(
        settings: Arc<Settings>,
        clock: Arc<dyn Clock>,
        prices: Arc<dyn PriceFeedProvider>,
        balances: Arc<dyn BalanceProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let mut balance_requests: Vec<BalanceRequest> = settings
            .assets
            .iter()
            .map(|a| BalanceRequest {
                symbol: a.symbol.clone(),
                token: a.token.clone(),
            })
            .collect();
        if !balance_requests
            .iter()
            .any(|r| r.symbol == settings.funding.symbol)
        {
            balance_requests.push(BalanceRequest {
                symbol: settings.funding.symbol.clone(),
                token: settings.funding.token.clone(),
            });
        }

        Self {
            engine: Arc::new(AlertEngine::from_settings(&settings)),
            settings,
            clock,
            prices,
            balances,
            notifier,
            balance_requests,
        }
    }

    pub async fn tick(&self) -> Result<TickReport> {
        let now = self.clock.now();
        if !self.settings.trading_window.allows(&now) {
            debug!(now = %now.format("%a %H:%M"), "Outside trading window, skipping tick");
            return Ok(TickReport {
                gated: true,
                ..TickReport::default()
            });
        }

        // Providers bound each read themselves; a stalled holding reads as zero.
        let balances = self.balances.fetch_all(&self.balance_requests).await;
        let balances = Arc::new(balances);

        let handles = self
            .settings
            .assets
            .iter()
            .map(|asset| tokio::spawn(self.asset_unit(asset.clone(), balances.clone(), now)));
        let results = join_all(handles).await;

        let mut report = TickReport::default();
        let mut failures = Vec::new();
        for (asset, result) in self.settings.assets.iter().zip(results) {
            match result {
                Ok(AssetOutcome::FeedFailed) => report.skipped += 1,
                Ok(AssetOutcome::Quiet) | Ok(AssetOutcome::DeliveryFailed) => report.evaluated += 1,
                Ok(AssetOutcome::Dispatched) => {
                    report.evaluated += 1;
                    report.dispatched += 1;
                }
                Err(e) => {
                    error!(symbol = %asset.symbol, error = %e, "Asset task aborted");
                    failures.push(asset.symbol.clone());
                }
            }
        }

        if !failures.is_empty() {
            return Err(anyhow!("evaluation aborted for {}", failures.join(", ")));
        }
        Ok(report)
    }

    /// Fetch, evaluate and dispatch for one asset. Owns everything it touches
    /// so it can run as its own task.
    fn asset_unit(
        &self,
        asset: AssetConfig,
        balances: Arc<BalanceSnapshot>,
        now: chrono::DateTime<chrono_tz::Tz>,
    ) -> impl std::future::Future<Output = AssetOutcome> + Send + 'static {
        let engine = self.engine.clone();
        let prices = self.prices.clone();
        let notifier = self.notifier.clone();
        let quote_currency = self.settings.quote_currency.clone();
        let timeout = self.settings.request_timeout;

        async move {
            let snapshot = match fetch_with_timeout(&*prices, &asset, &quote_currency, timeout).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(symbol = %asset.symbol, error = %e, "Price fetch failed, skipping asset");
                    return AssetOutcome::FeedFailed;
                }
            };

            let fragments = engine.evaluate(&asset, &snapshot, &balances);
            let Some(message) = aggregator::render(&asset.symbol, &fragments) else {
                info!(
                    "[{}] No alerts for {}. Price: {:.2}",
                    now.format("%H:%M:%S"),
                    asset.symbol,
                    snapshot.price
                );
                return AssetOutcome::Quiet;
            };

            match notifier.send(&message).await {
                Ok(()) => {
                    info!(symbol = %asset.symbol, fragments = fragments.len(), "🚨 Alert sent");
                    AssetOutcome::Dispatched
                }
                Err(e) => {
                    error!(symbol = %asset.symbol, error = %e, "Failed to send alert");
                    AssetOutcome::DeliveryFailed
                }
            }
        }
    }
}

async fn fetch_with_timeout(
    prices: &dyn PriceFeedProvider,
    asset: &AssetConfig,
    quote_currency: &str,
    timeout: Duration,
) -> Result<crate::types::PriceSnapshot, FeedError> {
    match tokio::time::timeout(timeout, prices.fetch(&asset.feed_symbol, quote_currency)).await {
        Ok(result) => result,
        Err(_) => Err(FeedError::Timeout(timeout.as_secs())),
    }
}

#[async_trait]
impl TickRunner for Monitor {
    async fn run_tick(&self) -> Result<TickReport> {
        self.tick().await
    }
}
