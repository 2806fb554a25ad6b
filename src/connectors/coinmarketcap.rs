// src/connectors/coinmarketcap.rs
use crate::connectors::messages::{Quote, QuotesResponse};
use crate::connectors::traits::PriceFeedProvider;
use crate::error::FeedError;
use crate::types::PriceSnapshot;
use crate::utils::precision::decimal_from_f64;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://pro-api.coinmarketcap.com";

pub struct CoinMarketCapClient {
    api_key: String,
    http_client: Client,
    base_rest_url: String,
}

impl CoinMarketCapClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            api_key,
            http_client: Client::builder().timeout(timeout).build()?,
            base_rest_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_rest_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn take_quote(
        mut resp: QuotesResponse,
        feed_symbol: &str,
        quote_currency: &str,
    ) -> Option<Quote> {
        let key = resp
            .data
            .keys()
            .find(|k| k.eq_ignore_ascii_case(feed_symbol))?
            .clone();
        let mut entry = resp.data.remove(&key)?;
        let key = entry
            .quote
            .keys()
            .find(|k| k.eq_ignore_ascii_case(quote_currency))?
            .clone();
        entry.quote.remove(&key)
    }
}

#[async_trait]
impl PriceFeedProvider for CoinMarketCapClient {
    async fn fetch(
        &self,
        feed_symbol: &str,
        quote_currency: &str,
    ) -> Result<PriceSnapshot, FeedError> {
        let url = format!("{}/v1/cryptocurrency/quotes/latest", self.base_rest_url);
        let resp = self
            .http_client
            .get(&url)
            .header("Accepts", "application/json")
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .query(&[("symbol", feed_symbol), ("convert", quote_currency)])
            .send()
            .await?
            .error_for_status()?
            .json::<QuotesResponse>()
            .await?;

        let missing = || FeedError::MissingQuote {
            symbol: feed_symbol.to_string(),
            currency: quote_currency.to_string(),
        };
        let quote = Self::take_quote(resp, feed_symbol, quote_currency).ok_or_else(missing)?;
        let raw_price = quote.price.ok_or_else(missing)?;

        let price = decimal_from_f64(raw_price)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or(FeedError::InvalidPrice {
                symbol: feed_symbol.to_string(),
                price: raw_price,
            })?;

        // Absent or non-finite changes count as no change.
        let change = |v: Option<f64>| v.and_then(decimal_from_f64).unwrap_or(Decimal::ZERO);
        let snapshot = PriceSnapshot::new(
            price,
            change(quote.percent_change_3h),
            change(quote.percent_change_24h),
        );

        debug!(symbol = %feed_symbol, price = %snapshot.price, "Quote received");
        Ok(snapshot)
    }
}
