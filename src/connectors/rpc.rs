// src/connectors/rpc.rs
use crate::config::TokenSource;
use crate::connectors::messages::{RpcRequest, RpcResponse};
use crate::connectors::traits::{BalanceProvider, BalanceRequest};
use crate::error::BalanceError;
use crate::types::BalanceSnapshot;
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// `balanceOf(address)`
const BALANCE_OF_SELECTOR: &str = "70a08231";

/// Reads holdings of one wallet over EVM JSON-RPC.
pub struct RpcBalanceProvider {
    http_client: Client,
    rpc_url: Url,
    wallet: String,
    timeout: Duration,
}

impl RpcBalanceProvider {
    /// `wallet` is a `0x`-prefixed lowercase address, as produced by config validation.
    pub fn new(rpc_url: Url, wallet: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            rpc_url,
            wallet,
            timeout,
        })
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> Result<String, BalanceError> {
        let resp = self
            .http_client
            .post(self.rpc_url.clone())
            .json(&RpcRequest::new(method, params))
            .send()
            .await?
            .error_for_status()?
            .json::<RpcResponse>()
            .await?;

        if let Some(err) = resp.error {
            return Err(BalanceError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        resp.result
            .ok_or_else(|| BalanceError::Malformed("response has no result".to_string()))
    }

    /// One holding, bounded by the request timeout so a stalled read only
    /// costs its own symbol.
    async fn balance_of(&self, token: &TokenSource) -> Result<Decimal, BalanceError> {
        match tokio::time::timeout(self.timeout, self.read_balance(token)).await {
            Ok(result) => result,
            Err(_) => Err(BalanceError::Timeout(self.timeout.as_secs())),
        }
    }

    async fn read_balance(&self, token: &TokenSource) -> Result<Decimal, BalanceError> {
        match token {
            TokenSource::Native { decimals } => {
                let raw = self
                    .call("eth_getBalance", json!([self.wallet, "latest"]))
                    .await?;
                scale_quantity(&raw, *decimals)
            }
            TokenSource::Erc20 { contract, decimals } => {
                let data = balance_of_calldata(&self.wallet)?;
                let raw = self
                    .call("eth_call", json!([{ "to": contract, "data": data }, "latest"]))
                    .await?;
                scale_quantity(&raw, *decimals)
            }
        }
    }
}

#[async_trait]
impl BalanceProvider for RpcBalanceProvider {
    async fn fetch_all(&self, requests: &[BalanceRequest]) -> BalanceSnapshot {
        let reads = requests.iter().map(|req| async move {
            let quantity = match &req.token {
                Some(token) => match self.balance_of(token).await {
                    Ok(q) => q,
                    Err(e) => {
                        warn!(symbol = %req.symbol, error = %e, "Balance read failed, using zero");
                        Decimal::ZERO
                    }
                },
                None => {
                    debug!(symbol = %req.symbol, "No token source configured, holding is zero");
                    Decimal::ZERO
                }
            };
            (req.symbol.clone(), quantity)
        });
        join_all(reads).await.into_iter().collect()
    }
}

/// Balances fixed in configuration, for running without a chain endpoint.
pub struct StaticBalanceProvider {
    balances: HashMap<String, Decimal>,
}

impl StaticBalanceProvider {
    pub fn new(balances: HashMap<String, Decimal>) -> Self {
        Self { balances }
    }
}

#[async_trait]
impl BalanceProvider for StaticBalanceProvider {
    async fn fetch_all(&self, requests: &[BalanceRequest]) -> BalanceSnapshot {
        requests
            .iter()
            .map(|req| {
                let quantity = self
                    .balances
                    .get(&req.symbol)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                (req.symbol.clone(), quantity)
            })
            .collect()
    }
}

fn balance_of_calldata(wallet: &str) -> Result<String, BalanceError> {
    let body = wallet.strip_prefix("0x").unwrap_or(wallet);
    let bytes = hex::decode(body)
        .map_err(|e| BalanceError::Malformed(format!("wallet address: {}", e)))?;
    let mut word = [0u8; 32];
    if bytes.len() > word.len() {
        return Err(BalanceError::Malformed("wallet address too long".to_string()));
    }
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(format!("0x{}{}", BALANCE_OF_SELECTOR, hex::encode(word)))
}

/// Converts a hex integer quantity into token units.
/// Example: "0x0de0b6b3a7640000" with 18 decimals -> 1
fn scale_quantity(raw: &str, decimals: u32) -> Result<Decimal, BalanceError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| BalanceError::Malformed(format!("not a hex quantity: {}", raw)))?
        .trim_start_matches('0');
    if digits.is_empty() {
        return Ok(Decimal::ZERO);
    }
    if digits.len() > 32 {
        return Err(BalanceError::Overflow(raw.to_string()));
    }
    let value = u128::from_str_radix(digits, 16)
        .map_err(|e| BalanceError::Malformed(format!("{}: {}", raw, e)))?;
    let value = i128::try_from(value).map_err(|_| BalanceError::Overflow(raw.to_string()))?;
    Decimal::try_from_i128_with_scale(value, decimals)
        .map(|d| d.normalize())
        .map_err(|_| BalanceError::Overflow(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn calldata_pads_address_into_one_word() {
        let data = balance_of_calldata("0x9e8ca6e7e4a612909ed892dc69bd69325a497e73").unwrap();
        assert_eq!(
            data,
            "0x70a08231\
             0000000000000000000000009e8ca6e7e4a612909ed892dc69bd69325a497e73"
        );
    }

    #[test]
    fn scales_by_token_decimals() {
        assert_eq!(scale_quantity("0x0de0b6b3a7640000", 18).unwrap(), Decimal::ONE);
        // 30.5 USDT with 6 decimals
        assert_eq!(
            scale_quantity("0x1d164a0", 6).unwrap(),
            Decimal::from_str("30.5").unwrap()
        );
        assert_eq!(scale_quantity("0x0", 18).unwrap(), Decimal::ZERO);
        assert_eq!(scale_quantity("0x", 18).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn rejects_garbage_and_huge_values() {
        assert!(matches!(scale_quantity("12", 18), Err(BalanceError::Malformed(_))));
        assert!(matches!(scale_quantity("0xzz", 18), Err(BalanceError::Malformed(_))));
        let huge = format!("0x{}", "f".repeat(40));
        assert!(matches!(scale_quantity(&huge, 18), Err(BalanceError::Overflow(_))));
    }

    #[tokio::test]
    async fn static_balances_default_to_zero() {
        let provider = StaticBalanceProvider::new(
            [("USDT".to_string(), Decimal::from(30))].into_iter().collect(),
        );
        let requests = vec![
            BalanceRequest {
                symbol: "USDT".to_string(),
                token: None,
            },
            BalanceRequest {
                symbol: "ETH".to_string(),
                token: None,
            },
        ];
        let snapshot = provider.fetch_all(&requests).await;
        assert_eq!(snapshot.get("USDT"), Decimal::from(30));
        assert_eq!(snapshot.get("ETH"), Decimal::ZERO);
    }
}
