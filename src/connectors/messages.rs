// src/connectors/messages.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Response of `/v1/cryptocurrency/quotes/latest`.
/// `data` is keyed by the requested symbol, `quote` by the convert currency.
#[derive(Debug, Deserialize)]
pub struct QuotesResponse {
    #[serde(default)]
    pub data: HashMap<String, QuoteEntry>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteEntry {
    #[serde(default)]
    pub quote: HashMap<String, Quote>,
}

#[derive(Debug, Deserialize)]
pub struct Quote {
    pub price: Option<f64>,
    pub percent_change_3h: Option<f64>,
    pub percent_change_24h: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<String>,
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub parse_mode: &'static str,
}
