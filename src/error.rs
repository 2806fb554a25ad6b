// src/error.rs
use thiserror::Error;

/// Fatal at startup: the process exits before the scheduler runs.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("missing secret {0} (set it in the environment or .env)")]
    MissingSecret(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("duplicate asset symbol {0}")]
    DuplicateSymbol(String),
}

impl ConfigurationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Price feed failure. Skips the asset for the current tick.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("price request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("price request timed out after {0}s")]
    Timeout(u64),

    #[error("no quote for {symbol} in {currency}")]
    MissingQuote { symbol: String, currency: String },

    #[error("unusable price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: f64 },
}

/// Balance read failure. Degrades to a zero holding for that asset.
#[derive(Error, Debug)]
pub enum BalanceError {
    #[error("rpc request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("rpc read timed out after {0}s")]
    Timeout(u64),

    #[error("malformed rpc result: {0}")]
    Malformed(String),

    #[error("balance does not fit a decimal: {0}")]
    Overflow(String),
}

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("delivery failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("delivery rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
