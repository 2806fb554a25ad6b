// src/config.rs

use crate::core::gate::TradingWindow;
use crate::error::ConfigurationError;
use crate::utils::precision::decimal_from_f64;
use chrono::Weekday;
use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::env;
use std::time::Duration;
use url::Url;

pub const CONFIG_PATH_VAR: &str = "SENTINEL_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.json";
const ENV_PREFIX: &str = "SENTINEL";

// --- Raw document, as written by the operator ---

#[derive(Debug, Deserialize, Clone)]
pub struct RawConfig {
    pub telegram_chat_id: String,
    #[serde(default)]
    pub quote_currency: Option<String>,
    #[serde(default)]
    pub check_interval_secs: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub cooldown_multiplier: Option<u32>,
    #[serde(default)]
    pub tracked_tokens: HashMap<String, RawAsset>,
    #[serde(default)]
    pub alert_thresholds: RawThresholds,
    #[serde(default)]
    pub trading_hours: RawTradingHours,
    #[serde(default)]
    pub wallet: Option<RawWallet>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawAsset {
    #[serde(default, alias = "cmc_symbol")]
    pub feed_symbol: Option<String>,
    pub entry_price: Option<f64>,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
    #[serde(default, alias = "min_funding_balance")]
    pub min_usdt_balance: Option<f64>,
    #[serde(default, alias = "min_holding_balance")]
    pub min_token_holding: Option<f64>,
    pub contract: Option<String>,
    pub decimals: Option<u32>,
    #[serde(default)]
    pub native: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawThresholds {
    pub target_profit_percent: Option<f64>,
    pub price_surge_percent: Option<f64>,
    pub price_drop_percent: Option<f64>,
    pub zone_alerts: Option<bool>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawTradingHours {
    pub start_hour: Option<i64>,
    pub end_hour: Option<i64>,
    #[serde(default)]
    pub days: Vec<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawWallet {
    pub rpc_url: Option<String>,
    pub address: Option<String>,
    pub funding_symbol: Option<String>,
    pub funding_contract: Option<String>,
    pub funding_decimals: Option<u32>,
    #[serde(default)]
    pub static_balances: HashMap<String, f64>,
}

// --- Validated, immutable settings ---

/// How an asset's holding is read from chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Erc20 { contract: String, decimals: u32 },
    Native { decimals: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetConfig {
    pub symbol: String,
    pub feed_symbol: String,
    pub entry_price: Option<Decimal>,
    pub buy_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub min_funding_balance: Decimal,
    pub min_holding_balance: Decimal,
    pub token: Option<TokenSource>,
}

impl AssetConfig {
    /// Asset with only the identifiers set; every rule input is unset.
    pub fn new(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            feed_symbol: symbol.clone(),
            symbol,
            entry_price: None,
            buy_price: None,
            sell_price: None,
            min_funding_balance: Decimal::ZERO,
            min_holding_balance: Decimal::ZERO,
            token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub target_profit_fraction: Decimal,
    pub surge_percent: Decimal,
    pub drop_percent: Decimal,
    pub zone_alerts: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            target_profit_fraction: Decimal::new(4, 2),
            surge_percent: Decimal::from(5),
            drop_percent: Decimal::from(5),
            zone_alerts: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FundingAsset {
    pub symbol: String,
    pub token: Option<TokenSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WalletSource {
    Rpc { url: Url, address: String },
    Static(HashMap<String, Decimal>),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub chat_id: String,
    pub quote_currency: String,
    /// Sorted by symbol.
    pub assets: Vec<AssetConfig>,
    pub thresholds: Thresholds,
    pub trading_window: TradingWindow,
    pub funding: FundingAsset,
    pub wallet: WalletSource,
    pub check_interval: Duration,
    pub request_timeout: Duration,
    pub cooldown_multiplier: u32,
}

impl Settings {
    /// Loads the file named by `SENTINEL_CONFIG` (default `config.json`),
    /// overlaid with `SENTINEL__*` environment variables.
    pub fn load() -> Result<Self, ConfigurationError> {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let builder = Config::builder()
            .add_source(File::with_name(&path))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let raw: RawConfig = builder.build()?.try_deserialize()?;
        raw.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let raw: RawConfig = Config::builder()
            .add_source(File::from_str(json, FileFormat::Json))
            .build()?
            .try_deserialize()?;
        raw.validate()
    }

    pub fn cooldown(&self) -> Duration {
        self.check_interval * self.cooldown_multiplier
    }
}

impl RawConfig {
    pub fn validate(self) -> Result<Settings, ConfigurationError> {
        let chat_id = self.telegram_chat_id.trim().to_string();
        if chat_id.is_empty() {
            return Err(ConfigurationError::invalid("telegram_chat_id", "must not be empty"));
        }

        let quote_currency = self
            .quote_currency
            .map(|c| c.trim().to_ascii_uppercase())
            .unwrap_or_else(|| "GBP".to_string());
        if quote_currency.is_empty() {
            return Err(ConfigurationError::invalid("quote_currency", "must not be empty"));
        }

        let mut seen = BTreeSet::new();
        let mut assets = Vec::with_capacity(self.tracked_tokens.len());
        for (key, raw) in self.tracked_tokens {
            let symbol = normalize_symbol(&key);
            if symbol.is_empty() {
                return Err(ConfigurationError::invalid("tracked_tokens", "empty symbol"));
            }
            if !seen.insert(symbol.clone()) {
                return Err(ConfigurationError::DuplicateSymbol(symbol));
            }
            assets.push(raw.validate(symbol)?);
        }
        assets.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let thresholds = self.alert_thresholds.validate()?;
        let trading_window = self.trading_hours.validate()?;

        let check_interval = positive_secs("check_interval_secs", self.check_interval_secs, 60)?;
        let request_timeout =
            positive_secs("request_timeout_secs", self.request_timeout_secs, 10)?;
        let cooldown_multiplier = self.cooldown_multiplier.unwrap_or(5).max(1);

        let (funding, wallet) = validate_wallet(self.wallet.unwrap_or_default())?;

        Ok(Settings {
            chat_id,
            quote_currency,
            assets,
            thresholds,
            trading_window,
            funding,
            wallet,
            check_interval,
            request_timeout,
            cooldown_multiplier,
        })
    }
}

impl RawAsset {
    fn validate(self, symbol: String) -> Result<AssetConfig, ConfigurationError> {
        let field = |name: &str| format!("tracked_tokens.{}.{}", symbol, name);

        let feed_symbol = self
            .feed_symbol
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| symbol.clone());

        let token = token_source(
            &field("contract"),
            self.contract,
            self.decimals,
            self.native,
        )?;

        Ok(AssetConfig {
            entry_price: optional_amount(&field("entry_price"), self.entry_price)?,
            buy_price: optional_amount(&field("buy_price"), self.buy_price)?,
            sell_price: optional_amount(&field("sell_price"), self.sell_price)?,
            min_funding_balance: optional_amount(&field("min_usdt_balance"), self.min_usdt_balance)?
                .unwrap_or(Decimal::ZERO),
            min_holding_balance: optional_amount(
                &field("min_token_holding"),
                self.min_token_holding,
            )?
            .unwrap_or(Decimal::ZERO),
            symbol,
            feed_symbol,
            token,
        })
    }
}

impl RawThresholds {
    fn validate(self) -> Result<Thresholds, ConfigurationError> {
        let defaults = Thresholds::default();
        let target_percent =
            optional_amount("alert_thresholds.target_profit_percent", self.target_profit_percent)?;
        Ok(Thresholds {
            target_profit_fraction: target_percent
                .map(|p| p / Decimal::ONE_HUNDRED)
                .unwrap_or(defaults.target_profit_fraction),
            surge_percent: optional_amount(
                "alert_thresholds.price_surge_percent",
                self.price_surge_percent,
            )?
            .unwrap_or(defaults.surge_percent),
            drop_percent: optional_amount(
                "alert_thresholds.price_drop_percent",
                self.price_drop_percent,
            )?
            .unwrap_or(defaults.drop_percent),
            zone_alerts: self.zone_alerts.unwrap_or(defaults.zone_alerts),
        })
    }
}

impl RawTradingHours {
    fn validate(self) -> Result<TradingWindow, ConfigurationError> {
        let start = hour("trading_hours.start_hour", self.start_hour.unwrap_or(8))?;
        let end = hour("trading_hours.end_hour", self.end_hour.unwrap_or(18))?;
        if start >= end {
            return Err(ConfigurationError::invalid(
                "trading_hours",
                format!("start_hour {} must be before end_hour {}", start, end),
            ));
        }

        let mut days = HashSet::new();
        for name in &self.days {
            let day: Weekday = name.trim().parse().map_err(|_| {
                ConfigurationError::invalid("trading_hours.days", format!("unknown day {:?}", name))
            })?;
            days.insert(day);
        }

        let tz_name = self.timezone.unwrap_or_else(|| "Europe/London".to_string());
        let tz: Tz = tz_name
            .trim()
            .parse()
            .map_err(|e| ConfigurationError::invalid("trading_hours.timezone", format!("{}", e)))?;

        Ok(TradingWindow::new(days, start, end, tz))
    }
}

fn validate_wallet(raw: RawWallet) -> Result<(FundingAsset, WalletSource), ConfigurationError> {
    let funding_symbol = raw
        .funding_symbol
        .as_deref()
        .map(normalize_symbol)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "USDT".to_string());
    let funding_token = match raw.funding_contract {
        Some(contract) => Some(TokenSource::Erc20 {
            contract: parse_address("wallet.funding_contract", &contract)?,
            decimals: raw.funding_decimals.unwrap_or(6),
        }),
        None => None,
    };
    let funding = FundingAsset {
        symbol: funding_symbol,
        token: funding_token,
    };

    let wallet = match (raw.rpc_url, raw.address) {
        (Some(rpc), Some(address)) => WalletSource::Rpc {
            url: Url::parse(rpc.trim())
                .map_err(|e| ConfigurationError::invalid("wallet.rpc_url", e.to_string()))?,
            address: parse_address("wallet.address", &address)?,
        },
        (None, None) => {
            let mut balances = HashMap::new();
            for (key, quantity) in raw.static_balances {
                let symbol = normalize_symbol(&key);
                let field = format!("wallet.static_balances.{}", symbol);
                if let Some(q) = optional_amount(&field, Some(quantity))? {
                    balances.insert(symbol, q);
                }
            }
            WalletSource::Static(balances)
        }
        _ => {
            return Err(ConfigurationError::invalid(
                "wallet",
                "rpc_url and address must be set together",
            ))
        }
    };

    Ok((funding, wallet))
}

fn token_source(
    field: &str,
    contract: Option<String>,
    decimals: Option<u32>,
    native: bool,
) -> Result<Option<TokenSource>, ConfigurationError> {
    let decimals = decimals.unwrap_or(18);
    if decimals > 28 {
        return Err(ConfigurationError::invalid(field, "decimals must be at most 28"));
    }
    match (native, contract) {
        (true, _) => Ok(Some(TokenSource::Native { decimals })),
        (false, Some(contract)) => Ok(Some(TokenSource::Erc20 {
            contract: parse_address(field, &contract)?,
            decimals,
        })),
        (false, None) => Ok(None),
    }
}

/// Normalizes a `0x`-prefixed 20-byte hex address to lowercase.
fn parse_address(field: &str, raw: &str) -> Result<String, ConfigurationError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(body)
        .map_err(|e| ConfigurationError::invalid(field, format!("not hex: {}", e)))?;
    if bytes.len() != 20 {
        return Err(ConfigurationError::invalid(
            field,
            format!("expected 20 bytes, got {}", bytes.len()),
        ));
    }
    Ok(format!("0x{}", hex::encode(bytes)))
}

fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

fn optional_amount(field: &str, value: Option<f64>) -> Result<Option<Decimal>, ConfigurationError> {
    let Some(v) = value else {
        return Ok(None);
    };
    if !v.is_finite() || v < 0.0 {
        return Err(ConfigurationError::invalid(
            field,
            format!("{} is not a finite non-negative number", v),
        ));
    }
    decimal_from_f64(v)
        .map(Some)
        .ok_or_else(|| ConfigurationError::invalid(field, format!("{} is out of range", v)))
}

fn hour(field: &str, value: i64) -> Result<u32, ConfigurationError> {
    if !(0..=23).contains(&value) {
        return Err(ConfigurationError::invalid(
            field,
            format!("{} is outside 0-23", value),
        ));
    }
    Ok(value as u32)
}

fn positive_secs(field: &str, value: Option<u64>, default: u64) -> Result<Duration, ConfigurationError> {
    match value.unwrap_or(default) {
        0 => Err(ConfigurationError::invalid(field, "must be greater than zero")),
        secs => Ok(Duration::from_secs(secs)),
    }
}

// --- Secrets ---

pub const PRICE_FEED_KEY_VAR: &str = "CMC_API_KEY";
pub const BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";

/// Credentials supplied out-of-band, never through the config document.
#[derive(Clone)]
pub struct Secrets {
    pub price_feed_api_key: String,
    pub bot_token: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("price_feed_api_key", &"<redacted>")
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigurationError::MissingSecret(name))
        };
        Ok(Self {
            price_feed_api_key: read(PRICE_FEED_KEY_VAR)?,
            bot_token: read(BOT_TOKEN_VAR)?,
        })
    }
}
