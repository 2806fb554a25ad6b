// src/types.rs
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Telemetry observed for one asset at one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    pub price: Decimal,
    pub change_3h: Decimal,  // percent
    pub change_24h: Decimal, // percent
}

impl PriceSnapshot {
    pub fn new(price: Decimal, change_3h: Decimal, change_24h: Decimal) -> Self {
        Self {
            price,
            change_3h,
            change_24h,
        }
    }
}

/// Held quantities by asset symbol. Anything missing counts as zero.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BalanceSnapshot {
    quantities: HashMap<String, Decimal>,
}

impl BalanceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, quantity: Decimal) {
        self.quantities.insert(symbol.into(), quantity.max(Decimal::ZERO));
    }

    pub fn get(&self, symbol: &str) -> Decimal {
        self.quantities
            .get(symbol)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

impl FromIterator<(String, Decimal)> for BalanceSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (symbol, quantity) in iter {
            snapshot.insert(symbol, quantity);
        }
        snapshot
    }
}

/// Where the price sits inside its approximate 24h range.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Top,
    Bottom,
    #[default]
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Surge,
    Drop,
    ProfitTarget,
    NearTop,
    NearBottom,
    Buy,
    Sell,
}

/// One rule's rendered text for one asset in one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertFragment {
    pub kind: AlertKind,
    pub text: String,
}

impl AlertFragment {
    pub fn new(kind: AlertKind, text: String) -> Self {
        Self { kind, text }
    }
}

/// Counters for one scheduler tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub gated: bool,
    pub evaluated: usize,
    pub skipped: usize,
    pub dispatched: usize,
}
