// src/utils/precision.rs
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Converts a provider float into a Decimal. NaN and infinities yield None.
pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}

/// Rounds half away from zero to `dp` places.
/// Example: 263.157..., dp=2 -> 263.16
pub fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// True when |value| is strictly below `epsilon`.
pub fn is_negligible(value: Decimal, epsilon: Decimal) -> bool {
    value.abs() < epsilon
}

/// Display prefix for a quote currency code.
pub fn currency_sign(code: &str) -> String {
    match code.to_ascii_uppercase().as_str() {
        "GBP" => "£".to_string(),
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        other => format!("{} ", other),
    }
}
