// src/core/aggregator.rs
use crate::types::AlertFragment;

/// Joins one asset's fragments under a single banner. Nothing fired, nothing sent.
pub fn render(symbol: &str, fragments: &[AlertFragment]) -> Option<String> {
    if fragments.is_empty() {
        return None;
    }
    let body = fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    Some(format!("🚨 *Crypto Alert: {}* 🚨\n\n{}", symbol, body))
}
