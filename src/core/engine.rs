// src/core/engine.rs
use crate::config::{AssetConfig, Settings, Thresholds};
use crate::core::zones::ZoneBook;
use crate::types::{AlertFragment, AlertKind, BalanceSnapshot, PriceSnapshot, Zone};
use crate::utils::precision::{currency_sign, is_negligible, round_to};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Ranges narrower than this (in quote currency) carry no signal.
const RANGE_FLOOR: Decimal = Decimal::from_parts(1, 0, 0, false, 3); // 0.001
const DEGENERATE_BASE: Decimal = Decimal::from_parts(1, 0, 0, false, 9); // 1e-9
const TOP_FRACTION: Decimal = Decimal::from_parts(9, 0, 0, false, 1); // 0.9
const BOTTOM_FRACTION: Decimal = Decimal::from_parts(1, 0, 0, false, 1); // 0.1

/// Runs the rule battery for one asset snapshot.
///
/// The engine does not look at the clock; callers check the trading window
/// first. Zone memory is the only state and is never exposed.
pub struct AlertEngine {
    thresholds: Thresholds,
    funding_symbol: String,
    currency: String,
    zones: ZoneBook,
}

impl AlertEngine {
    pub fn new(thresholds: Thresholds, funding_symbol: &str, quote_currency: &str) -> Self {
        Self {
            thresholds,
            funding_symbol: funding_symbol.to_string(),
            currency: currency_sign(quote_currency),
            zones: ZoneBook::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.thresholds.clone(),
            &settings.funding.symbol,
            &settings.quote_currency,
        )
    }

    /// Returns the fragments that fired this tick, in rule order.
    /// A non-positive price yields nothing and leaves zone memory untouched.
    pub fn evaluate(
        &self,
        asset: &AssetConfig,
        snapshot: &PriceSnapshot,
        balances: &BalanceSnapshot,
    ) -> Vec<AlertFragment> {
        let price = snapshot.price;
        if price <= Decimal::ZERO {
            warn!(symbol = %asset.symbol, %price, "Skipping evaluation: unusable price");
            return Vec::new();
        }

        let held = balances.get(&asset.symbol);
        let funding = balances.get(&self.funding_symbol);

        let mut fragments = Vec::new();
        fragments.extend(self.price_surge(asset, snapshot));
        fragments.extend(self.price_drop(asset, snapshot));
        fragments.extend(self.profit_target(asset, price, held));
        if self.thresholds.zone_alerts {
            fragments.extend(self.range_position(asset, snapshot));
        }
        fragments.extend(self.buy(asset, price, funding));
        fragments.extend(self.sell(asset, price, held));

        debug!(
            symbol = %asset.symbol,
            %price,
            fired = fragments.len(),
            "Rules evaluated"
        );
        fragments
    }

    fn price_surge(&self, asset: &AssetConfig, s: &PriceSnapshot) -> Option<AlertFragment> {
        (s.change_3h >= self.thresholds.surge_percent).then(|| {
            AlertFragment::new(
                AlertKind::Surge,
                format!(
                    "⬆️ *{}* is up {:.2}% in 3h! Current: {}{:.2}",
                    asset.symbol, s.change_3h, self.currency, s.price
                ),
            )
        })
    }

    fn price_drop(&self, asset: &AssetConfig, s: &PriceSnapshot) -> Option<AlertFragment> {
        (s.change_3h <= -self.thresholds.drop_percent).then(|| {
            AlertFragment::new(
                AlertKind::Drop,
                format!(
                    "⬇️ *{}* down {:.2}% in 3h! Current: {}{:.2}",
                    asset.symbol,
                    s.change_3h.abs(),
                    self.currency,
                    s.price
                ),
            )
        })
    }

    fn profit_target(
        &self,
        asset: &AssetConfig,
        price: Decimal,
        held: Decimal,
    ) -> Option<AlertFragment> {
        let entry = asset.entry_price.filter(|e| *e > Decimal::ZERO)?;
        let target = entry.checked_mul(Decimal::ONE + self.thresholds.target_profit_fraction)?;
        if price < target {
            return None;
        }

        // Fires without a position too: the reference price was reached.
        let c = &self.currency;
        let gain = match (price - entry).checked_mul(held) {
            Some(g) => format!("+{c}{g:.2}"),
            None => "+n/a".to_string(),
        };
        let gain_pct = percent_change(entry, price);
        Some(AlertFragment::new(
            AlertKind::ProfitTarget,
            format!(
                "🎯 Profit Target Hit: {gain} (+{gain_pct}%)\n\
                 Token: {sym}\n\
                 Holding: {held}\n\
                 Price: {c}{entry} → {c}{price:.2}\n\
                 ✅ Consider Booking",
                sym = asset.symbol,
            ),
        ))
    }

    fn range_position(&self, asset: &AssetConfig, s: &PriceSnapshot) -> Option<AlertFragment> {
        let price = s.price;
        let base = Decimal::ONE + s.change_24h / Decimal::ONE_HUNDRED;
        // A 24h change at or below -100% leaves no meaningful starting price.
        let price_then = if base <= Decimal::ZERO || is_negligible(base, DEGENERATE_BASE) {
            price
        } else {
            price.checked_div(base).unwrap_or(price)
        };

        let hi = price.max(price_then);
        let lo = price.min(price_then);
        let range = hi - lo;
        if range < RANGE_FLOOR {
            return None;
        }

        let top = lo + TOP_FRACTION * range;
        let bottom = lo + BOTTOM_FRACTION * range;
        let zone = self.zones.observe(&asset.symbol, price, top, bottom)?;

        let c = &self.currency;
        let (kind, text) = match zone {
            Zone::Top => (
                AlertKind::NearTop,
                format!(
                    "📈 *{}* near its 24h high: {c}{price:.2} (range {c}{lo:.2} - {c}{hi:.2})",
                    asset.symbol
                ),
            ),
            Zone::Bottom => (
                AlertKind::NearBottom,
                format!(
                    "📉 *{}* near its 24h low: {c}{price:.2} (range {c}{lo:.2} - {c}{hi:.2})",
                    asset.symbol
                ),
            ),
            Zone::Middle => return None,
        };
        Some(AlertFragment::new(kind, text))
    }

    fn buy(&self, asset: &AssetConfig, price: Decimal, funding: Decimal) -> Option<AlertFragment> {
        let buy_price = asset.buy_price?;
        let min_funding = asset.min_funding_balance;
        // A zero minimum means the rule is not configured.
        if price > buy_price || min_funding <= Decimal::ZERO || funding < min_funding {
            return None;
        }

        let qty = round_to(min_funding / price, 2);
        let c = &self.currency;
        let next_sell = match asset.sell_price {
            Some(sp) => format!("≥ {c}{sp}"),
            None => "not set".to_string(),
        };
        Some(AlertFragment::new(
            AlertKind::Buy,
            format!(
                "🟢 Buy Alert: {sym} at {c}{price:.3}\n\
                 Target: Buy ~{qty} {sym} using {min_funding} {fund}\n\
                 Next Sell Target: {next_sell}\n\
                 ➡️ Suggested Swap: {min_funding} {fund} → {sym}",
                sym = asset.symbol,
                fund = self.funding_symbol,
            ),
        ))
    }

    fn sell(&self, asset: &AssetConfig, price: Decimal, held: Decimal) -> Option<AlertFragment> {
        let sell_price = asset.sell_price?;
        let min_holding = asset.min_holding_balance;
        if price < sell_price || min_holding <= Decimal::ZERO || held < min_holding {
            return None;
        }

        let c = &self.currency;
        let total = match held.checked_mul(price) {
            Some(t) => format!("{c}{t:.2}"),
            None => "n/a".to_string(),
        };
        let profit = match asset.buy_price.filter(|bp| *bp > Decimal::ZERO) {
            Some(bp) => format!("🎯 ~{}%", percent_change(bp, price)),
            None => "n/a (no buy price)".to_string(),
        };
        Some(AlertFragment::new(
            AlertKind::Sell,
            format!(
                "🔴 Sell Alert: {sym} at {c}{price:.3}\n\
                 Holding: {held} ≈ {total}\n\
                 Profit Zone: {profit}\n\
                 ➡️ Suggested Swap: {held} {sym} → {fund}",
                sym = asset.symbol,
                fund = self.funding_symbol,
            ),
        ))
    }

    #[cfg(test)]
    pub(crate) fn zone_of(&self, symbol: &str) -> Option<Zone> {
        self.zones.current(symbol)
    }
}

/// Percent move from `from` to `to`, one decimal place. `from` must be positive.
fn percent_change(from: Decimal, to: Decimal) -> String {
    (to - from)
        .checked_div(from)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| format!("{pct:.1}"))
        .unwrap_or_else(|| "n/a".to_string())
}
