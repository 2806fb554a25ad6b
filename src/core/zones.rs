// src/core/zones.rs
use crate::types::Zone;
use dashmap::DashMap;
use rust_decimal::Decimal;

/// Hysteresis step. Returns the new zone and whether entering it should alert.
///
/// Top and Bottom only fire when entered from a different zone, so a price that
/// sits near the high for many ticks alerts once. Leaving through Middle re-arms.
pub fn transition(price: Decimal, top: Decimal, bottom: Decimal, previous: Zone) -> (Zone, bool) {
    if price >= top {
        (Zone::Top, previous != Zone::Top)
    } else if price <= bottom {
        (Zone::Bottom, previous != Zone::Bottom)
    } else {
        (Zone::Middle, false)
    }
}

/// Per-asset zone memory. Owned by the engine; lives for the process only.
#[derive(Debug, Default)]
pub(crate) struct ZoneBook {
    zones: DashMap<String, Zone>,
}

impl ZoneBook {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Applies one observation and stores the resulting zone. Returns the zone
    /// when an alert should fire. The entry stays locked for the read-then-write.
    pub(crate) fn observe(
        &self,
        symbol: &str,
        price: Decimal,
        top: Decimal,
        bottom: Decimal,
    ) -> Option<Zone> {
        let mut slot = self
            .zones
            .entry(symbol.to_string())
            .or_insert(Zone::Middle);
        let (next, fire) = transition(price, top, bottom, *slot);
        *slot = next;
        fire.then_some(next)
    }

    #[cfg(test)]
    pub(crate) fn current(&self, symbol: &str) -> Option<Zone> {
        self.zones.get(symbol).map(|z| *z)
    }
}
