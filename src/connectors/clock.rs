// src/connectors/clock.rs
use crate::connectors::traits::Clock;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Wall clock converted into a fixed zone, independent of the host's local zone.
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}

/// Always reports the same instant.
pub struct FixedClock {
    at: DateTime<Tz>,
}

impl FixedClock {
    pub fn new(at: DateTime<Tz>) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        self.at
    }
}
