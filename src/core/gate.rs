// src/core/gate.rs
use chrono::{Datelike, Timelike, Weekday};
use chrono_tz::Tz;
use std::collections::HashSet;

/// Days and hours during which evaluation runs, in the configured zone.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingWindow {
    days: HashSet<Weekday>,
    start_hour: u32,
    end_hour: u32,
    tz: Tz,
}

impl TradingWindow {
    pub fn new(days: HashSet<Weekday>, start_hour: u32, end_hour: u32, tz: Tz) -> Self {
        Self {
            days,
            start_hour,
            end_hour,
            tz,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// `now` must already be in `self.timezone()`. An empty day set never allows.
    pub fn allows<T: Datelike + Timelike>(&self, now: &T) -> bool {
        self.days.contains(&now.weekday())
            && (self.start_hour..self.end_hour).contains(&now.hour())
    }
}
