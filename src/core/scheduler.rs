// src/core/scheduler.rs
use crate::config::Settings;
use crate::types::TickReport;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

#[async_trait]
pub trait TickRunner: Send + Sync {
    async fn run_tick(&self) -> Result<TickReport>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    CoolingDown,
}

/// Fixed-interval driver. A failed tick is followed by one cooldown wait
/// instead of the normal interval; the loop only ends on shutdown.
pub struct Scheduler {
    interval: Duration,
    cooldown: Duration,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(interval: Duration, cooldown: Duration) -> Self {
        Self {
            interval,
            cooldown,
            state: SchedulerState::Running,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.check_interval, settings.cooldown())
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Runs ticks until `shutdown` flips to true or its sender is dropped.
    /// The first tick starts immediately.
    pub async fn run<R>(&mut self, runner: &R, mut shutdown: watch::Receiver<bool>)
    where
        R: TickRunner + ?Sized,
    {
        info!(
            interval_secs = self.interval.as_secs(),
            cooldown_secs = self.cooldown.as_secs(),
            "Scheduler running"
        );

        while !*shutdown.borrow() {
            let delay = match runner.run_tick().await {
                Ok(report) => {
                    if self.state == SchedulerState::CoolingDown {
                        info!("Tick succeeded, leaving cooldown");
                    }
                    self.state = SchedulerState::Running;
                    debug!(?report, "Tick finished");
                    self.interval
                }
                Err(e) => {
                    error!(
                        error = %e,
                        cooldown_secs = self.cooldown.as_secs(),
                        "Unhandled tick error, cooling down"
                    );
                    self.state = SchedulerState::CoolingDown;
                    self.cooldown
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }
}
