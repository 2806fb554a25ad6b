// src/logging.rs
use std::env;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_DIR_VAR: &str = "SENTINEL_LOG_DIR";

/// Installs the global subscriber: human-readable stdout, plus a daily-rolling
/// file when `SENTINEL_LOG_DIR` is set. Keep the guards alive until exit or
/// buffered lines are lost.
pub fn init_logging() -> Vec<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let mut guards = vec![stdout_guard];

    let file_layer = match env::var(LOG_DIR_VAR) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir.trim(), "sentinel.log");
            let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
            guards.push(file_guard);
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(file_writer),
            )
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(stdout_writer),
        )
        .with(file_layer)
        .init();

    guards
}
