//! Tracing subscriber setup for the binary

use chrono::{DateTime, Local};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "sensor_fault=info";

/// One log file per run, named after its start time
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("{}.log", now.format("%m_%d_%Y_%H_%M_%S"))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber: stderr always, plus a non-blocking file
/// sink under `log_dir` when given. Keep the returned guard alive until
/// exit or buffered lines are lost.
pub fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter());

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::never(dir, log_file_name(Local::now()));
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(env_filter());

            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(stderr_layer).init();
            None
        }
    }
}
