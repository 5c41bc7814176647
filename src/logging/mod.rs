//! Logging setup: stdout tracing plus the append-only run log file.
//!
//! Every line is prefixed with an ISO-8601 timestamp in KST, matching the
//! timezone all scheduling decisions are made in. The file layer is
//! best-effort: if the log file cannot be opened the run proceeds with
//! stdout logging only.

use crate::cli::TracingFormat;
use crate::config::Config;
use chrono_tz::Asia::Seoul;
use std::fs::{self, File, OpenOptions};
use std::sync::Arc;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Millisecond-precision ISO-8601 timestamps with the fixed `+09:00` offset.
struct KstTime;

impl FormatTime for KstTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now().with_timezone(&Seoul);
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Configure and initialize logging for the run.
///
/// Returns whether the file log was attached, so the caller can warn once
/// after the subscriber is live.
pub fn setup_logging(config: &Config, tracing_format: TracingFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let base_level = &config.log_level;
        EnvFilter::new(format!("warn,yeyak={base_level}"))
    });

    let log_file = open_log_file(config);
    let file_attached = log_file.is_some();
    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_timer(KstTime)
    });

    match tracing_format {
        TracingFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_timer(KstTime),
                )
                .init();
        }
        TracingFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(file_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(KstTime),
                )
                .init();
        }
    }

    file_attached
}

/// Open the run log in append mode, creating `logs/` if needed.
fn open_log_file(config: &Config) -> Option<File> {
    let path = config.log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().append(true).create(true).open(path).ok()
}
