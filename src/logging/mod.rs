//! Application logging
//!
//! Installs the global `tracing` subscriber. Logs always go to stderr so
//! that command output on stdout stays machine readable; optionally they
//! are also written to a dated file under ~/.config/bubblekern/logs/.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when RUST_LOG is not set
const DEFAULT_FILTER: &str = "info";

/// Where log output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    #[default]
    Stderr,
    StderrAndFile,
}

/// Get the path to the bubblekern config directory
pub fn config_dir() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
    config_dir.join("bubblekern")
}

/// Get the path to the logs directory
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// File name of today's log
pub fn current_log_file_name() -> String {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d");
    format!("bubblekern-{}.log", timestamp)
}

/// Install the global subscriber.
///
/// The returned guard flushes the log file when dropped and must be kept
/// alive for as long as logging to file is wanted.
pub fn init(target: LogTarget) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match target {
        LogTarget::Stderr => (None, None),
        LogTarget::StderrAndFile => {
            let dir = logs_dir();
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(&dir, current_log_file_name());
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install the log subscriber")?;

    if guard.is_some() {
        tracing::info!(
            "=== bubblekern started at {} ===",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(guard)
}
