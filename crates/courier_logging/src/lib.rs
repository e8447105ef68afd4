//! Shared logging utilities for the Courier agent.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "courier=info,courier_client=info";

/// Environment variable naming an optional directory for rolling log files.
pub const LOG_DIR_ENV: &str = "COURIER_LOG_DIR";

/// Logging configuration for Courier binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// When set, log lines are also written to a daily-rolling file here.
    pub log_dir: Option<PathBuf>,
}

impl<'a> LogConfig<'a> {
    /// Stdout-only logging, plus a file sink if `COURIER_LOG_DIR` is set.
    pub fn from_env(app_name: &'a str) -> Self {
        let log_dir = std::env::var(LOG_DIR_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        Self { app_name, log_dir }
    }
}

/// Initialize tracing with single-line stdout output and an optional rolling file.
///
/// The returned guard flushes the file writer on drop and must be held for the
/// lifetime of the process.
pub fn init_logging(config: LogConfig<'_>) -> Result<Option<WorkerGuard>> {
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(default_filter());

    let (file_layer, guard) = match config.log_dir {
        Some(dir) => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(&dir, log_file_name(config.app_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(default_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn log_file_name(app_name: &str) -> String {
    format!("{}.log", sanitize_name(app_name))
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}
