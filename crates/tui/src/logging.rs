//! File logging. The terminal belongs to the UI, so events go to a daily file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::BaseDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use providers::config_file::APP_DIR;

pub const LOG_FILE_PREFIX: &str = "equity-research.log";

pub fn log_dir() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(base.data_dir().join(APP_DIR).join("logs"))
}

/// Installs the global subscriber. Keep the guard alive until exit or buffered lines are lost.
pub fn init() -> Result<Option<WorkerGuard>> {
    let Some(dir) = log_dir() else {
        return Ok(None);
    };
    std::fs::create_dir_all(&dir).with_context(|| format!("create log dir: {}", dir.display()))?;
    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter);
    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(Some(guard))
}
