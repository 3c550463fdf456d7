use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use ptydeck_config::constants::files;
use ptydeck_config::{DebugConfig, TraceLevel};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Where log lines go.
pub enum LogSink {
    Stderr,
    /// Interactive sessions own the terminal, so logs go to a file instead.
    File(PathBuf),
}

pub fn log_file_path(config: &DebugConfig) -> PathBuf {
    config
        .log_dir
        .clone()
        .or_else(|| dirs::data_local_dir().map(|dir| dir.join(files::CONFIG_DIR_NAME)))
        .unwrap_or_else(std::env::temp_dir)
        .join(files::LOG_FILE_NAME)
}

/// `RUST_LOG` wins; otherwise everything under `ptydeck` at the configured level.
pub fn initialize_tracing(
    config: &DebugConfig,
    level_override: Option<TraceLevel>,
    sink: LogSink,
) -> Result<()> {
    let level = level_override.unwrap_or(config.trace_level);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));

    let init_result = match sink {
        LogSink::Stderr => {
            let fmt_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
        LogSink::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory {}", parent.display())
                })?;
            }
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
    };

    if let Err(err) = init_result {
        tracing::warn!(error = %err, "tracing already initialized; skipping setup");
    }
    Ok(())
}
