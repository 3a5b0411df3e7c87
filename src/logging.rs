//! Structured logging to `~/.claude/hookwarden/logs/hookwarden.{date}.log`.
//!
//! Daily rotation, 7 files kept. `RUST_LOG` overrides the default filter and
//! `HOOKWARDEN_LOG_DIR` moves the log directory.
//!
//! stdout and stderr carry the hook protocol, so logs never go there: if the
//! file appender cannot be created, events are discarded.

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_DIR_ENV: &str = "HOOKWARDEN_LOG_DIR";

const DEFAULT_FILTER: &str = "hookwarden=info";

pub fn log_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(LOG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|h| h.join(".claude").join("hookwarden").join("logs"))
        .unwrap_or_else(|| PathBuf::from(".claude/hookwarden/logs"))
}

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered events are flushed.
pub fn init() -> Option<WorkerGuard> {
    let dir = log_dir();
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match create_file_appender(&dir) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .try_init();
            Some(guard)
        }
        Err(_) => {
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::sink))
                .try_init();
            None
        }
    }
}

fn create_file_appender(dir: &Path) -> anyhow::Result<RollingFileAppender> {
    fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("hookwarden")
        .filename_suffix("log")
        .max_log_files(7)
        .build(dir)?;
    Ok(appender)
}
