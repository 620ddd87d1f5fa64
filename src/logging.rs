//! File logging through tracing.
//!
//! Records go to `chladni.log.YYYY-MM-DD` under the XDG state directory,
//! never to the terminal the plate is drawn on. Startup prunes rotated files
//! down to the newest week.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Base name of the daily log files.
pub const LOG_FILE_PREFIX: &str = "chladni.log";

/// Rotated log files kept on disk.
const MAX_LOG_FILES: usize = 7;

/// Used when RUST_LOG is unset or does not parse. Audio and terminal crates
/// only report warnings.
const DEFAULT_FILTER: &str = "warn,chladni=info";

/// Starts writing logs to the daily rolling file.
///
/// Log records are flushed by a background worker for as long as the
/// returned guard lives, so the caller holds it until exit.
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If the log file cannot be opened
/// - If a global subscriber is already installed
pub fn init_logging() -> anyhow::Result<WorkerGuard> {
    let log_dir = get_log_dir()?;

    if let Err(e) = cleanup_old_logs(&log_dir) {
        eprintln!("Warning: Failed to cleanup old logs: {e}");
    }

    let appender = Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(&log_dir)
        .with_context(|| format!("Failed to open log file in {}", log_dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_thread_ids(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(build_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with(file_layer)
        .try_init()
        .context("Logging already initialized")?;

    tracing::debug!("Logging to {}", log_dir.display());
    Ok(guard)
}

fn build_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Resolves the log directory, following XDG Base Directory Specification.
///
/// Prefers XDG_STATE_HOME if set, otherwise uses ~/.local/state/chladni.
///
/// # Errors
/// - If home directory cannot be determined
pub fn log_dir() -> Result<PathBuf, anyhow::Error> {
    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg_state).join("chladni"));
    }
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".local/state/chladni"))
}

/// Resolves and creates the log directory.
fn get_log_dir() -> Result<PathBuf, anyhow::Error> {
    let log_dir = log_dir()?;
    std::fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

/// Deletes all but the newest [`MAX_LOG_FILES`] rotated logs.
///
/// Rotated names end in an ISO date, so name order is age order.
///
/// # Errors
/// - If the log directory cannot be read
fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<()> {
    let mut rotated: Vec<PathBuf> = fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(is_rotated_log)
        })
        .collect();
    rotated.sort_unstable_by(|a, b| b.cmp(a));

    for path in rotated.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to delete old log file {}: {}", path.display(), e);
        }
    }

    Ok(())
}

/// Matches rotated files named `chladni.log.YYYY-MM-DD`.
fn is_rotated_log(file_name: &str) -> bool {
    file_name
        .strip_prefix(LOG_FILE_PREFIX)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|date| date.len() == 10 && date.matches('-').count() == 2)
}
