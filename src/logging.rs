//! File logging for spectro.
//!
//! Everything goes to a daily rolling file under the XDG state directory; the
//! terminal belongs to the spectrogram, so nothing is printed there.

use anyhow::anyhow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Prefix of every log file; the appender adds `.YYYY-MM-DD`.
pub const LOG_FILE_PREFIX: &str = "spectro.log";

/// Days of logs kept on disk.
const MAX_LOG_FILES: usize = 7;

/// Keeps the non-blocking writer flushing until the process exits.
static APPENDER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the global subscriber writing to the rolling log file.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`.
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If logging was already initialized
pub fn init_logging() -> anyhow::Result<()> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    if let Err(e) = prune_old_logs(&log_dir) {
        eprintln!("Warning: Failed to clean up old logs: {e}");
    }

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&log_dir, LOG_FILE_PREFIX));
    APPENDER_GUARD
        .set(guard)
        .map_err(|_| anyhow!("Logging already initialized"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false),
        )
        .init();

    tracing::debug!("Logging to {}", log_dir.display());
    Ok(())
}

/// `$XDG_STATE_HOME/spectro`, falling back to `~/.local/state/spectro`.
///
/// # Errors
/// - If neither variable nor home directory is available
pub fn log_dir() -> anyhow::Result<PathBuf> {
    if let Ok(state) = std::env::var("XDG_STATE_HOME") {
        if !state.is_empty() {
            return Ok(PathBuf::from(state).join("spectro"));
        }
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(".local").join("state").join("spectro"))
}

/// Whether `file_name` is a dated log written by the rolling appender.
fn is_dated_log(file_name: &str) -> bool {
    file_name
        .strip_prefix(LOG_FILE_PREFIX)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|date| date.len() == 10 && date.matches('-').count() == 2)
}

/// Paths to delete so that only the `keep` most recently modified remain.
fn stale_logs(mut logs: Vec<(PathBuf, SystemTime)>, keep: usize) -> Vec<PathBuf> {
    logs.sort_by(|a, b| b.1.cmp(&a.1));
    logs.into_iter().skip(keep).map(|(path, _)| path).collect()
}

fn prune_old_logs(log_dir: &Path) -> anyhow::Result<()> {
    let logs = fs::read_dir(log_dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let name = path.file_name()?.to_str()?;
            if !is_dated_log(name) {
                return None;
            }
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .collect();

    for path in stale_logs(logs, MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(&path) {
            eprintln!("Warning: Failed to delete {}: {e}", path.display());
        }
    }
    Ok(())
}
