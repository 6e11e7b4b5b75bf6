//! Logging to stderr and a per-run file.
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Platform cache directory for server logs, `/tmp/dungeon/logs` as fallback.
pub fn default_log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "dungeon")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/dungeon"))
        .join("logs")
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer when dropped and must live
/// until the server exits.
pub fn setup_logging(log_dir: Option<&Path>) -> Result<WorkerGuard> {
    let base = log_dir.map(Path::to_path_buf).unwrap_or_else(default_log_dir);
    let run_dir = base.join(run_name());
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("creating log directory {}", run_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&run_dir, "server.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    tracing::info!(log_file = %run_dir.join("server.log").display(), "logging initialized");
    Ok(guard)
}

fn run_name() -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    format!("run_{seconds}")
}
