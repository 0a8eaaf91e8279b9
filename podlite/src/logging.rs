//! Process-wide tracing setup.
//!
//! Logs go to stderr, filtered by `RUST_LOG` (falling back to
//! [`LogOptions::default_filter`]). With a log directory, a daily-rotated
//! file copy is written without ANSI colors.

use std::path::PathBuf;
use std::sync::OnceLock;

use podlite_shared::{PodliteError, PodliteResult};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_FILE_PREFIX: &str = "podlite.log";

/// Keeps the file writer flushing for the life of the process.
static LOG_GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Directive used when `RUST_LOG` is unset or invalid.
    pub default_filter: String,
    /// Directory for rotated log files. `None` logs to stderr only.
    pub log_dir: Option<PathBuf>,
    pub ansi: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            log_dir: None,
            ansi: true,
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(options: &LogOptions) -> PodliteResult<()> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_filter));

    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                PodliteError::Storage(format!(
                    "Failed to create log directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(options.ansi)
        .with_writer(std::io::stderr);

    // Fails only if another subscriber is already installed, e.g. by a test harness.
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    let _ = LOG_GUARD.set(guard);
    if installed {
        tracing::debug!(log_dir = ?options.log_dir, "Logging initialized");
    }
    Ok(())
}
