//! File logging for the chat client
//!
//! Logs go to `<data dir>/logs/math-buddy.log` so the terminal stays
//! readable. Falls back to stderr (warnings only) when the file can't be opened.

use config::PathManager;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "info,tutor_core=debug,cli=debug";

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered lines are flushed.
pub fn init_logging() -> Option<WorkerGuard> {
    let Some(path) = PathManager::log_file_path() else {
        init_stderr_logging();
        return None;
    };

    if let Some(parent) = path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        eprintln!("[math-buddy] Failed to create log directory {:?}: {}", parent, e);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path);

    match file {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

            let installed = tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .try_init();

            match installed {
                Ok(()) => {
                    tracing::info!("Logging initialized, writing to {:?}", path);
                    Some(guard)
                }
                Err(e) => {
                    eprintln!("[math-buddy] Failed to set tracing subscriber: {}", e);
                    None
                }
            }
        }
        Err(e) => {
            eprintln!("[math-buddy] Failed to open log file {:?}: {}", path, e);
            init_stderr_logging();
            None
        }
    }
}

fn init_stderr_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("warn"))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
