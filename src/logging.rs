use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise logging. The default level is `info`; `debug` can be enabled
/// via the `debug_logging` config flag, in which case `RUST_LOG` may override
/// it.
///
/// When `file` is given log lines are also appended to that file through a
/// non-blocking writer. The returned guard flushes the file on drop and must
/// be kept alive for as long as logging is needed.
pub fn init(debug: bool, file: Option<PathBuf>) -> Option<WorkerGuard> {
    // Without debug logging the level is forced to `info` so a stray RUST_LOG
    // in the user's environment does not flood the log.
    let level = if debug { "debug" } else { "info" };
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let (file_layer, guard) = match file.as_ref().and_then(|p| open_log_file(p)) {
        Some(writer) => {
            let (nb, guard) = tracing_appender::non_blocking(writer);
            (
                Some(fmt::layer().with_ansi(false).with_writer(nb)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init();

    guard
}

/// The `debug_logging` flag straight from the config file, read before the
/// config store exists so its own load warnings reach the log. A missing or
/// unreadable file means `false`.
pub fn debug_flag(config_file: &Path) -> bool {
    std::fs::read_to_string(config_file)
        .ok()
        .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok())
        .and_then(|v| v.get("debug_logging").and_then(serde_json::Value::as_bool))
        .unwrap_or(false)
}

fn open_log_file(path: &PathBuf) -> Option<std::fs::File> {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("failed to create log directory {}: {e}", parent.display());
            return None;
        }
    }
    match std::fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => Some(f),
        Err(e) => {
            eprintln!("failed to open log file {}: {e}", path.display());
            None
        }
    }
}
