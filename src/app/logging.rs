use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::app::config::LoggingConfig;
use crate::error::{Error, Result};

const LOG_FILE_PREFIX: &str = "cardgen.log";

fn build_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(format!("cardgen={}", level))
        .map_err(|e| Error::configuration(format!("Invalid log level '{}': {}", level, e)))
}

/// Installs the global subscriber: stderr plus an optional daily-rolling
/// file under `logs_dir`. Keep the returned guard alive until exit so the
/// file writer flushes.
pub fn init_logging(config: &LoggingConfig, logs_dir: Option<&Path>, debug: bool) -> Result<Option<WorkerGuard>> {
    let filter = if debug {
        build_filter("debug")?
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => build_filter(&config.level)?,
        }
    };

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match logs_dir.filter(|_| config.file_logging) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}
