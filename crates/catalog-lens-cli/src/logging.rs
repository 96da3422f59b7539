use std::env;
use std::path::Path;
use tracing::debug;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/catalog-lens.log";

/// Install console and file logging. Keep the returned guard alive until
/// exit or buffered file output is lost.
///
/// Console output goes to stderr; stdout carries command results.
pub fn init_logger() -> WorkerGuard {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::new(filter);

    let log_file_path = env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let (non_blocking, guard) = file_writer(Path::new(&log_file_path));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter_layer)
        .init();

    debug!("Logging to stderr and {}", log_file_path);

    guard
}

/// Non-blocking writer appending to `path`. Buffered lines reach the file
/// when the guard drops.
pub fn file_writer(path: &Path) -> (NonBlocking, WorkerGuard) {
    let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "catalog-lens.log".into());

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    tracing_appender::non_blocking(file_appender)
}
