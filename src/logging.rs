use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "show_pricing.log";
const DEFAULT_FILTER: &str = "show_pricing=info,warn";

/// Console logging on stderr plus a daily-rotated JSON file under `logs/`.
/// `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    init_logging_in(LOG_DIR);
}

pub fn init_logging_in(dir: &str) {
    let _ = fs::create_dir_all(dir);

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE));
    let file_layer = fmt::layer().json().with_writer(file_writer);

    // stdout carries exported JSON and pricing text
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    if installed.is_ok() {
        // The writer thread must outlive main.
        std::mem::forget(guard);
    }
}
