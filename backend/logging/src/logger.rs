//! Structured Logger
//!
//! Wraps `tracing` to provide console output (plain or JSON), an optional
//! daily-rolling NDJSON file and environment-based level control.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logger settings, usually taken from the `logging` config section.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit console logs as JSON lines.
    pub json: bool,
    /// Directory for `stardeck.log.YYYY-MM-DD` files; no file logging when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            dir: None,
        }
    }
}

/// Initialize the global structured logger. Later calls are no-ops.
pub fn init_logger(options: &LogOptions) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&options.level));

    let file_layer = options.dir.as_ref().map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "stardeck.log");
        fmt::layer().json().with_writer(file_appender).with_ansi(false)
    });

    let json_console = options
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let plain_console = (!options.json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(plain_console)
        .with(json_console)
        .with(file_layer)
        .try_init();
}
