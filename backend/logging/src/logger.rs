//! Structured Logger
//!
//! Wraps `tracing` to provide text or JSON console output, optional daily
//! file rotation (NDJSON), and environment-based level control.

use qmark_config::{LogConfig, LogFormat};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global structured logger.
///
/// `RUST_LOG` overrides `config.level`. Calling this twice is a no-op.
pub fn init_logger(config: &LogConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (text_layer, json_layer) = match config.format {
        LogFormat::Pretty => (
            Some(fmt::layer().with_writer(std::io::stdout).with_target(false)),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(fmt::layer().json().with_writer(std::io::stdout)),
        ),
    };

    // Rolling file appender: writes NDJSON to `<dir>/qmark.log.YYYY-MM-DD`
    let file_layer = config.dir.as_ref().map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "qmark.log");
        fmt::layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init();
}
