//! Building the process logger from configuration

use crate::appenders::{ConsoleAppender, RotatingFileAppender};
use crate::config::LoggingConfig;
use crate::core::{Appender, LevelHandle, LogLevel, Logger, Result};
use std::io::Write;

/// Build a logger and its level handle from `config`.
///
/// The level handle is the same one the logger reads on every call, so
/// writing to it changes filtering for this logger and all its clones.
/// Nothing global is touched: calling this twice yields two independent
/// loggers with independent thresholds.
///
/// An unrecognized `logging.level` falls back to `info`, and the fallback is
/// reported once on stderr rather than through the logger being built.
///
/// # Errors
///
/// Returns an error when `logging.filename` is set and the file or its
/// directory cannot be created.
///
/// # Example
///
/// ```
/// use monitor_runtime::{configure_logger, LoggingConfig, LogLevel};
///
/// let config = LoggingConfig::default().with_level("warn");
/// let (logger, level) = configure_logger(&config).unwrap();
///
/// assert!(!logger.enabled(LogLevel::Info));
/// level.set_level(LogLevel::Debug);
/// assert!(logger.enabled(LogLevel::Debug));
/// ```
pub fn configure_logger(config: &LoggingConfig) -> Result<(Logger, LevelHandle)> {
    let level = resolve_level_to(&config.level, &mut std::io::stderr());
    let handle = LevelHandle::new(level);

    let appender: Box<dyn Appender> = match &config.filename {
        Some(path) if !path.as_os_str().is_empty() => Box::new(RotatingFileAppender::with_policy(
            path,
            config.rotation_policy(),
        )?),
        _ => Box::new(ConsoleAppender::new()),
    };

    let logger = Logger::builder()
        .level_handle(handle.clone())
        .boxed_appender(appender)
        .build();

    Ok((logger, handle))
}

/// Parse the configured level, writing one warning line to `diagnostics`
/// when it has to fall back to `info`
fn resolve_level_to<W: Write>(raw: &str, diagnostics: &mut W) -> LogLevel {
    LogLevel::from_config(raw).unwrap_or_else(|e| {
        let _ = writeln!(diagnostics, "[LOGGER WARNING] {}. Defaulting to info", e);
        LogLevel::Info
    })
}
