//! Main logger implementation

use super::{
    appender::Appender,
    encoder::{EncoderConfig, JsonEncoder},
    error::Result,
    level_handle::LevelHandle,
    log_context::{FieldValue, LogContext},
    log_entry::LogEntry,
    log_level::LogLevel,
    metrics::LoggerMetrics,
    timestamp::TimestampFormat,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

struct Shared {
    level: LevelHandle,
    appenders: Mutex<Vec<Box<dyn Appender>>>,
    encoder: JsonEncoder,
    metrics: LoggerMetrics,
}

/// Cloneable handle to a structured logger.
///
/// Clones and children created with [`Logger::with_fields`] share the same
/// level threshold, appenders and metrics. Writes are synchronous: when a
/// logging call returns, the record has been handed to every appender.
///
/// # Example
///
/// ```
/// use monitor_runtime::prelude::*;
///
/// let logger = Logger::builder().level(LogLevel::Warn).build();
/// let level = logger.level_handle();
///
/// logger.info("suppressed");
/// level.set_level(LogLevel::Debug);
/// logger.debug("now emitted");
/// ```
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    fields: Arc<LogContext>,
}

impl Logger {
    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// A logger that filters at `Info` and writes nowhere
    #[must_use]
    pub fn disabled() -> Self {
        LoggerBuilder::new().build()
    }

    /// Handle to the threshold shared by this logger and all its clones
    pub fn level_handle(&self) -> LevelHandle {
        self.shared.level.clone()
    }

    pub fn level(&self) -> LogLevel {
        self.shared.level.level()
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.shared.level.enabled(level)
    }

    /// Child logger that adds `fields` to every record it writes
    #[must_use]
    pub fn with_fields(&self, fields: LogContext) -> Logger {
        Logger {
            shared: Arc::clone(&self.shared),
            fields: Arc::new(self.fields.merged(&fields)),
        }
    }

    /// Child logger with a single extra field
    #[must_use]
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<FieldValue>) -> Logger {
        self.with_fields(LogContext::new().with_field(key, value))
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.log_with_context(level, message, LogContext::new());
    }

    /// Log with structured context fields
    pub fn log_with_context(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        context: LogContext,
    ) {
        if !self.enabled(level) {
            return;
        }

        let context = if self.fields.is_empty() {
            context
        } else {
            self.fields.merged(&context)
        };
        let entry = LogEntry::new(level, message).with_context(context);
        self.write_entry(&entry);
    }

    fn write_entry(&self, entry: &LogEntry) {
        let line = match self.shared.encoder.encode(entry) {
            Ok(line) => line,
            Err(e) => {
                eprintln!("[LOGGER ERROR] Failed to encode record: {}", e);
                self.shared.metrics.record_failure();
                return;
            }
        };

        let mut appenders = self.shared.appenders.lock();
        let mut has_error = false;

        for appender in appenders.iter_mut() {
            if let Err(e) = appender.append(&line) {
                eprintln!("[LOGGER ERROR] Appender '{}' failed: {}", appender.name(), e);
                has_error = true;
            }
            // Severe records must not sit in a buffer if the process dies next.
            if entry.level >= LogLevel::Error {
                if let Err(e) = appender.flush() {
                    eprintln!("[LOGGER ERROR] Appender '{}' flush failed: {}", appender.name(), e);
                    has_error = true;
                }
            }
        }

        if has_error {
            self.shared.metrics.record_failure();
        } else {
            self.shared.metrics.record_written();
        }
    }

    pub fn flush(&self) -> Result<()> {
        let mut appenders = self.shared.appenders.lock();
        for appender in appenders.iter_mut() {
            appender.flush()?;
        }
        Ok(())
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn debug_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Debug, message, context);
    }

    pub fn info_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Info, message, context);
    }

    pub fn warn_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Warn, message, context);
    }

    pub fn error_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Error, message, context);
    }

    /// Write the record, then panic with `message`.
    ///
    /// The panic happens even when the threshold suppresses the record.
    pub fn panic(&self, message: impl Into<String>) -> ! {
        let message = message.into();
        self.log(LogLevel::Panic, message.clone());
        panic!("{}", message);
    }

    /// Write the record, flush every appender and exit with status 1.
    pub fn fatal(&self, message: impl Into<String>) -> ! {
        self.log(LogLevel::Fatal, message);
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush before exit: {}", e);
        }
        std::process::exit(1);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("appenders", &self.shared.appenders.lock().len())
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use monitor_runtime::prelude::*;
///
/// let logger = Logger::builder()
///     .level(LogLevel::Debug)
///     .appender(ConsoleAppender::new())
///     .timestamp_format(TimestampFormat::Iso8601)
///     .field("service", "lag-monitor")
///     .build();
/// ```
pub struct LoggerBuilder {
    level: LogLevel,
    level_handle: Option<LevelHandle>,
    appenders: Vec<Box<dyn Appender>>,
    encoder_config: EncoderConfig,
    fields: LogContext,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            level: LogLevel::Info,
            level_handle: None,
            appenders: Vec::new(),
            encoder_config: EncoderConfig::default(),
            fields: LogContext::new(),
        }
    }

    /// Initial threshold. Ignored when [`level_handle`](Self::level_handle) is set.
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Share an existing threshold instead of creating a new one
    #[must_use = "builder methods return a new value"]
    pub fn level_handle(mut self, handle: LevelHandle) -> Self {
        self.level_handle = Some(handle);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn boxed_appender(mut self, appender: Box<dyn Appender>) -> Self {
        self.appenders.push(appender);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn encoder_config(mut self, config: EncoderConfig) -> Self {
        self.encoder_config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.encoder_config.timestamp_format = format;
        self
    }

    /// Field attached to every record of the built logger
    #[must_use = "builder methods return a new value"]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.add_field(key, value);
        self
    }

    pub fn build(self) -> Logger {
        let level = self
            .level_handle
            .unwrap_or_else(|| LevelHandle::new(self.level));

        Logger {
            shared: Arc::new(Shared {
                level,
                appenders: Mutex::new(self.appenders),
                encoder: JsonEncoder::new(self.encoder_config),
                metrics: LoggerMetrics::new(),
            }),
            fields: Arc::new(self.fields),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
