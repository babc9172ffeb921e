//! # Monitor Runtime
//!
//! Runtime plumbing for the monitoring service: a dispatcher that hands
//! requests to worker channels within a time budget, and the structured
//! logger everything else writes through.
//!
//! ## Features
//!
//! - **Bounded dispatch**: a request is delivered once or handed back, never lost
//! - **Runtime levels**: one atomic threshold shared by a logger and its clones
//! - **Rotating files**: size-based rotation with age/count pruning and gzip
//! - **Layered config**: defaults, TOML file, then `MONITOR_` environment variables
//!
//! ```
//! use monitor_runtime::{configure_logger, Dispatcher, LoggingConfig};
//! use crossbeam_channel::bounded;
//!
//! let (logger, _level) = configure_logger(&LoggingConfig::default().with_level("error")).unwrap();
//! let dispatcher = Dispatcher::new(logger);
//!
//! let (tx, rx) = bounded(1);
//! assert!(dispatcher.send(&tx, "job", 1).is_ok());
//! assert_eq!(rx.recv().unwrap(), "job");
//! ```

pub mod appenders;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod logging;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, RotatingFileAppender, RotationPolicy};
    pub use crate::config::{LoggingConfig, Settings};
    pub use crate::core::{
        Appender, EncoderConfig, FieldValue, LevelHandle, LogContext, LogEntry, LogLevel, Logger,
        LoggerBuilder, LoggerError, LoggerMetrics, Result, TimestampFormat,
    };
    pub use crate::dispatch::{DispatchResult, Dispatcher, Undelivered};
    pub use crate::logging::configure_logger;
}

pub use appenders::{ConsoleAppender, RotatingFileAppender, RotationPolicy};
pub use config::{LoggingConfig, Settings};
pub use core::{
    Appender, EncoderConfig, FieldValue, LevelHandle, LogContext, LogEntry, LogLevel, Logger,
    LoggerBuilder, LoggerError, LoggerMetrics, Result, TimestampFormat,
};
pub use dispatch::{DispatchResult, Dispatcher, Undelivered};
pub use logging::configure_logger;
