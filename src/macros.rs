//! Logging macros
//!
//! Two shapes are accepted: `println!`-style formatting, or a fixed message
//! followed by `;` and `key => value` fields.
//!
//! ```
//! use monitor_runtime::prelude::*;
//! use monitor_runtime::info;
//!
//! let logger = Logger::disabled();
//!
//! let port = 8080;
//! info!(logger, "listening on port {}", port);
//! info!(logger, "listening"; "port" => port, "tls" => false);
//! ```

/// Log at an explicit level.
///
/// ```
/// # use monitor_runtime::prelude::*;
/// # let logger = Logger::disabled();
/// use monitor_runtime::log;
/// log!(logger, LogLevel::Info, "simple message");
/// log!(logger, LogLevel::Error, "status {}", 500);
/// log!(logger, LogLevel::Warn, "slow request"; "elapsed_ms" => 1200u64);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $msg:expr; $($key:expr => $value:expr),+ $(,)?) => {{
        let level = $level;
        if $logger.enabled(level) {
            let context = $crate::LogContext::new()$(.with_field($key, $value))+;
            $logger.log_with_context(level, $msg, context);
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let level = $level;
        if $logger.enabled(level) {
            $logger.log(level, format!($($arg)+));
        }
    }};
}

/// Log at debug level
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log at info level
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log at warn level
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log at error level
///
/// ```
/// # use monitor_runtime::prelude::*;
/// # let logger = Logger::disabled();
/// use monitor_runtime::error;
/// error!(logger, "store unavailable");
/// error!(logger, "store unavailable"; "attempt" => 3, "store" => "primary");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}
