//! Shared, atomically updated severity threshold
//!
//! Every [`Logger`](super::Logger) built from the same handle reads the
//! threshold on each call, so a write through any clone changes filtering for
//! all of them without rebuilding anything.

use super::error::Result;
use super::log_level::LogLevel;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Cloneable handle to the minimum severity a logger emits.
///
/// # Example
///
/// ```
/// use monitor_runtime::{LevelHandle, LogLevel};
///
/// let handle = LevelHandle::new(LogLevel::Warn);
/// let other = handle.clone();
///
/// other.set_level(LogLevel::Debug);
/// assert_eq!(handle.level(), LogLevel::Debug);
/// assert!(handle.enabled(LogLevel::Debug));
/// ```
#[derive(Clone)]
pub struct LevelHandle {
    level: Arc<AtomicU8>,
}

impl LevelHandle {
    #[must_use]
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: Arc::new(AtomicU8::new(level as u8)),
        }
    }

    /// Current threshold
    #[inline]
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Acquire))
    }

    /// Replace the threshold, returning the previous one
    pub fn set_level(&self, level: LogLevel) -> LogLevel {
        LogLevel::from_u8(self.level.swap(level as u8, Ordering::AcqRel))
    }

    /// Parse `name` and install it as the threshold.
    ///
    /// # Errors
    ///
    /// Leaves the threshold untouched and returns
    /// [`LoggerError::InvalidLevel`](super::LoggerError::InvalidLevel) when
    /// `name` is not a level.
    pub fn set_level_str(&self, name: &str) -> Result<LogLevel> {
        let level = name.parse()?;
        Ok(self.set_level(level))
    }

    /// Whether a record at `level` passes the threshold
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }
}

impl Default for LevelHandle {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

impl fmt::Debug for LevelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LevelHandle").field(&self.level()).finish()
    }
}
