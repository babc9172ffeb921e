//! Appender trait for log output destinations

use super::error::Result;

/// Destination for encoded records.
///
/// `line` is one complete record including its trailing newline. Appenders
/// are driven under the logger's lock, so an implementation never sees two
/// calls at once.
pub trait Appender: Send {
    fn append(&mut self, line: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
