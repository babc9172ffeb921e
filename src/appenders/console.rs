//! Console appender implementation

use crate::core::{Appender, Result};
use std::io::Write;

/// Writes records to standard output, holding the stream lock for the whole
/// record so lines from concurrent writers do not interleave mid-record.
#[derive(Debug, Default)]
pub struct ConsoleAppender;

impl ConsoleAppender {
    pub fn new() -> Self {
        Self
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, line: &str) -> Result<()> {
        std::io::stdout().lock().write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
