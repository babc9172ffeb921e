//! JSON line encoding for log records
//!
//! Every record becomes one JSON object on one line: timestamp, level and
//! message under configurable keys, followed by the context fields in the
//! order they were added.

use super::error::Result;
use super::log_entry::LogEntry;
use super::timestamp::TimestampFormat;

/// Key names and timestamp encoding used by [`JsonEncoder`]
///
/// # Examples
///
/// ```
/// use monitor_runtime::{EncoderConfig, TimestampFormat};
///
/// let config = EncoderConfig::new()
///     .with_time_key("time")
///     .with_timestamp_format(TimestampFormat::Iso8601);
/// assert_eq!(config.message_key, "msg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub time_key: String,
    pub level_key: String,
    pub message_key: String,
    pub timestamp_format: TimestampFormat,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            time_key: "ts".to_string(),
            level_key: "level".to_string(),
            message_key: "msg".to_string(),
            timestamp_format: TimestampFormat::default(),
        }
    }
}

impl EncoderConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_time_key(mut self, key: impl Into<String>) -> Self {
        self.time_key = key.into();
        self
    }

    #[must_use]
    pub fn with_level_key(mut self, key: impl Into<String>) -> Self {
        self.level_key = key.into();
        self
    }

    #[must_use]
    pub fn with_message_key(mut self, key: impl Into<String>) -> Self {
        self.message_key = key.into();
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    config: EncoderConfig,
}

impl JsonEncoder {
    #[must_use]
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode `entry` as a single JSON line, including the trailing newline.
    ///
    /// Context fields never overwrite the reserved keys.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Json`](super::LoggerError::Json) if
    /// serialization fails.
    pub fn encode(&self, entry: &LogEntry) -> Result<String> {
        let mut object = serde_json::Map::with_capacity(3 + entry.context.len());

        object.insert(
            self.config.level_key.clone(),
            serde_json::Value::String(entry.level.as_str().to_string()),
        );
        object.insert(
            self.config.time_key.clone(),
            self.config.timestamp_format.to_json(&entry.timestamp),
        );
        object.insert(
            self.config.message_key.clone(),
            serde_json::Value::String(entry.message.clone()),
        );

        for (key, value) in entry.context.iter() {
            if self.is_reserved(key) {
                continue;
            }
            object.insert(key.to_string(), value.to_json_value());
        }

        let mut line = serde_json::to_string(&serde_json::Value::Object(object))?;
        line.push('\n');
        Ok(line)
    }

    fn is_reserved(&self, key: &str) -> bool {
        key == self.config.time_key || key == self.config.level_key || key == self.config.message_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogContext, LogLevel};
    use chrono::{TimeZone, Utc};

    fn entry() -> LogEntry {
        LogEntry::new(LogLevel::Warn, "consumer lagging")
            .with_timestamp(Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap())
            .with_context(
                LogContext::new()
                    .with_field("cluster", "east")
                    .with_field("lag", 42),
            )
    }

    #[test]
    fn test_encode_single_line() {
        let line = JsonEncoder::default().encode(&entry()).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed["level"], "warn");
        assert_eq!(parsed["msg"], "consumer lagging");
        assert_eq!(parsed["cluster"], "east");
        assert_eq!(parsed["lag"], 42);
        assert!(parsed["ts"].is_f64());
    }

    #[test]
    fn test_newlines_in_message_stay_escaped() {
        let entry = LogEntry::new(LogLevel::Info, "line one\nline two");
        let line = JsonEncoder::default().encode(&entry).unwrap();
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.contains("line one\\nline two"));
    }

    #[test]
    fn test_reserved_keys_not_overwritten() {
        let entry = LogEntry::new(LogLevel::Info, "real")
            .with_context(LogContext::new().with_field("msg", "fake"));
        let line = JsonEncoder::default().encode(&entry).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["msg"], "real");
    }

    #[test]
    fn test_custom_keys() {
        let encoder = JsonEncoder::new(
            EncoderConfig::new()
                .with_time_key("time")
                .with_level_key("severity")
                .with_message_key("message")
                .with_timestamp_format(TimestampFormat::Iso8601),
        );
        let line = encoder.encode(&entry()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["severity"], "warn");
        assert_eq!(parsed["message"], "consumer lagging");
        assert_eq!(parsed["time"], "2025-01-08T10:30:45.000Z");
    }
}
