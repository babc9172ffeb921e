//! Timestamp encodings for the `ts` field of a record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the record timestamp is written.
///
/// Numeric variants produce JSON numbers, the rest produce strings.
///
/// # Examples
///
/// ```
/// use monitor_runtime::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(TimestampFormat::EpochMillis.to_json(&at), serde_json::json!(1736332245000i64));
/// assert_eq!(TimestampFormat::Iso8601.to_json(&at), serde_json::json!("2025-01-08T10:30:45.000Z"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampFormat {
    /// Fractional seconds since the Unix epoch: `1736332245.123456`
    #[default]
    EpochSeconds,

    /// Whole milliseconds since the Unix epoch: `1736332245123`
    EpochMillis,

    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// RFC 3339 with offset: `2025-01-08T10:30:45.123456+00:00`
    Rfc3339,
}

impl TimestampFormat {
    #[must_use]
    pub fn to_json(&self, datetime: &DateTime<Utc>) -> serde_json::Value {
        match self {
            TimestampFormat::EpochSeconds => {
                let secs = datetime.timestamp() as f64
                    + f64::from(datetime.timestamp_subsec_micros()) / 1_000_000.0;
                serde_json::Number::from_f64(secs)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
            TimestampFormat::EpochMillis => {
                serde_json::Value::Number(datetime.timestamp_millis().into())
            }
            TimestampFormat::Iso8601 => serde_json::Value::String(
                datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            ),
            TimestampFormat::Rfc3339 => serde_json::Value::String(datetime.to_rfc3339()),
        }
    }
}
