//! Timestamp formatting utilities
//!
//! The development profile writes local wall-clock times, the production
//! profile writes Unix milliseconds.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Layout used by the development profile: `2025-01-08 10:30:45`
pub const LOCAL_DATETIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use rust_leveled_logger::core::TimestampFormat;
/// use chrono::Utc;
///
/// let format = TimestampFormat::UnixMillis;
/// let millis: i64 = format.format(&Utc::now()).parse().unwrap();
/// assert!(millis > 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Local time, second precision: `2025-01-08 10:30:45`
    LocalDateTime,

    /// Unix timestamp in milliseconds: `1736332245123`
    #[default]
    UnixMillis,

    /// ISO 8601 UTC with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// Custom strftime format, rendered in local time
    Custom(String),
}

impl TimestampFormat {
    /// Format a `DateTime<Utc>` according to this format
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::LocalDateTime => datetime
                .with_timezone(&Local)
                .format(LOCAL_DATETIME_LAYOUT)
                .to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Custom(format_str) => {
                // An invalid pattern falls back to RFC 3339 instead of panicking
                let mut out = String::new();
                let local = datetime.with_timezone(&Local);
                if write!(out, "{}", local.format(format_str)).is_err() {
                    out = local.to_rfc3339();
                }
                out
            }
        }
    }

    /// JSON representation: numbers for numeric formats, strings otherwise
    #[must_use]
    pub fn to_json_value(&self, datetime: &DateTime<Utc>) -> serde_json::Value {
        match self {
            TimestampFormat::UnixMillis => {
                serde_json::Value::Number(datetime.timestamp_millis().into())
            }
            _ => serde_json::Value::String(self.format(datetime)),
        }
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampFormat::UnixMillis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, TimeZone, Timelike};

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn test_unix_millis_format() {
        let result = TimestampFormat::UnixMillis.format(&fixed_datetime());
        assert_eq!(result, "1736332245123");
    }

    #[test]
    fn test_local_datetime_format() {
        let result = TimestampFormat::LocalDateTime.format(&fixed_datetime());
        let parsed = NaiveDateTime::parse_from_str(&result, LOCAL_DATETIME_LAYOUT)
            .expect("local datetime layout");
        let expected = fixed_datetime().with_timezone(&Local).naive_local();
        assert_eq!(parsed, expected.with_nanosecond(0).unwrap());
    }

    #[test]
    fn test_iso8601_format() {
        let result = TimestampFormat::Iso8601.format(&fixed_datetime());
        assert_eq!(result, "2025-01-08T10:30:45.123Z");
    }

    #[test]
    fn test_json_value_kind() {
        let dt = fixed_datetime();
        assert!(TimestampFormat::UnixMillis.to_json_value(&dt).is_i64());
        assert!(TimestampFormat::LocalDateTime.to_json_value(&dt).is_string());
    }

    #[test]
    fn test_is_numeric() {
        assert!(TimestampFormat::UnixMillis.is_numeric());
        assert!(!TimestampFormat::LocalDateTime.is_numeric());
        assert!(!TimestampFormat::Custom("%Y".to_string()).is_numeric());
    }
}
