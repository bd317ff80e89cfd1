//! Log entry structure

use super::log_context::LogContext;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::panic::Location;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// `file:line` of the logging call site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
    #[serde(default, skip_serializing_if = "LogContext::is_empty")]
    pub context: LogContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
            caller: None,
            context: LogContext::new(),
            stacktrace: None,
        }
    }

    pub fn with_caller(mut self, location: &Location<'_>) -> Self {
        self.caller = Some(format!("{}:{}", location.file(), location.line()));
        self
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        self.stacktrace = Some(stacktrace.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_is_file_and_line() {
        let entry = LogEntry::new(LogLevel::Info, "hello").with_caller(Location::caller());
        let caller = entry.caller.unwrap();
        assert!(caller.starts_with(file!()));
        assert!(caller.rsplit(':').next().unwrap().parse::<u32>().is_ok());
    }

    #[test]
    fn test_context_defaults_empty() {
        let entry = LogEntry::new(LogLevel::Debug, "x".to_string());
        assert!(entry.context.is_empty());
        assert!(entry.caller.is_none());
        assert!(entry.stacktrace.is_none());
    }
}
