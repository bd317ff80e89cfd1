//! Record encoders
//!
//! - Json: one object per line, used for every file sink
//! - Console: tab-separated human-readable line, used for stdout/stderr

use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use super::timestamp::TimestampFormat;
use colored::Colorize;
use serde::{Deserialize, Serialize};

/// Key names and value styles shared by the encoders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub time_key: String,
    pub level_key: String,
    pub caller_key: String,
    pub message_key: String,
    pub stacktrace_key: String,
    /// Records at or above this level carry a stack trace; `None` disables it
    pub stacktrace_level: Option<LogLevel>,
    pub timestamp_format: TimestampFormat,
    /// `INFO` instead of `info`
    pub level_uppercase: bool,
    /// Colour the level name (console only)
    pub colored_level: bool,
}

impl EncoderConfig {
    /// Human-oriented profile: short keys, local date-time, capital levels
    #[must_use]
    pub fn development() -> Self {
        Self {
            time_key: "T".to_string(),
            level_key: "L".to_string(),
            caller_key: "C".to_string(),
            message_key: "M".to_string(),
            stacktrace_key: "S".to_string(),
            stacktrace_level: Some(LogLevel::Warn),
            timestamp_format: TimestampFormat::LocalDateTime,
            level_uppercase: true,
            colored_level: false,
        }
    }

    /// Machine-oriented profile: descriptive keys, Unix millis, lowercase levels
    #[must_use]
    pub fn production() -> Self {
        Self {
            time_key: "ts".to_string(),
            level_key: "level".to_string(),
            caller_key: "caller".to_string(),
            message_key: "msg".to_string(),
            stacktrace_key: "stacktrace".to_string(),
            stacktrace_level: Some(LogLevel::Error),
            timestamp_format: TimestampFormat::UnixMillis,
            level_uppercase: false,
            colored_level: false,
        }
    }

    #[must_use]
    pub fn for_mode(development: bool) -> Self {
        if development {
            Self::development()
        } else {
            Self::production()
        }
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn with_stacktrace_level(mut self, level: Option<LogLevel>) -> Self {
        self.stacktrace_level = level;
        self
    }

    /// Whether records at `level` should capture a stack trace
    #[must_use]
    pub fn wants_stacktrace(&self, level: LogLevel) -> bool {
        self.stacktrace_level.is_some_and(|min| level >= min)
    }

    #[must_use]
    pub fn with_colored_level(mut self, enabled: bool) -> Self {
        self.colored_level = enabled;
        self
    }

    fn level_name(&self, level: LogLevel) -> &'static str {
        if self.level_uppercase {
            level.to_str()
        } else {
            level.as_lowercase()
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::production()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoder {
    Json(EncoderConfig),
    Console(EncoderConfig),
}

impl Encoder {
    /// Encode a record as a single newline-terminated line
    pub fn encode(&self, entry: &LogEntry) -> String {
        let mut line = match self {
            Encoder::Json(config) => Self::encode_json(config, entry),
            Encoder::Console(config) => Self::encode_console(config, entry),
        };
        line.push('\n');
        line
    }

    pub fn config(&self) -> &EncoderConfig {
        match self {
            Encoder::Json(config) | Encoder::Console(config) => config,
        }
    }

    fn encode_json(config: &EncoderConfig, entry: &LogEntry) -> String {
        // Fixed keys first, then attributes in insertion order
        let mut out = String::with_capacity(128);
        out.push('{');
        push_json_pair(&mut out, &config.level_key, &config.level_name(entry.level).into());
        out.push(',');
        push_json_pair(
            &mut out,
            &config.time_key,
            &config.timestamp_format.to_json_value(&entry.timestamp),
        );
        if let Some(ref caller) = entry.caller {
            out.push(',');
            push_json_pair(&mut out, &config.caller_key, &caller.as_str().into());
        }
        out.push(',');
        push_json_pair(&mut out, &config.message_key, &entry.message.as_str().into());

        for (key, value) in entry.context.fields() {
            out.push(',');
            push_json_pair(&mut out, key, &value.to_json_value());
        }
        if let Some(ref stack) = entry.stacktrace {
            out.push(',');
            push_json_pair(&mut out, &config.stacktrace_key, &stack.as_str().into());
        }
        out.push('}');
        out
    }

    fn encode_console(config: &EncoderConfig, entry: &LogEntry) -> String {
        let level = format!("{:5}", config.level_name(entry.level));
        let level = if config.colored_level {
            level.color(entry.level.color_code()).to_string()
        } else {
            level
        };

        let mut parts = vec![config.timestamp_format.format(&entry.timestamp), level];
        if let Some(ref caller) = entry.caller {
            parts.push(caller.clone());
        }
        parts.push(sanitize_message(&entry.message));
        if !entry.context.is_empty() {
            parts.push(entry.context.to_json_object().to_string());
        }
        if let Some(ref stack) = entry.stacktrace {
            parts.push(sanitize_message(stack));
        }
        parts.join("\t")
    }
}

fn push_json_pair(out: &mut String, key: &str, value: &serde_json::Value) {
    out.push_str(&serde_json::Value::String(key.to_string()).to_string());
    out.push(':');
    out.push_str(&value.to_string());
}

/// Escape line breaks and tabs so one record stays on one console line
fn sanitize_message(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}
