//! Logger options and the resolved configuration
//!
//! [`Options`] is what callers hand in: every field may be left empty.
//! [`Options::load`] fills the gaps with defaults and returns a [`Config`],
//! which is immutable for the lifetime of the logger built from it.

use super::encoder::EncoderConfig;
use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LEVEL: LogLevel = LogLevel::Info;
pub const DEFAULT_DIRECTORY: &str = "logs";
pub const DEFAULT_APP_NAME: &str = "app";
pub const DEFAULT_ERROR_FILE_NAME: &str = "error.log";
pub const DEFAULT_WARN_FILE_NAME: &str = "warn.log";
pub const DEFAULT_INFO_FILE_NAME: &str = "info.log";
pub const DEFAULT_DEBUG_FILE_NAME: &str = "debug.log";
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;
pub const DEFAULT_MAX_BACKUPS: usize = 30;
pub const DEFAULT_MAX_AGE_DAYS: u64 = 30;
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(3600);
/// strftime suffix appended to the link name for time-based files
pub const DEFAULT_TIME_PATTERN: &str = ".%Y_%m%d_%H";

/// Rotation backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CutType {
    /// Rotate when the file would exceed the size threshold
    #[default]
    Size,
    /// Rotate on a fixed time interval behind a stable link name
    Time,
}

impl From<i64> for CutType {
    fn from(value: i64) -> Self {
        if value == 0 {
            CutType::Size
        } else {
            CutType::Time
        }
    }
}

/// Settings handed through to the underlying engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Base outputs of the engine. The leveled cores replace the engine's
    /// base output, so these are only resolved and reported.
    pub output_paths: Vec<String>,
    /// Where the logger reports its own failures (`stderr`, `stdout` or a file)
    pub error_output_paths: Vec<String>,
}

/// Caller-supplied logger options. Every field is optional.
///
/// # Example
///
/// ```
/// use rust_leveled_logger::{CutType, LogLevel, Options};
///
/// let config = Options::new()
///     .with_level("warn")
///     .with_app_name("billing")
///     .with_cut_type(1)
///     .load();
///
/// assert_eq!(config.level, LogLevel::Warn);
/// assert_eq!(config.cut_type, CutType::Time);
/// assert_eq!(config.max_backups, 30);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub level: Option<String>,
    pub directory: Option<PathBuf>,
    pub app_name: Option<String>,
    pub error_file_name: Option<String>,
    pub warn_file_name: Option<String>,
    pub info_file_name: Option<String>,
    pub debug_file_name: Option<String>,
    pub max_size_mb: Option<u64>,
    pub max_backups: Option<usize>,
    pub max_age_days: Option<u64>,
    /// 0 = size-based, anything else = time-based
    pub cut_type: Option<i64>,
    pub development: bool,
    pub rotation_interval_secs: Option<u64>,
    pub compress: Option<bool>,
    pub console_colors: Option<bool>,
    /// Never attach stack traces, whatever the level
    pub disable_stacktrace: bool,
    pub engine: EngineOptions,
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read options from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "read logger options",
                format!("Failed to read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json_str(&raw)
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// Override the file name used for one severity
    #[must_use = "builder methods return a new value"]
    pub fn with_file_name(mut self, level: LogLevel, file_name: impl Into<String>) -> Self {
        let slot = match level {
            LogLevel::Error => &mut self.error_file_name,
            LogLevel::Warn => &mut self.warn_file_name,
            LogLevel::Info => &mut self.info_file_name,
            LogLevel::Debug => &mut self.debug_file_name,
        };
        *slot = Some(file_name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_size_mb(mut self, mb: u64) -> Self {
        self.max_size_mb = Some(mb);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = Some(count);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_age_days(mut self, days: u64) -> Self {
        self.max_age_days = Some(days);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_cut_type(mut self, cut_type: i64) -> Self {
        self.cut_type = Some(cut_type);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_rotation_interval(mut self, interval: Duration) -> Self {
        self.rotation_interval_secs = Some(interval.as_secs());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = Some(enabled);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_console_colors(mut self, enabled: bool) -> Self {
        self.console_colors = Some(enabled);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_disable_stacktrace(mut self, disabled: bool) -> Self {
        self.disable_stacktrace = disabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_error_output_paths(mut self, paths: Vec<String>) -> Self {
        self.engine.error_output_paths = paths;
        self
    }

    /// Resolve every unset field to its default. Never fails: empty strings,
    /// zero numbers and unknown level names count as unset.
    #[must_use]
    pub fn load(&self) -> Config {
        let level = self
            .level
            .as_deref()
            .and_then(|s| s.parse::<LogLevel>().ok())
            .unwrap_or(DEFAULT_LEVEL);

        let directory = self
            .directory
            .clone()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(default_directory);

        let mut encoder = EncoderConfig::for_mode(self.development);
        if self.disable_stacktrace {
            encoder = encoder.with_stacktrace_level(None);
        }

        Config {
            level,
            directory,
            app_name: non_empty(&self.app_name, DEFAULT_APP_NAME),
            error_file_name: non_empty(&self.error_file_name, DEFAULT_ERROR_FILE_NAME),
            warn_file_name: non_empty(&self.warn_file_name, DEFAULT_WARN_FILE_NAME),
            info_file_name: non_empty(&self.info_file_name, DEFAULT_INFO_FILE_NAME),
            debug_file_name: non_empty(&self.debug_file_name, DEFAULT_DEBUG_FILE_NAME),
            max_size_mb: self.max_size_mb.filter(|v| *v > 0).unwrap_or(DEFAULT_MAX_SIZE_MB),
            max_backups: self.max_backups.filter(|v| *v > 0).unwrap_or(DEFAULT_MAX_BACKUPS),
            max_age_days: self.max_age_days.filter(|v| *v > 0).unwrap_or(DEFAULT_MAX_AGE_DAYS),
            cut_type: self.cut_type.map(CutType::from).unwrap_or_default(),
            development: self.development,
            rotation_interval: self
                .rotation_interval_secs
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_ROTATION_INTERVAL),
            time_pattern: DEFAULT_TIME_PATTERN.to_string(),
            compress: self.compress.unwrap_or(true),
            console_colors: self.console_colors.unwrap_or(false),
            encoder,
            output_paths: non_empty_list(&self.engine.output_paths, "stdout"),
            error_output_paths: non_empty_list(&self.engine.error_output_paths, "stderr"),
        }
    }
}

fn non_empty(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn non_empty_list(values: &[String], default: &str) -> Vec<String> {
    if values.is_empty() {
        vec![default.to_string()]
    } else {
        values.to_vec()
    }
}

/// `<current dir>/logs`, or a relative `logs` if the current dir is unknown
fn default_directory() -> PathBuf {
    std::env::current_dir()
        .map(|cwd| cwd.join(DEFAULT_DIRECTORY))
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DIRECTORY))
}

/// Fully resolved logger configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Global minimum level
    pub level: LogLevel,
    pub directory: PathBuf,
    pub app_name: String,
    pub error_file_name: String,
    pub warn_file_name: String,
    pub info_file_name: String,
    pub debug_file_name: String,
    pub max_size_mb: u64,
    pub max_backups: usize,
    pub max_age_days: u64,
    pub cut_type: CutType,
    pub development: bool,
    pub rotation_interval: Duration,
    pub time_pattern: String,
    pub compress: bool,
    pub console_colors: bool,
    /// Encoder profile for the file sinks
    pub encoder: EncoderConfig,
    pub output_paths: Vec<String>,
    pub error_output_paths: Vec<String>,
}

impl Config {
    pub fn file_name(&self, level: LogLevel) -> &str {
        match level {
            LogLevel::Error => &self.error_file_name,
            LogLevel::Warn => &self.warn_file_name,
            LogLevel::Info => &self.info_file_name,
            LogLevel::Debug => &self.debug_file_name,
        }
    }

    /// `<directory>/<app_name>-<file_name>`
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.directory.join(format!("{}-{}", self.app_name, file_name))
    }

    /// Active file (or link, for time-based rotation) of one severity
    pub fn log_path(&self, level: LogLevel) -> PathBuf {
        self.path_for(self.file_name(level))
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_days.saturating_mul(24 * 3600))
    }
}

impl Default for Config {
    fn default() -> Self {
        Options::default().load()
    }
}
