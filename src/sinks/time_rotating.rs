//! Time-based rotating file sink
//!
//! Records go to `<link><suffix>`, where the suffix is a strftime pattern
//! rendered for the start of the current interval in local time. The link
//! path itself is kept as a symbolic link to the active file.

use crate::core::{LoggerError, Result, Sink};
use chrono::format::{self, Item, Parsed, StrftimeItems};
use chrono::{DateTime, Local, NaiveDateTime};
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Configuration for [`TimeRotatingWriter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRotationPolicy {
    /// strftime suffix appended to the link path
    pub pattern: String,
    /// Length of one period
    pub interval: Duration,
    /// Period files older than this (by mtime) are removed on rotation
    pub max_age: Option<Duration>,
    /// Maintain the link path as a symlink to the active file
    pub link: bool,
}

impl Default for TimeRotationPolicy {
    fn default() -> Self {
        Self {
            pattern: crate::core::options::DEFAULT_TIME_PATTERN.to_string(),
            interval: Duration::from_secs(3600),
            max_age: None,
            link: true,
        }
    }
}

impl TimeRotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_link(mut self, enabled: bool) -> Self {
        self.link = enabled;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.interval.as_secs() == 0 {
            return Err(LoggerError::config(
                "TimeRotatingWriter",
                "rotation interval must be at least one second",
            ));
        }
        if self.pattern.is_empty() {
            return Err(LoggerError::config(
                "TimeRotatingWriter",
                "file name pattern must not be empty",
            ));
        }
        if StrftimeItems::new(&self.pattern).any(|item| matches!(item, Item::Error)) {
            return Err(LoggerError::config(
                "TimeRotatingWriter",
                format!("invalid strftime pattern '{}'", self.pattern),
            ));
        }
        Ok(())
    }
}

/// Hourly (or any fixed interval) rotating file sink
///
/// # Examples
///
/// ```no_run
/// use rust_leveled_logger::sinks::{Sink, TimeRotatingWriter, TimeRotationPolicy};
/// use std::time::Duration;
///
/// let policy = TimeRotationPolicy::new().with_max_age(Duration::from_secs(7 * 24 * 3600));
/// let mut writer = TimeRotatingWriter::with_policy("/var/log/app-info.log", policy).unwrap();
/// writer.write_record(b"{\"msg\":\"hello\"}\n").unwrap();
/// // /var/log/app-info.log -> app-info.log.2024_0115_13
/// ```
pub struct TimeRotatingWriter {
    link_path: PathBuf,
    policy: TimeRotationPolicy,
    file: File,
    current_path: PathBuf,
    name: String,
}

impl TimeRotatingWriter {
    /// Create a writer with the default hourly policy
    ///
    /// # Errors
    ///
    /// Returns error if the directory or the first period file cannot be created
    pub fn new<P: AsRef<Path>>(link_path: P) -> Result<Self> {
        Self::with_policy(link_path, TimeRotationPolicy::default())
    }

    /// Create a writer and open the file for the current period
    ///
    /// # Errors
    ///
    /// Returns error on an invalid policy or if the file cannot be opened
    pub fn with_policy<P: AsRef<Path>>(link_path: P, policy: TimeRotationPolicy) -> Result<Self> {
        policy.validate()?;
        let link_path = link_path.as_ref().to_path_buf();

        if let Some(parent) = link_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let current_path = period_path(&link_path, &policy, Local::now().naive_local())?;
        let file = open_append(&current_path)?;
        let name = link_path.display().to_string();

        let writer = Self {
            link_path,
            policy,
            file,
            current_path,
            name,
        };
        writer.after_switch();
        Ok(writer)
    }

    /// File receiving records in the current period
    #[must_use]
    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    #[must_use]
    pub fn link_path(&self) -> &Path {
        &self.link_path
    }

    #[must_use]
    pub fn policy(&self) -> &TimeRotationPolicy {
        &self.policy
    }

    fn write_at(&mut self, record: &[u8], now: NaiveDateTime) -> Result<()> {
        let wanted = period_path(&self.link_path, &self.policy, now)?;
        if wanted != self.current_path {
            match open_append(&wanted) {
                Ok(file) => {
                    self.file = file;
                    self.current_path = wanted;
                    self.after_switch();
                }
                Err(e) => {
                    eprintln!(
                        "[WARN] Log rotation failed: {}. Continuing with current file.",
                        e
                    );
                }
            }
        }

        self.file.write_all(record).map_err(|e| {
            LoggerError::sink(self.name.clone(), format!("Failed to write log entry: {}", e))
        })
    }

    /// Link and housekeeping after a new period file is opened. Failures are
    /// reported but do not stop logging.
    fn after_switch(&self) {
        if self.policy.link {
            if let Err(e) = self.update_link() {
                eprintln!("[WARN] Failed to update link {}: {}", self.name, e);
            }
        }
        if let Err(e) = self.prune() {
            eprintln!("[WARN] Failed to remove expired files for {}: {}", self.name, e);
        }
    }

    #[cfg(unix)]
    fn update_link(&self) -> Result<()> {
        // Relative target so the directory can be moved as a whole
        let target = self
            .current_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.current_path.clone());

        let mut temp_name = self.link_path.clone().into_os_string();
        temp_name.push("_symlink");
        let temp_link = PathBuf::from(temp_name);

        if fs::symlink_metadata(&temp_link).is_ok() {
            fs::remove_file(&temp_link)?;
        }
        std::os::unix::fs::symlink(&target, &temp_link).map_err(|e| {
            LoggerError::io_operation(
                "create symlink",
                format!("Failed to link {}", temp_link.display()),
                e,
            )
        })?;
        fs::rename(&temp_link, &self.link_path).map_err(|e| {
            let _ = fs::remove_file(&temp_link);
            LoggerError::io_operation(
                "create symlink",
                format!("Failed to replace {}", self.link_path.display()),
                e,
            )
        })
    }

    #[cfg(not(unix))]
    fn update_link(&self) -> Result<()> {
        Ok(())
    }

    /// Remove period files whose modification time is past `max_age`
    fn prune(&self) -> Result<()> {
        let Some(max_age) = self.policy.max_age else {
            return Ok(());
        };
        let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
            return Ok(());
        };
        let Some(link_name) = self.link_path.file_name().and_then(|n| n.to_str()) else {
            return Ok(());
        };
        let dir = match self.link_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        for dir_entry in fs::read_dir(&dir)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            let file_name = dir_entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let is_period_file = file_name
                .strip_prefix(link_name)
                .is_some_and(|suffix| matches_pattern(suffix, &self.policy.pattern));
            if !is_period_file || path == self.current_path {
                continue;
            }

            let metadata = fs::symlink_metadata(&path)?;
            if metadata.file_type().is_symlink() || !metadata.is_file() {
                continue;
            }
            if metadata.modified()? < cutoff {
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!("[WARN] Failed to remove expired file {}: {}", path.display(), e);
                }
            }
        }
        Ok(())
    }
}

impl Sink for TimeRotatingWriter {
    fn write_record(&mut self, record: &[u8]) -> Result<()> {
        self.write_at(record, Local::now().naive_local())
    }

    fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Start of the interval containing `now`
fn period_start(now: NaiveDateTime, interval: Duration) -> NaiveDateTime {
    let step = interval.as_secs().max(1) as i64;
    let secs = now.and_utc().timestamp();
    let start = secs - secs.rem_euclid(step);
    DateTime::from_timestamp(start, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or(now)
}

fn period_path(link_path: &Path, policy: &TimeRotationPolicy, now: NaiveDateTime) -> Result<PathBuf> {
    let start = period_start(now, policy.interval);
    let mut suffix = String::new();
    write!(suffix, "{}", start.format(&policy.pattern)).map_err(|_| {
        LoggerError::config(
            "TimeRotatingWriter",
            format!("invalid strftime pattern '{}'", policy.pattern),
        )
    })?;

    let mut name = link_path.as_os_str().to_owned();
    name.push(suffix);
    Ok(PathBuf::from(name))
}

/// Whether `suffix` is a rendering of the strftime `pattern`
fn matches_pattern(suffix: &str, pattern: &str) -> bool {
    let mut parsed = Parsed::new();
    !suffix.is_empty() && format::parse(&mut parsed, suffix, StrftimeItems::new(pattern)).is_ok()
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LoggerError::sink(path.display().to_string(), format!("Failed to open: {}", e)))
}
