//! Main logger implementation

use super::{
    appender::Appender,
    error::{LoggerError, Result},
    level_core::compose_cores,
    log_context::LogContext,
    log_entry::LogEntry,
    log_level::LogLevel,
    metrics::LoggerMetrics,
    options::{Config, Options},
    sink::Sink,
};
use crate::sinks::{open_path, ConsoleSinks, SinkFactory};
use chrono::Local;
use parking_lot::Mutex;
use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{catch_unwind, AssertUnwindSafe, Location};
use std::sync::Arc;

/// Leveled logger handle
///
/// Every record is fanned out to each core whose filter accepts its level.
/// A single instance can be shared across threads; cores are written one
/// record at a time under a lock.
pub struct Logger {
    config: Config,
    cores: Mutex<Vec<Box<dyn Appender>>>,
    /// Where the logger reports its own write failures
    error_outputs: Mutex<Vec<Box<dyn Sink>>>,
    /// Metrics for observability (dropped count, total logged, etc.)
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    /// Build a logger from options with the real console streams
    ///
    /// # Errors
    ///
    /// Returns error if any log file or error output cannot be opened
    pub fn new(options: Options) -> Result<Self> {
        Self::builder().options(options).build()
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```no_run
    /// use rust_leveled_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .options(Options::new().with_level("debug").with_directory("/tmp/logs"))
    ///     .build()
    ///     .unwrap();
    /// logger.debug("ready");
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Resolved configuration this logger was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Global minimum level
    pub fn level(&self) -> LogLevel {
        self.config.level
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.config.level
    }

    /// Names of all cores in fan-out order
    pub fn core_names(&self) -> Vec<String> {
        self.cores.lock().iter().map(|c| c.name().to_string()).collect()
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.log_with_context(level, message, LogContext::new());
    }

    /// Log with structured context fields
    #[track_caller]
    pub fn log_with_context(&self, level: LogLevel, message: impl Into<String>, context: LogContext) {
        if !self.enabled(level) {
            return;
        }

        let mut entry = LogEntry::new(level, message)
            .with_caller(Location::caller())
            .with_context(context);
        if self.config.encoder.wants_stacktrace(level) {
            entry = entry.with_stacktrace(Backtrace::force_capture().to_string());
        }
        self.dispatch(&entry);
    }

    /// Write a prepared entry. Its caller and timestamp are kept as they are.
    pub fn write_entry(&self, entry: &LogEntry) {
        if self.enabled(entry.level) {
            self.dispatch(entry);
        }
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[track_caller]
    pub fn debug_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Debug, message, context);
    }

    #[track_caller]
    pub fn info_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Info, message, context);
    }

    #[track_caller]
    pub fn warn_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Warn, message, context);
    }

    #[track_caller]
    pub fn error_with_context(&self, message: impl Into<String>, context: LogContext) {
        self.log_with_context(LogLevel::Error, message, context);
    }

    /// Write one record to every accepting core
    ///
    /// **Per-core panic isolation**: each core is wrapped in catch_unwind so a
    /// failing core does not keep the record from the others.
    fn dispatch(&self, entry: &LogEntry) {
        let mut failures = Vec::new();
        {
            let mut cores = self.cores.lock();
            for core in cores.iter_mut().filter(|c| c.enabled(entry.level)) {
                match catch_unwind(AssertUnwindSafe(|| core.append(entry))) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        self.metrics.record_write_error();
                        failures.push(format!("core '{}' failed: {}", core.name(), e));
                    }
                    Err(panic_info) => {
                        self.metrics.record_panic();
                        failures.push(format!(
                            "core '{}' panicked: {}. Other cores continue to function.",
                            core.name(),
                            panic_message(panic_info.as_ref())
                        ));
                    }
                }
            }
        }

        if failures.is_empty() {
            self.metrics.record_logged();
        } else {
            self.metrics.record_dropped();
            for failure in failures {
                self.report(&failure);
            }
        }
    }

    /// Send an internal failure to the error outputs, falling back to stderr
    fn report(&self, message: &str) {
        let line = format!(
            "[LOGGER ERROR] {} {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            message
        );
        let mut outputs = self.error_outputs.lock();
        if outputs.is_empty() {
            eprint!("{}", line);
            return;
        }
        for output in outputs.iter_mut() {
            if output.write_record(line.as_bytes()).is_err() {
                eprint!("{}", line);
            }
        }
    }

    /// Sync every core. All cores are flushed even if one fails; the first
    /// failure is returned.
    pub fn flush(&self) -> Result<()> {
        let mut first_error: Option<LoggerError> = None;
        {
            let mut cores = self.cores.lock();
            for core in cores.iter_mut() {
                match catch_unwind(AssertUnwindSafe(|| core.flush())) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        self.report(&format!("core '{}' flush failed: {}", core.name(), e));
                        first_error.get_or_insert(e);
                    }
                    Err(panic_info) => {
                        self.metrics.record_panic();
                        let message = format!(
                            "core '{}' panicked during flush: {}",
                            core.name(),
                            panic_message(panic_info.as_ref())
                        );
                        self.report(&message);
                        first_error.get_or_insert(LoggerError::other(message));
                    }
                }
            }
        }

        for output in self.error_outputs.lock().iter_mut() {
            let _ = output.sync();
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Get the logger metrics
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_leveled_logger::prelude::*;
    ///
    /// let logger = Logger::new(Options::new()).unwrap();
    /// logger.info("hello");
    /// let metrics = logger.metrics();
    /// println!("Dropped: {}", metrics.dropped_count());
    /// println!("Drop rate: {:.2}%", metrics.drop_rate());
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Records that at least one core failed to write
    pub fn dropped_count(&self) -> u64 {
        self.metrics.dropped_count()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        let dropped = self.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} dropped logs (drop rate: {:.2}%)",
                dropped,
                self.metrics.drop_rate()
            );
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```no_run
/// use rust_leveled_logger::prelude::*;
/// use rust_leveled_logger::sinks::SharedBuffer;
///
/// let stdout = SharedBuffer::new();
/// let logger = Logger::builder()
///     .options(Options::new().with_development(true).with_directory("/tmp/logs"))
///     .stdout_sink(stdout.clone())
///     .build()
///     .unwrap();
/// logger.info("captured");
/// assert_eq!(stdout.lines().len(), 1);
/// ```
pub struct LoggerBuilder {
    options: Options,
    stdout: Option<Box<dyn Sink>>,
    stderr: Option<Box<dyn Sink>>,
    error_outputs: Option<Vec<Box<dyn Sink>>>,
    appenders: Vec<Box<dyn Appender>>,
}

impl LoggerBuilder {
    /// Create a new builder with default options
    pub fn new() -> Self {
        Self {
            options: Options::default(),
            stdout: None,
            stderr: None,
            error_outputs: None,
            appenders: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Replace stdout for the development console core
    #[must_use = "builder methods return a new value"]
    pub fn stdout_sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.stdout = Some(Box::new(sink));
        self
    }

    /// Replace stderr for the development console core
    #[must_use = "builder methods return a new value"]
    pub fn stderr_sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.stderr = Some(Box::new(sink));
        self
    }

    /// Add a destination for internal failure reports. Once called, the
    /// configured error-output paths are not opened.
    #[must_use = "builder methods return a new value"]
    pub fn error_output<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.error_outputs
            .get_or_insert_with(Vec::new)
            .push(Box::new(sink));
        self
    }

    /// Add an appender after the leveled cores
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    /// Build the Logger
    ///
    /// # Errors
    ///
    /// Returns error if a log file, output path or error output cannot be
    /// opened
    pub fn build(self) -> Result<Logger> {
        let config = self.options.load();

        let files = SinkFactory::new(&config).level_sinks()?;
        let console = config.development.then(|| {
            let mut console = ConsoleSinks::default();
            if let Some(stdout) = self.stdout {
                console.stdout = stdout;
            }
            if let Some(stderr) = self.stderr {
                console.stderr = stderr;
            }
            console
        });

        let mut cores = compose_cores(&config, files, console);
        cores.extend(self.appenders);

        // Base outputs are opened for validation only; records go to the
        // leveled cores.
        for path in &config.output_paths {
            open_path(path)?;
        }

        let error_outputs = match self.error_outputs {
            Some(outputs) => outputs,
            None => config
                .error_output_paths
                .iter()
                .map(|path| open_path(path))
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(Logger {
            config,
            cores: Mutex::new(cores),
            error_outputs: Mutex::new(error_outputs),
            metrics: Arc::new(LoggerMetrics::new()),
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::SharedBuffer;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    struct FailingAppender;

    impl Appender for FailingAppender {
        fn append(&mut self, _entry: &LogEntry) -> Result<()> {
            Err(LoggerError::other("disk full"))
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingAppender;

    impl Appender for PanickingAppender {
        fn append(&mut self, _entry: &LogEntry) -> Result<()> {
            panic!("appender exploded");
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn options(dir: &Path) -> Options {
        Options::new().with_directory(dir).with_level("debug")
    }

    #[test]
    fn test_builder_production_cores() {
        let dir = tempdir().unwrap();
        let logger = Logger::new(options(dir.path())).unwrap();

        assert_eq!(
            logger.core_names(),
            vec!["error-file", "warn-file", "info-file", "debug-file"]
        );
        assert_eq!(logger.level(), LogLevel::Debug);
        assert_eq!(logger.dropped_count(), 0);
    }

    #[test]
    fn test_record_reaches_threshold_files() {
        let dir = tempdir().unwrap();
        let logger = Logger::new(options(dir.path())).unwrap();

        logger.warn("low disk");
        logger.flush().unwrap();

        let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert!(read("app-error.log").is_empty());
        assert!(read("app-warn.log").contains("low disk"));
        assert!(read("app-info.log").contains("low disk"));
        assert!(read("app-debug.log").contains("low disk"));
        assert_eq!(logger.metrics().total_logged(), 1);
    }

    #[test]
    fn test_caller_points_at_call_site() {
        let dir = tempdir().unwrap();
        let logger = Logger::new(options(dir.path())).unwrap();

        logger.info("where am I");
        logger.flush().unwrap();

        let line = fs::read_to_string(dir.path().join("app-info.log")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert!(parsed["caller"].as_str().unwrap().contains("logger.rs"));
    }

    #[test]
    fn test_below_min_level_is_ignored() {
        let dir = tempdir().unwrap();
        let logger = Logger::new(options(dir.path()).with_level("error")).unwrap();

        logger.warn("quiet");
        logger.flush().unwrap();

        assert!(!logger.enabled(LogLevel::Warn));
        assert_eq!(logger.metrics().total_logged(), 0);
        for name in ["app-error.log", "app-warn.log", "app-info.log", "app-debug.log"] {
            assert!(fs::read_to_string(dir.path().join(name)).unwrap().is_empty());
        }
    }

    #[test]
    fn test_failing_core_reported_and_counted() {
        let dir = tempdir().unwrap();
        let errors = SharedBuffer::new();
        let logger = Logger::builder()
            .options(options(dir.path()))
            .appender(FailingAppender)
            .error_output(errors.clone())
            .build()
            .unwrap();

        logger.error("boom");
        logger.flush().unwrap();

        assert_eq!(logger.dropped_count(), 1);
        assert_eq!(logger.metrics().write_errors(), 1);
        let report = errors.contents_string();
        assert!(report.starts_with("[LOGGER ERROR]"));
        assert!(report.contains("failing"));
        assert!(report.contains("disk full"));

        // The leveled cores still received the record
        let error_file = fs::read_to_string(dir.path().join("app-error.log")).unwrap();
        assert!(error_file.contains("boom"));
    }

    #[test]
    fn test_panicking_core_isolated() {
        let dir = tempdir().unwrap();
        let errors = SharedBuffer::new();
        let logger = Logger::builder()
            .options(options(dir.path()))
            .appender(PanickingAppender)
            .error_output(errors.clone())
            .build()
            .unwrap();

        logger.info("first");
        logger.info("second");
        logger.flush().unwrap();

        assert_eq!(logger.metrics().core_panics(), 2);
        assert!(errors.contents_string().contains("appender exploded"));
        let info = fs::read_to_string(dir.path().join("app-info.log")).unwrap();
        assert_eq!(info.lines().count(), 2);
    }

    #[test]
    fn test_development_console_capture() {
        let dir = tempdir().unwrap();
        let stdout = SharedBuffer::new();
        let stderr = SharedBuffer::new();
        let logger = Logger::builder()
            .options(options(dir.path()).with_development(true))
            .stdout_sink(stdout.clone())
            .stderr_sink(stderr.clone())
            .build()
            .unwrap();

        logger.info("to stdout");
        logger.error("to stderr");

        assert_eq!(stdout.lines().len(), 1);
        assert!(stdout.contents_string().contains("to stdout"));
        assert_eq!(stderr.lines().len(), 1);
        assert!(stderr.contents_string().contains("to stderr"));
    }

    #[test]
    fn test_stacktrace_on_production_errors_only() {
        let dir = tempdir().unwrap();
        let logger = Logger::new(options(dir.path())).unwrap();

        logger.error("boom");
        logger.warn("careful");
        logger.flush().unwrap();

        let lines = fs::read_to_string(dir.path().join("app-warn.log")).unwrap();
        let records: Vec<serde_json::Value> = lines
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert!(!records[0]["stacktrace"].as_str().unwrap().is_empty());
        assert!(records[1].get("stacktrace").is_none());
    }

    #[test]
    fn test_stacktrace_from_warn_in_development() {
        let dir = tempdir().unwrap();
        let stdout = SharedBuffer::new();
        let logger = Logger::builder()
            .options(options(dir.path()).with_development(true))
            .stdout_sink(stdout.clone())
            .stderr_sink(SharedBuffer::new())
            .build()
            .unwrap();

        logger.warn("careful");
        logger.info("fine");
        logger.flush().unwrap();

        let lines = fs::read_to_string(dir.path().join("app-info.log")).unwrap();
        let records: Vec<serde_json::Value> = lines
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert!(records[0]["S"].is_string());
        assert!(records[1].get("S").is_none());
        assert_eq!(stdout.lines().len(), 2);
    }

    #[test]
    fn test_unopenable_directory_fails_build() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();

        let result = Logger::new(Options::new().with_directory(&blocker));
        assert!(result.is_err());
    }

    #[test]
    fn test_unopenable_directory_fails_time_based_build() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();

        let result = Logger::new(Options::new().with_directory(&blocker).with_cut_type(1));
        assert!(matches!(result, Err(LoggerError::IoOperation { .. })));
    }
}
