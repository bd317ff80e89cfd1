//! Appender trait for log output destinations

use super::{error::Result, log_entry::LogEntry, log_level::LogLevel};

/// A filtered, encoding output attached to a [`Logger`](super::Logger)
pub trait Appender: Send {
    /// Whether a record at `level` should be handed to [`append`](Self::append)
    fn enabled(&self, _level: LogLevel) -> bool {
        true
    }
    fn append(&mut self, entry: &LogEntry) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
