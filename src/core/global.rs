//! Process-wide logger
//!
//! The logger is built at most once. Later initialization attempts leave the
//! existing instance in place and only leave a notice in its log.

use super::error::{LoggerError, Result};
use super::logger::Logger;
use super::options::Options;
use parking_lot::{const_mutex, Mutex};
use std::sync::OnceLock;

static LOGGER: OnceLock<Logger> = OnceLock::new();
static INIT_LOCK: Mutex<()> = const_mutex(());

/// Build the process-wide logger, or return the one already built.
///
/// `None` uses default options. Options passed after the first successful
/// call are ignored. A failed build leaves the logger uninitialized, so a
/// later call may try again.
///
/// # Errors
///
/// Returns error if the log files cannot be opened
///
/// # Example
///
/// ```no_run
/// use rust_leveled_logger::{init_logger, Options};
///
/// let logger = init_logger(Some(Options::new().with_app_name("billing"))).unwrap();
/// logger.info("service started");
/// ```
pub fn init_logger(options: Option<Options>) -> Result<&'static Logger> {
    let _guard = INIT_LOCK.lock();

    if let Some(logger) = LOGGER.get() {
        logger.info("[init_logger] logger already initialized");
        return Ok(logger);
    }

    let logger = Logger::new(options.unwrap_or_default())?;
    let logger = LOGGER.get_or_init(|| logger);
    logger.info("[init_logger] logger initialized");
    Ok(logger)
}

/// The process-wide logger
///
/// # Errors
///
/// Returns [`LoggerError::NotInitialized`] before [`init_logger`] succeeds
pub fn logger() -> Result<&'static Logger> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)
}

/// The process-wide logger, if initialized
pub fn try_logger() -> Option<&'static Logger> {
    LOGGER.get()
}

pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}
