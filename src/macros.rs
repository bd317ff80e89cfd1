//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. The message is
//! only formatted when the level is enabled.
//!
//! A `;` after the format arguments starts a list of `key => value` fields.
//!
//! # Examples
//!
//! ```no_run
//! use rust_leveled_logger::prelude::*;
//! use rust_leveled_logger::info;
//!
//! let logger = Logger::new(Options::new()).unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // With fields
//! info!(logger, "request served"; "path" => "/health", "status" => 200);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```no_run
/// # use rust_leveled_logger::prelude::*;
/// # let logger = Logger::new(Options::new()).unwrap();
/// use rust_leveled_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// log!(logger, LogLevel::Warn, "slow query"; "ms" => 1200);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $fmt:literal $(, $arg:expr)* ; $($key:expr => $value:expr),+ $(,)?) => {{
        let level = $level;
        let logger = &$logger;
        if logger.enabled(level) {
            logger.log_with_context(
                level,
                format!($fmt $(, $arg)*),
                $crate::LogContext::new()$(.with_field($key, $value))+,
            );
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let level = $level;
        let logger = &$logger;
        if logger.enabled(level) {
            logger.log(level, format!($($arg)+));
        }
    }};
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```no_run
/// # use rust_leveled_logger::prelude::*;
/// # let logger = Logger::new(Options::new().with_level("debug")).unwrap();
/// use rust_leveled_logger::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```no_run
/// # use rust_leveled_logger::prelude::*;
/// # let logger = Logger::new(Options::new()).unwrap();
/// use rust_leveled_logger::warn;
/// warn!(logger, "Low disk space");
/// warn!(logger, "Retry attempt {} of {}", 3, 5; "host" => "db-1");
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}
