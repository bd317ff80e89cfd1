//! # Rust Leveled Logger
//!
//! A leveled logger that writes each severity to its own rotating file.
//!
//! ## Features
//!
//! - **Per-level files**: error, warn, info and debug records go to separate
//!   JSON-lines files, each accepting its own level and everything above it
//! - **Rotation**: size-based with timestamped, optionally gzipped backups, or
//!   interval-based behind a stable symlink
//! - **Development mode**: human-readable console mirror, errors on stderr
//! - **Process-wide instance**: [`init_logger`] builds it once
//!
//! ```no_run
//! use rust_leveled_logger::prelude::*;
//! use rust_leveled_logger::info;
//!
//! let logger = init_logger(Some(
//!     Options::new()
//!         .with_directory("/var/log/billing")
//!         .with_app_name("billing")
//!         .with_level("debug"),
//! ))
//! .unwrap();
//!
//! info!(logger, "invoice sent"; "invoice_id" => 1042);
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        init_logger, logger, Appender, Config, CutType, FieldValue, LogContext, LogEntry,
        LogLevel, Logger, LoggerBuilder, LoggerError, LoggerMetrics, Options, Result, Sink,
        TimestampFormat,
    };
}

pub use crate::core::{
    init_logger, is_initialized, logger, try_logger, Appender, Config, CutType, Encoder,
    EncoderConfig, EngineOptions, FieldValue, LogContext, LogEntry, LogLevel, Logger,
    LoggerBuilder, LoggerError, LoggerMetrics, Options, Result, Sink, TimestampFormat,
};
