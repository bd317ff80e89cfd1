//! Core logger types and traits

pub mod appender;
pub mod encoder;
pub mod error;
pub mod global;
pub mod level_core;
pub mod level_filter;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod options;
pub mod sink;
pub mod timestamp;

pub use appender::Appender;
pub use encoder::{Encoder, EncoderConfig};
pub use error::{LoggerError, Result};
pub use global::{init_logger, is_initialized, logger, try_logger};
pub use level_core::{compose_cores, LevelCore};
pub use level_filter::{LevelFilter, ThresholdFilter};
pub use log_context::{FieldValue, LogContext};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use options::{Config, CutType, EngineOptions, Options};
pub use sink::Sink;
pub use timestamp::TimestampFormat;
