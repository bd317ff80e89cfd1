//! Sink implementations

pub mod buffer;
pub mod console;
pub mod factory;
pub mod file;
pub mod size_rotating;
pub mod time_rotating;

pub use buffer::SharedBuffer;
pub use console::ConsoleSink;
pub use factory::{open_path, ConsoleSinks, LevelSinks, SinkFactory};
pub use file::FileSink;
pub use size_rotating::{SizeRotatingWriter, SizeRotationPolicy};
pub use time_rotating::{TimeRotatingWriter, TimeRotationPolicy};

pub use crate::core::Sink;
