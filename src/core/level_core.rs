//! Per-severity cores and their composition
//!
//! A core is one (encoder, sink, filter) triple. The logger fans every record
//! out to all cores whose filter accepts its level.

use super::appender::Appender;
use super::encoder::{Encoder, EncoderConfig};
use super::error::Result;
use super::level_filter::{LevelFilter, ThresholdFilter};
use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use super::options::Config;
use super::sink::Sink;
use crate::sinks::{ConsoleSinks, LevelSinks};

pub struct LevelCore {
    name: String,
    encoder: Encoder,
    sink: Box<dyn Sink>,
    filter: LevelFilter,
}

impl LevelCore {
    pub fn new(
        name: impl Into<String>,
        encoder: Encoder,
        sink: Box<dyn Sink>,
        filter: LevelFilter,
    ) -> Self {
        Self {
            name: name.into(),
            encoder,
            sink,
            filter,
        }
    }

    pub fn filter(&self) -> &LevelFilter {
        &self.filter
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }
}

impl Appender for LevelCore {
    fn enabled(&self, level: LogLevel) -> bool {
        self.filter.enabled(level)
    }

    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let line = self.encoder.encode(entry);
        self.sink.write_record(line.as_bytes())
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.sync()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build the fan-out set: one JSON file core per severity and, when console
/// sinks are given, a stderr core for errors and a stdout core for the rest.
pub fn compose_cores(
    config: &Config,
    files: LevelSinks,
    console: Option<ConsoleSinks>,
) -> Vec<Box<dyn Appender>> {
    let min = config.level;
    let file_encoder = Encoder::Json(config.encoder.clone());
    let mut cores: Vec<Box<dyn Appender>> = Vec::with_capacity(6);

    for (level, sink) in files.into_iter() {
        cores.push(Box::new(LevelCore::new(
            format!("{}-file", level.as_lowercase()),
            file_encoder.clone(),
            sink,
            LevelFilter::threshold(level, min),
        )));
    }

    if let Some(console) = console {
        let console_encoder = Encoder::Console(
            EncoderConfig::development().with_colored_level(config.console_colors),
        );

        cores.push(Box::new(LevelCore::new(
            "error-console",
            console_encoder.clone(),
            console.stderr,
            LevelFilter::threshold(LogLevel::Error, min),
        )));

        // One stdout core for all three lower gates so a record is printed
        // once; errors are left to stderr.
        let lower_gates = [LogLevel::Warn, LogLevel::Info, LogLevel::Debug]
            .into_iter()
            .map(|severity| ThresholdFilter::new(severity, min));
        cores.push(Box::new(LevelCore::new(
            "stdout-console",
            console_encoder,
            console.stdout,
            LevelFilter::any_of(lower_gates).below(LogLevel::Error),
        )));
    }

    cores
}
