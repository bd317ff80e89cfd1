//! Console sink implementation

use crate::core::{Result, Sink};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleSink {
    Stdout,
    Stderr,
}

impl Sink for ConsoleSink {
    fn write_record(&mut self, record: &[u8]) -> Result<()> {
        // Lock per record so concurrent writers never interleave a line
        match self {
            ConsoleSink::Stdout => std::io::stdout().lock().write_all(record)?,
            ConsoleSink::Stderr => std::io::stderr().lock().write_all(record)?,
        }
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        match self {
            ConsoleSink::Stdout => std::io::stdout().flush()?,
            ConsoleSink::Stderr => std::io::stderr().flush()?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        match self {
            ConsoleSink::Stdout => "stdout",
            ConsoleSink::Stderr => "stderr",
        }
    }
}
