//! Sink trait for byte-level log destinations

use super::error::Result;

/// Destination for already-encoded records: a file, a rotating file set,
/// a console stream.
///
/// Each call to [`write_record`](Self::write_record) carries exactly one
/// complete record, so rotation never splits a record across files.
pub trait Sink: Send {
    fn write_record(&mut self, record: &[u8]) -> Result<()>;
    /// Push buffered bytes to the OS
    fn sync(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write_record(&mut self, record: &[u8]) -> Result<()> {
        (**self).write_record(record)
    }

    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
