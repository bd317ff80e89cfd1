//! In-memory sink

use crate::core::{Result, Sink};
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable in-memory sink. All clones share the same bytes, so one handle
/// can be given to a logger while another reads what was written.
///
/// ```
/// use rust_leveled_logger::sinks::{SharedBuffer, Sink};
///
/// let buffer = SharedBuffer::new();
/// let mut writer = buffer.clone();
/// writer.write_record(b"hello\n").unwrap();
/// assert_eq!(buffer.lines(), vec!["hello".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents_string().lines().map(str::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl Sink for SharedBuffer {
    fn write_record(&mut self, record: &[u8]) -> Result<()> {
        self.bytes.lock().extend_from_slice(record);
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "buffer"
    }
}
