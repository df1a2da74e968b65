//! Fan-out sink

use super::Sink;
use crate::core::error::Result;
use std::sync::Arc;

/// Duplicates every write to each child in order.
///
/// Every child is attempted even when an earlier one fails; the first error
/// is returned.
pub struct MultiSink {
    sinks: Vec<Arc<dyn Sink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    fn each(&self, op: impl Fn(&dyn Sink) -> Result<()>) -> Result<()> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = op(sink.as_ref()) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl Sink for MultiSink {
    fn write_all(&self, buf: &[u8]) -> Result<()> {
        self.each(|sink| sink.write_all(buf))
    }

    fn sync(&self) -> Result<()> {
        self.each(|sink| sink.sync())
    }

    fn close(&self) -> Result<()> {
        self.each(|sink| sink.close())
    }

    fn name(&self) -> &str {
        "multi"
    }
}
