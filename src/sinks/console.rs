//! Standard stream sinks

use super::Sink;
use crate::core::error::{LoggerError, Result};
use std::io::Write;

/// Writes to the process standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

/// Writes to the process standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl Sink for StdoutSink {
    fn write_all(&self, buf: &[u8]) -> Result<()> {
        // one lock per entry keeps concurrent lines whole
        let mut out = std::io::stdout().lock();
        out.write_all(buf)
            .map_err(|e| LoggerError::write(self.name(), e))
    }

    fn sync(&self) -> Result<()> {
        std::io::stdout()
            .flush()
            .map_err(|e| LoggerError::write(self.name(), e))
    }

    // the process owns its standard streams
    fn close(&self) -> Result<()> {
        self.sync()
    }

    fn name(&self) -> &str {
        super::STDOUT_PATH
    }
}

impl Sink for StderrSink {
    fn write_all(&self, buf: &[u8]) -> Result<()> {
        let mut err = std::io::stderr().lock();
        err.write_all(buf)
            .map_err(|e| LoggerError::write(self.name(), e))
    }

    fn sync(&self) -> Result<()> {
        std::io::stderr()
            .flush()
            .map_err(|e| LoggerError::write(self.name(), e))
    }

    fn close(&self) -> Result<()> {
        self.sync()
    }

    fn name(&self) -> &str {
        super::STDERR_PATH
    }
}
