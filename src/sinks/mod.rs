//! Sink implementations
//!
//! A sink accepts already-encoded bytes. Sinks are shared between the two
//! cores of a pipeline and the installed function table, so every method
//! takes `&self` and implementations lock internally.

pub mod console;
pub mod file;
pub mod multi;
pub mod rotating_file;

pub use console::{StderrSink, StdoutSink};
pub use file::FileSink;
pub use multi::MultiSink;
pub use rotating_file::{RotatingFileSink, RotationPolicy};

use crate::core::error::Result;
use std::sync::Arc;

/// Path sentinel selecting the process standard output.
pub const STDOUT_PATH: &str = "stdout";
/// Path sentinel selecting the process standard error.
pub const STDERR_PATH: &str = "stderr";

/// Destination for encoded log lines.
pub trait Sink: Send + Sync {
    /// Write the whole buffer or fail.
    fn write_all(&self, buf: &[u8]) -> Result<()>;
    /// Flush anything buffered down to the OS.
    fn sync(&self) -> Result<()>;
    /// Flush and release the underlying resource. Later writes fail.
    fn close(&self) -> Result<()>;
    fn name(&self) -> &str;
}

/// Open a sink by path, honoring the `stdout`/`stderr` sentinels.
///
/// # Errors
///
/// Returns [`LoggerError::SinkOpen`](crate::LoggerError::SinkOpen) when a file
/// path cannot be opened for appending.
pub fn open(path: &str) -> Result<Arc<dyn Sink>> {
    match path {
        STDOUT_PATH => Ok(Arc::new(StdoutSink)),
        STDERR_PATH => Ok(Arc::new(StderrSink)),
        _ => Ok(Arc::new(FileSink::open(path)?)),
    }
}
