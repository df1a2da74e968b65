//! Plain append-only file sink

use super::Sink;
use crate::core::error::{LoggerError, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};

pub struct FileSink {
    path: PathBuf,
    name: String,
    writer: Mutex<Option<LineWriter<File>>>,
}

impl FileSink {
    /// Open `path` for appending, creating the file if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LoggerError::sink_open(name.clone(), e))?;

        Ok(Self {
            path,
            name,
            writer: Mutex::new(Some(LineWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn write_all(&self, buf: &[u8]) -> Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or_else(|| {
            LoggerError::write(
                self.name.clone(),
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink closed"),
            )
        })?;
        writer
            .write_all(buf)
            .map_err(|e| LoggerError::write(self.name.clone(), e))
    }

    fn sync(&self) -> Result<()> {
        if let Some(ref mut writer) = *self.writer.lock() {
            writer
                .flush()
                .map_err(|e| LoggerError::write(self.name.clone(), e))?;
            writer
                .get_ref()
                .sync_data()
                .map_err(|e| LoggerError::write(self.name.clone(), e))?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if let Some(mut writer) = self.writer.lock().take() {
            writer
                .flush()
                .map_err(|e| LoggerError::write(self.name.clone(), e))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.close();
    }
}
