//! Encoder + sink + level gate

use super::encoder::Encoder;
use super::error::Result;
use super::log_entry::Entry;
use super::log_level::Level;
use super::logger::Logger;
use crate::sinks::Sink;
use std::sync::Arc;

/// Decides which levels a [`LogCore`] accepts.
#[derive(Clone)]
pub enum LevelGate {
    /// Every real level.
    Always,
    /// Whatever the logger's output level allows at the moment of the call.
    Logger(Arc<Logger>),
}

impl LevelGate {
    pub fn enabled(&self, level: Level) -> bool {
        match self {
            LevelGate::Always => level != Level::None,
            LevelGate::Logger(logger) => logger.enabled(level),
        }
    }
}

/// Encodes entries and hands them to a sink.
#[derive(Clone)]
pub struct LogCore {
    encoder: Encoder,
    sink: Arc<dyn Sink>,
    gate: LevelGate,
}

impl LogCore {
    pub fn new(encoder: Encoder, sink: Arc<dyn Sink>, gate: LevelGate) -> Self {
        Self {
            encoder,
            sink,
            gate,
        }
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        self.gate.enabled(level)
    }

    /// Encode and write without consulting the gate.
    pub fn write(&self, entry: &Entry) -> Result<()> {
        let line = self.encoder.encode(entry);
        self.sink.write_all(line.as_bytes())
    }

    /// Write only if the gate lets `entry.level` through.
    pub fn check_write(&self, entry: &Entry) -> Result<()> {
        if self.enabled(entry.level) {
            self.write(entry)
        } else {
            Ok(())
        }
    }

    pub fn sync(&self) -> Result<()> {
        self.sink.sync()
    }

    pub fn encoder(&self) -> Encoder {
        self.encoder
    }
}
