//! Core logger types and traits

pub mod bridge;
pub mod encoder;
pub mod error;
pub mod field;
pub mod log_core;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod options;
pub mod registry;
pub mod terminator;
pub mod timestamp;

pub use bridge::{LogBridge, TracingBridge};
pub use encoder::Encoder;
pub use error::{LoggerError, Result};
pub use field::{Field, FieldValue};
pub use log_core::{LevelGate, LogCore};
pub use log_entry::{Caller, Entry};
pub use log_level::Level;
pub use logger::{Logger, DEFAULT_LOGGER_NAME};
pub use options::Options;
pub use registry::{FunctionTable, HandleSettings, Registry};
pub use terminator::{ExitProcess, ProcessTerminator, RecordingTerminator, FATAL_EXIT_CODE};
pub use timestamp::{format_timestamp, TIMESTAMP_LEN};
