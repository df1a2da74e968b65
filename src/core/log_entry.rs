//! Log entry structure

use super::field::{Field, FieldValue};
use super::log_level::Level;
use chrono::{DateTime, Utc};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;

/// Source location a log line is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: Cow<'static, str>,
    pub line: u32,
}

impl Caller {
    pub fn new(file: impl Into<Cow<'static, str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// The location of the nearest caller not marked `#[track_caller]`.
    #[track_caller]
    pub fn here() -> Self {
        Self::from(Location::caller())
    }

    /// File name without its directories.
    pub fn short_file(&self) -> &str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.file)
    }
}

impl From<&'static Location<'static>> for Caller {
    fn from(location: &'static Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.short_file(), self.line)
    }
}

/// One structured log record.
#[derive(Debug, Clone)]
pub struct Entry {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub logger_name: Option<String>,
    pub caller: Option<Caller>,
    pub message: String,
    pub stack: Option<String>,
    pub fields: Vec<Field>,
}

impl Entry {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            level,
            logger_name: None,
            caller: None,
            message: message.into(),
            stack: None,
            fields: Vec::new(),
        }
    }

    pub fn with_logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger_name = Some(name.into());
        self
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_stack(mut self, stack: String) -> Self {
        self.stack = Some(stack);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }
}

/// Symbol prefixes of frames that belong to stack capture, to this crate's
/// logging path or to the facades feeding it.
const INTERNAL_FRAME_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "__rust",
    "scoped_log::core::log_entry::capture_stack",
    "scoped_log::core::logger::Logger",
    "scoped_log::core::registry::FunctionTable",
    "scoped_log::core::bridge::LogBridge",
    "scoped_log::core::bridge::TracingBridge",
    "log::",
    "tracing::",
    "tracing_core::",
    "tracing_subscriber::",
];

/// Capture the current stack starting at the code that made the log call.
///
/// Leading capture and logging frames are recognized by symbol, then
/// `caller_skip` further wrapper frames are dropped. Falls back to the
/// untrimmed text when trimming would leave nothing.
pub fn capture_stack(caller_skip: usize) -> String {
    let backtrace = Backtrace::force_capture();
    let text = backtrace.to_string();
    if backtrace.status() != BacktraceStatus::Captured {
        return text;
    }

    let trimmed = trim_frames(&text, caller_skip);
    if trimmed.trim().is_empty() {
        text.trim_end().to_string()
    } else {
        trimmed
    }
}

/// One rendered frame: its header line and any `at file:line` lines.
struct Frame<'a> {
    symbol: &'a str,
    lines: Vec<&'a str>,
}

fn split_frames(text: &str) -> Vec<Frame<'_>> {
    let mut frames: Vec<Frame<'_>> = Vec::new();
    for line in text.lines() {
        match frame_symbol(line) {
            Some(symbol) => frames.push(Frame {
                symbol,
                lines: vec![line],
            }),
            // text before the first header is treated as its own frame
            None => match frames.last_mut() {
                Some(frame) => frame.lines.push(line),
                None => frames.push(Frame {
                    symbol: "",
                    lines: vec![line],
                }),
            },
        }
    }
    frames
}

fn is_internal_frame(frame: &Frame<'_>) -> bool {
    let symbol = frame.symbol.trim_start_matches('<');
    symbol.is_empty()
        || INTERNAL_FRAME_PREFIXES
            .iter()
            .any(|prefix| symbol.starts_with(prefix))
}

/// Drop leading internal frames, then `caller_skip` more.
fn trim_frames(text: &str, caller_skip: usize) -> String {
    let frames = split_frames(text);
    let first_external = frames
        .iter()
        .position(|frame| !is_internal_frame(frame))
        .unwrap_or(frames.len());

    frames
        .iter()
        .skip(first_external + caller_skip)
        .flat_map(|frame| frame.lines.iter().copied())
        .collect::<Vec<_>>()
        .join("\n")
}

// frame headers look like "  12: crate::module::function"
fn frame_symbol(line: &str) -> Option<&str> {
    let (index, symbol) = line.trim_start().split_once(": ")?;
    (!index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())).then_some(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_file_drops_directories() {
        let caller = Caller::new("src/core/logger.rs", 42);
        assert_eq!(caller.short_file(), "logger.rs");
        assert_eq!(caller.to_string(), "logger.rs:42");

        let windows = Caller::new(r"C:\work\src\main.rs", 7);
        assert_eq!(windows.to_string(), "main.rs:7");
    }

    #[test]
    fn test_here_points_at_this_file() {
        let caller = Caller::here();
        assert_eq!(caller.short_file(), "log_entry.rs");
        assert!(caller.line > 0);
    }

    const RENDERED: &str = "   0: std::backtrace::Backtrace::force_capture
             at /rustc/library/std/src/backtrace.rs:312:9
   1: scoped_log::core::log_entry::capture_stack
   2: <scoped_log::core::logger::Logger>::error
   3: scoped_log::error
   4: app::handler::respond
             at src/handler.rs:31:5
   5: app::main
   6: core::ops::function::FnOnce::call_once";

    #[test]
    fn test_trim_frames_starts_at_caller() {
        let trimmed = trim_frames(RENDERED, 0);
        assert!(trimmed.starts_with("   3: scoped_log::error"), "{trimmed}");

        let trimmed = trim_frames(RENDERED, 1);
        assert!(trimmed.starts_with("   4: app::handler::respond\n"), "{trimmed}");
        assert!(trimmed.contains("at src/handler.rs:31:5"));
        assert!(trimmed.ends_with("   6: core::ops::function::FnOnce::call_once"));
    }

    #[test]
    fn test_trim_frames_bridge_path() {
        let text = "   0: scoped_log::core::log_entry::capture_stack
   1: scoped_log::core::registry::FunctionTable::emit_external
   2: <scoped_log::core::bridge::TracingBridge as tracing_subscriber::layer::Layer<S>>::on_event
   3: <tracing_subscriber::layer::layered::Layered<L,S> as tracing_core::subscriber::Subscriber>::event
   4: tracing_core::dispatcher::get_default::{{closure}}
   5: std::thread::local::LocalKey<T>::try_with
   6: app::worker::run::{{closure}}
   7: app::worker::run";
        assert!(trim_frames(text, 0).starts_with("   6: app::worker::run::{{closure}}"));
    }

    #[test]
    fn test_trim_frames_past_end() {
        assert_eq!(trim_frames(RENDERED, 10), "");
    }

    #[test]
    fn test_capture_stack_not_empty() {
        assert!(!capture_stack(0).is_empty());
        assert!(!capture_stack(10_000).is_empty());
    }

    #[test]
    fn test_builder_fields() {
        let entry = Entry::new(Level::Warn, "disk low")
            .with_logger_name("storage")
            .with_field("free_mb", 12i64);

        assert_eq!(entry.logger_name.as_deref(), Some("storage"));
        assert_eq!(entry.fields, vec![("free_mb".to_string(), FieldValue::I64(12))]);
        assert!(entry.caller.is_none());
        assert!(entry.stack.is_none());
    }
}
