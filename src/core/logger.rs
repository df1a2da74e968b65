//! Logger with atomically adjustable thresholds
//!
//! A [`Logger`] owns three settings: the output level, the stack trace level
//! and the caller-logging flag. Each is an independent atomic, so they can be
//! changed from any thread while other threads are logging. There is no lock
//! across the three; a log call racing an update may see any mix of old and
//! new values, and the last writer of each setting wins.
//!
//! Emitted entries go through the function table currently installed in the
//! logger's [`Registry`].

use super::log_entry::{capture_stack, Caller, Entry};
use super::log_level::Level;
use super::registry::{FunctionTable, Registry};
use super::terminator::{ExitProcess, ProcessTerminator, FATAL_EXIT_CODE};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Weak;

/// Name of the logger behind the free functions; never printed.
pub const DEFAULT_LOGGER_NAME: &str = "default";

/// Leveled logger writing through its registry's installed function table.
///
/// Obtain one from [`Registry::default_logger`] or [`Registry::new_logger`].
pub struct Logger {
    name: String,
    /// Wrapper frames between user code and this logger's methods, dropped
    /// from captured stacks
    caller_skip: usize,

    output_level: AtomicU8,
    stack_trace_level: AtomicU8,
    log_callers: AtomicBool,

    registry: Weak<Registry>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("output_level", &self.output_level())
            .field("stack_trace_level", &self.stack_trace_level())
            .field("log_callers", &self.log_callers())
            .finish()
    }
}

impl Logger {
    pub(crate) fn new(name: impl Into<String>, caller_skip: usize, registry: Weak<Registry>) -> Self {
        Self {
            name: name.into(),
            caller_skip,
            output_level: AtomicU8::new(Level::Info as u8),
            stack_trace_level: AtomicU8::new(Level::None as u8),
            log_callers: AtomicBool::new(false),
            registry,
        }
    }

    /// A logger attached to no registry. Its writes go nowhere; fatal calls
    /// still end the process.
    pub fn detached(name: impl Into<String>) -> Self {
        Self::new(name, 0, Weak::new())
    }

    /// Scope printed on every entry, unless this is the default logger.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn caller_skip(&self) -> usize {
        self.caller_skip
    }

    /// Adjusts the output level associated with this logger.
    pub fn set_output_level(&self, level: Level) {
        self.output_level.store(level as u8, Ordering::Relaxed);
    }

    /// Current output level.
    pub fn output_level(&self) -> Level {
        Level::from_u8(self.output_level.load(Ordering::Relaxed))
    }

    /// Adjusts the level at or above which entries carry a stack trace.
    pub fn set_stack_trace_level(&self, level: Level) {
        self.stack_trace_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn stack_trace_level(&self) -> Level {
        Level::from_u8(self.stack_trace_level.load(Ordering::Relaxed))
    }

    /// Turn the `file:line` annotation on or off.
    pub fn set_log_callers(&self, log_callers: bool) {
        self.log_callers.store(log_callers, Ordering::Relaxed);
    }

    pub fn log_callers(&self) -> bool {
        self.log_callers.load(Ordering::Relaxed)
    }

    /// Whether output at `level` is currently enabled.
    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        self.output_level().permits(level)
    }

    /// Whether debug output is currently written.
    #[inline]
    pub fn debug_enabled(&self) -> bool {
        self.enabled(Level::Debug)
    }

    /// Whether info output is currently written.
    #[inline]
    pub fn info_enabled(&self) -> bool {
        self.enabled(Level::Info)
    }

    /// Whether warning output is currently written.
    #[inline]
    pub fn warn_enabled(&self) -> bool {
        self.enabled(Level::Warn)
    }

    /// Whether error output is currently written.
    #[inline]
    pub fn error_enabled(&self) -> bool {
        self.enabled(Level::Error)
    }

    /// Whether fatal output is currently written. Fatal calls exit either way.
    #[inline]
    pub fn fatal_enabled(&self) -> bool {
        self.enabled(Level::Fatal)
    }

    /// Log a debug-level message.
    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        if self.debug_enabled() {
            self.output(Level::Debug, message.to_string());
        }
    }

    /// Formatted variant; the arguments are only rendered when enabled.
    #[track_caller]
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        if self.debug_enabled() {
            self.output(Level::Debug, fmt::format(args));
        }
    }

    /// Log an info-level message.
    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        if self.info_enabled() {
            self.output(Level::Info, message.to_string());
        }
    }

    /// Log a formatted info-level message.
    #[track_caller]
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        if self.info_enabled() {
            self.output(Level::Info, fmt::format(args));
        }
    }

    /// Log a warning-level message.
    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) {
        if self.warn_enabled() {
            self.output(Level::Warn, message.to_string());
        }
    }

    /// Log a formatted warning-level message.
    #[track_caller]
    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        if self.warn_enabled() {
            self.output(Level::Warn, fmt::format(args));
        }
    }

    /// Log an error-level message.
    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        if self.error_enabled() {
            self.output(Level::Error, message.to_string());
        }
    }

    /// Log a formatted error-level message.
    #[track_caller]
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        if self.error_enabled() {
            self.output(Level::Error, fmt::format(args));
        }
    }

    /// Write at fatal level (if enabled), flush, then end the process with
    /// status 1.
    ///
    /// Termination happens on every call, whether or not the output level
    /// let the message through.
    #[track_caller]
    pub fn fatal(&self, message: impl fmt::Display) {
        let message = if self.fatal_enabled() {
            Some(message.to_string())
        } else {
            None
        };
        self.fatal_output(message);
    }

    /// Formatted variant of [`Logger::fatal`].
    #[track_caller]
    pub fn fatalf(&self, args: fmt::Arguments<'_>) {
        let message = if self.fatal_enabled() {
            Some(fmt::format(args))
        } else {
            None
        };
        self.fatal_output(message);
    }

    #[track_caller]
    fn output(&self, level: Level, message: String) {
        if let Some(registry) = self.registry.upgrade() {
            let table = registry.table();
            self.write_with(&table, level, message);
        }
    }

    #[track_caller]
    fn fatal_output(&self, message: Option<String>) {
        let Some(registry) = self.registry.upgrade() else {
            ExitProcess.terminate(FATAL_EXIT_CODE);
            return;
        };

        // one snapshot for both the write and the exit
        let table = registry.table();
        if let Some(message) = message {
            self.write_with(&table, Level::Fatal, message);
        }
        table.exit_after_fatal();
    }

    #[track_caller]
    fn write_with(&self, table: &FunctionTable, level: Level, message: String) {
        let entry = self.build_entry(level, message);
        if let Err(err) = table.write(&entry) {
            table.report_write_error(&err);
        }
    }

    #[track_caller]
    fn build_entry(&self, level: Level, message: String) -> Entry {
        let mut entry = Entry::new(level, message);
        if self.name != DEFAULT_LOGGER_NAME {
            entry.logger_name = Some(self.name.clone());
        }
        if self.log_callers() {
            entry.caller = Some(Caller::here());
        }
        if self.stack_trace_level().permits(level) {
            entry.stack = Some(capture_stack(self.caller_skip));
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::Options;
    use crate::core::terminator::RecordingTerminator;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn configured(dir: &tempfile::TempDir) -> (Arc<Registry>, Arc<RecordingTerminator>, std::path::PathBuf) {
        let path = dir.path().join("logger.log");
        let registry = Registry::new();
        let terminator = Arc::new(RecordingTerminator::new());
        registry.set_terminator(terminator.clone());
        registry
            .configure(&Options::default().with_output_path(path.to_str().unwrap()))
            .unwrap();
        (registry, terminator, path)
    }

    #[test]
    fn test_defaults() {
        let logger = Logger::detached("x");
        assert_eq!(logger.output_level(), Level::Info);
        assert_eq!(logger.stack_trace_level(), Level::None);
        assert!(!logger.log_callers());
        assert!(logger.info_enabled());
        assert!(!logger.debug_enabled());
    }

    #[test]
    fn test_enabled_matrix() {
        let logger = Logger::detached("x");
        for threshold in Level::ALL {
            logger.set_output_level(threshold);
            assert_eq!(logger.debug_enabled(), threshold >= Level::Debug);
            assert_eq!(logger.info_enabled(), threshold >= Level::Info);
            assert_eq!(logger.warn_enabled(), threshold >= Level::Warn);
            assert_eq!(logger.error_enabled(), threshold >= Level::Error);
            assert_eq!(logger.fatal_enabled(), threshold >= Level::Fatal);
        }
    }

    #[test]
    fn test_named_logger_prints_scope() {
        let dir = tempdir().unwrap();
        let (registry, _, path) = configured(&dir);
        let logger = registry.new_logger("beep");

        logger.info("Hello");
        logger.infof(format_args!("{}-{}", "Hello", 2));
        registry.sync().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("\tinfo\tbeep\tHello"));
        assert!(lines[1].ends_with("\tinfo\tbeep\tHello-2"));
    }

    #[test]
    fn test_caller_points_at_call_site() {
        let dir = tempdir().unwrap();
        let (registry, _, path) = configured(&dir);
        let logger = registry.default_logger();
        logger.set_log_callers(true);

        let line = line!() + 1;
        logger.warn("here");
        registry.sync().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(
            content.contains(&format!("\twarn\tlogger.rs:{}\there", line)),
            "{content}"
        );
    }

    #[test]
    fn test_disabled_levels_write_nothing() {
        let dir = tempdir().unwrap();
        let (registry, _, path) = configured(&dir);
        let logger = registry.default_logger();
        logger.set_output_level(Level::Error);

        logger.debug("d");
        logger.info("i");
        logger.warn("w");
        logger.error("e");
        registry.sync().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\terror\te"));
    }

    #[test]
    fn test_fatal_terminates_once_even_when_suppressed() {
        let dir = tempdir().unwrap();
        let (registry, terminator, path) = configured(&dir);
        let logger = registry.default_logger();

        logger.fatal("boom");
        assert_eq!(terminator.calls(), 1);
        assert_eq!(terminator.last_code(), FATAL_EXIT_CODE);

        logger.set_output_level(Level::None);
        logger.fatalf(format_args!("quiet {}", 1));
        assert_eq!(terminator.calls(), 2);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\tfatal\tboom"));
    }

    #[inline(never)]
    fn log_error_from_helper(logger: &Logger) {
        logger.error("with stack");
    }

    #[test]
    fn test_stack_starts_at_calling_function() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stack.log");
        let registry = Registry::new();
        registry
            .configure(
                &Options::default()
                    .with_output_path(path.to_str().unwrap())
                    .with_stack_trace_level("error")
                    .with_json_encoding(true),
            )
            .unwrap();

        log_error_from_helper(registry.default_logger());
        registry.sync().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim_end()).unwrap();
        let stack = parsed["stack"].as_str().unwrap();
        let first_frame = stack.lines().next().unwrap();
        assert!(first_frame.contains("log_error_from_helper"), "{stack}");
        assert!(!stack.contains("capture_stack"), "{stack}");
        assert!(stack.contains("test_stack_starts_at_calling_function"), "{stack}");
    }

    #[test]
    fn test_stack_trace_threshold() {
        let dir = tempdir().unwrap();
        let (registry, _, path) = configured(&dir);
        let logger = registry.default_logger();
        logger.set_output_level(Level::Debug);
        logger.set_stack_trace_level(Level::Error);

        logger.warn("no stack");
        logger.error("with stack");
        registry.sync().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let warn_line = lines.next().unwrap();
        assert!(warn_line.ends_with("\twarn\tno stack"));
        let error_line = lines.next().unwrap();
        assert!(error_line.contains("\terror\twith stack\t"));
    }
}
