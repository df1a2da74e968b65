//! Process-wide registry and its swappable function table
//!
//! The registry owns the default [`Logger`] and a single register holding the
//! installed [`FunctionTable`]. A table is never mutated after it is
//! installed; `configure` builds a complete replacement and swaps it in, so a
//! log call sees either the old table or the new one, never a mix.

use super::bridge;
use super::error::{LoggerError, Result};
use super::field::Field;
use super::log_core::LogCore;
use super::log_entry::{capture_stack, Caller, Entry};
use super::log_level::Level;
use super::logger::{Logger, DEFAULT_LOGGER_NAME};
use super::options::Options;
use super::terminator::{ExitProcess, ProcessTerminator, FATAL_EXIT_CODE};
use super::timestamp::format_timestamp;
use crate::pipeline::{build_pipeline, Pipeline};
use crate::sinks::Sink;
use arc_swap::{ArcSwap, Guard};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Once, OnceLock};

/// Caller and stack settings applied to entries arriving through the
/// facade bridges, captured at the last `configure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleSettings {
    pub log_callers: bool,
    pub stack_trace_level: Level,
}

impl HandleSettings {
    fn none() -> Self {
        Self {
            log_callers: false,
            stack_trace_level: Level::None,
        }
    }
}

/// One immutable snapshot of write/sync/exit/close behavior.
#[derive(Clone)]
pub struct FunctionTable {
    always_on: LogCore,
    conditional: LogCore,
    handle: HandleSettings,
    error_sink: Arc<dyn Sink>,
    terminator: Arc<dyn ProcessTerminator>,
    outputs: Vec<Arc<dyn Sink>>,
}

impl FunctionTable {
    fn new(
        pipeline: Pipeline,
        handle: HandleSettings,
        terminator: Arc<dyn ProcessTerminator>,
    ) -> Self {
        Self {
            always_on: pipeline.always_on,
            conditional: pipeline.conditional,
            handle,
            error_sink: pipeline.error_sink,
            terminator,
            outputs: pipeline.outputs,
        }
    }

    /// Encode and write an entry whose level the caller already checked.
    pub fn write(&self, entry: &Entry) -> Result<()> {
        self.always_on.write(entry)
    }

    pub fn sync(&self) -> Result<()> {
        self.always_on.sync()
    }

    /// Flush, then end the process if fatal entries are accepted at all.
    pub fn exit_after_fatal(&self) {
        if let Err(err) = self.sync() {
            self.report_write_error(&err);
        }
        if self.always_on.enabled(Level::Fatal) {
            self.terminator.terminate(FATAL_EXIT_CODE);
        }
    }

    /// Flush and release every output sink.
    ///
    /// The error sink stays open so later failures can still be reported.
    pub fn close(&self) -> Result<()> {
        let mut first_err = self.sync().err();
        for sink in &self.outputs {
            if let Err(err) = sink.close() {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Best-effort diagnostic line on the error sink.
    pub fn report_write_error(&self, err: &LoggerError) {
        let line = format!("{} log write error: {}\n", format_timestamp(&Utc::now()), err);
        let _ = self.error_sink.write_all(line.as_bytes());
        let _ = self.error_sink.sync();
    }

    /// Whether an entry from a facade bridge at `level` would be written.
    pub fn external_enabled(&self, level: Level) -> bool {
        self.conditional.enabled(level)
    }

    /// Write an entry that arrived through a facade bridge.
    pub fn emit_external(
        &self,
        level: Level,
        message: String,
        caller: Option<Caller>,
        fields: Vec<Field>,
    ) {
        if !self.external_enabled(level) {
            return;
        }

        let mut entry = Entry::new(level, message);
        entry.fields = fields;
        if self.handle.log_callers {
            entry.caller = caller;
        }
        if self.handle.stack_trace_level.permits(level) {
            entry.stack = Some(capture_stack(0));
        }
        if let Err(err) = self.conditional.write(&entry) {
            self.report_write_error(&err);
        }
    }

    pub fn handle_settings(&self) -> HandleSettings {
        self.handle
    }

    fn with_terminator(&self, terminator: Arc<dyn ProcessTerminator>) -> Self {
        let mut table = self.clone();
        table.terminator = terminator;
        table
    }
}

/// Owner of the default logger and the installed function table.
///
/// The free functions of this crate use [`Registry::global`]. Tests create
/// their own instance with [`Registry::new`] so they never share state.
pub struct Registry {
    table: ArcSwap<FunctionTable>,
    default_logger: Arc<Logger>,
    terminator: RwLock<Arc<dyn ProcessTerminator>>,
    configure_lock: Mutex<()>,

    /// Redirect the `log` and `tracing` facades on the first `configure`
    capture_facades: bool,
    facades: Once,
}

impl Registry {
    /// A registry writing console lines to stdout at info level until
    /// configured.
    pub fn new() -> Arc<Self> {
        Self::build(false, 0)
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static Arc<Registry> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        // the crate-level free functions add one frame
        GLOBAL.get_or_init(|| Self::build(true, 1))
    }

    fn build(capture_facades: bool, caller_skip: usize) -> Arc<Self> {
        Arc::new_cyclic(|weak| {
            let default_logger = Arc::new(Logger::new(DEFAULT_LOGGER_NAME, caller_skip, weak.clone()));
            let terminator: Arc<dyn ProcessTerminator> = Arc::new(ExitProcess);
            let table = FunctionTable::new(
                Pipeline::stdio(default_logger.clone()),
                HandleSettings::none(),
                terminator.clone(),
            );

            Self {
                table: ArcSwap::from_pointee(table),
                default_logger,
                terminator: RwLock::new(terminator),
                configure_lock: Mutex::new(()),
                capture_facades,
                facades: Once::new(),
            }
        })
    }

    /// Apply `options`: validate the level names, assemble the sinks, then
    /// update the default logger and install the new function table.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidLevel`], [`LoggerError::SinkOpen`] or
    /// [`LoggerError::InvalidConfiguration`]. On error nothing changes: the
    /// levels and the installed table stay as they were.
    pub fn configure(self: &Arc<Self>, options: &Options) -> Result<()> {
        let _guard = self.configure_lock.lock();

        let output_level = options.parsed_output_level()?;
        let stack_trace_level = options.parsed_stack_trace_level()?;
        let pipeline = build_pipeline(options, self.default_logger.clone())?;

        let logger = &self.default_logger;
        logger.set_output_level(output_level);
        if let Some(level) = stack_trace_level {
            logger.set_stack_trace_level(level);
        }
        logger.set_log_callers(options.log_caller);

        let handle = HandleSettings {
            log_callers: options.log_caller,
            stack_trace_level: logger.stack_trace_level(),
        };
        let terminator = self.terminator.read().clone();
        let previous = self
            .table
            .swap(Arc::new(FunctionTable::new(pipeline, handle, terminator)));

        // writers still holding the previous table keep its sinks alive;
        // they are released when the last reference drops
        if let Err(err) = previous.sync() {
            self.table().report_write_error(&err);
        }
        drop(previous);

        if self.capture_facades {
            self.facades.call_once(|| bridge::install(self));
        }
        Ok(())
    }

    /// Flush the installed sinks.
    pub fn sync(&self) -> Result<()> {
        self.table().sync()
    }

    /// Flush and release the installed output sinks.
    ///
    /// Later writes fail and are reported on the error output until the next
    /// `configure`.
    pub fn close(&self) -> Result<()> {
        self.table().close()
    }

    /// Replace how fatal calls end the process. Survives later `configure`
    /// calls.
    pub fn set_terminator(&self, terminator: Arc<dyn ProcessTerminator>) {
        let _guard = self.configure_lock.lock();
        *self.terminator.write() = terminator.clone();
        let table = self.table().with_terminator(terminator);
        self.table.store(Arc::new(table));
    }

    /// The logger configured by [`Registry::configure`].
    pub fn default_logger(&self) -> &Arc<Logger> {
        &self.default_logger
    }

    /// A logger whose entries carry `name` as their scope.
    ///
    /// It starts with the default logger's current settings and is adjusted
    /// independently afterwards.
    pub fn new_logger(self: &Arc<Self>, name: impl Into<String>) -> Arc<Logger> {
        let logger = Logger::new(name, 0, Arc::downgrade(self));
        logger.set_output_level(self.default_logger.output_level());
        logger.set_stack_trace_level(self.default_logger.stack_trace_level());
        logger.set_log_callers(self.default_logger.log_callers());
        Arc::new(logger)
    }

    /// The installed function table.
    pub fn table(&self) -> Guard<Arc<FunctionTable>> {
        self.table.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::terminator::RecordingTerminator;
    use std::fs;
    use tempfile::tempdir;

    fn recording(registry: &Registry) -> Arc<RecordingTerminator> {
        let terminator = Arc::new(RecordingTerminator::new());
        registry.set_terminator(terminator.clone());
        terminator
    }

    #[test]
    fn test_unconfigured_defaults() {
        let registry = Registry::new();
        let logger = registry.default_logger();
        assert_eq!(logger.name(), DEFAULT_LOGGER_NAME);
        assert_eq!(logger.output_level(), Level::Info);
        assert_eq!(registry.table().handle_settings(), HandleSettings::none());
    }

    #[test]
    fn test_configure_applies_levels() -> Result<()> {
        let dir = tempdir()?;
        let registry = Registry::new();
        let options = Options::default()
            .with_output_path(dir.path().join("a.log").to_str().unwrap())
            .with_output_level("debug")
            .with_stack_trace_level("error")
            .with_log_caller(true);

        registry.configure(&options)?;

        let logger = registry.default_logger();
        assert_eq!(logger.output_level(), Level::Debug);
        assert_eq!(logger.stack_trace_level(), Level::Error);
        assert!(logger.log_callers());
        let handle = registry.table().handle_settings();
        assert!(handle.log_callers);
        assert_eq!(handle.stack_trace_level, Level::Error);
        Ok(())
    }

    #[test]
    fn test_empty_stack_trace_level_keeps_current() -> Result<()> {
        let dir = tempdir()?;
        let registry = Registry::new();
        let path = dir.path().join("a.log");
        registry.configure(
            &Options::default()
                .with_output_path(path.to_str().unwrap())
                .with_stack_trace_level("warn"),
        )?;
        registry.configure(
            &Options::default()
                .with_output_path(path.to_str().unwrap())
                .with_stack_trace_level(""),
        )?;
        assert_eq!(registry.default_logger().stack_trace_level(), Level::Warn);
        Ok(())
    }

    #[test]
    fn test_failed_configure_keeps_previous_state() -> Result<()> {
        let dir = tempdir()?;
        let registry = Registry::new();
        let good = dir.path().join("good.log");
        registry.configure(
            &Options::default()
                .with_output_path(good.to_str().unwrap())
                .with_output_level("warn"),
        )?;

        let bad_level = Options::default()
            .with_output_path(good.to_str().unwrap())
            .with_output_level("verbose");
        assert!(matches!(
            registry.configure(&bad_level),
            Err(LoggerError::InvalidLevel { .. })
        ));

        let bad_path = Options::default()
            .with_output_path(dir.path().join("no").join("such.log").to_str().unwrap())
            .with_output_level("debug");
        assert!(matches!(
            registry.configure(&bad_path),
            Err(LoggerError::SinkOpen { .. })
        ));

        assert_eq!(registry.default_logger().output_level(), Level::Warn);
        registry.default_logger().warn("still here");
        registry.sync()?;
        assert!(fs::read_to_string(&good)?.contains("\twarn\tstill here"));
        Ok(())
    }

    #[test]
    fn test_terminator_survives_configure() -> Result<()> {
        let dir = tempdir()?;
        let registry = Registry::new();
        let terminator = recording(&registry);
        registry.configure(
            &Options::default().with_output_path(dir.path().join("a.log").to_str().unwrap()),
        )?;

        registry.default_logger().fatal("bye");
        assert_eq!(terminator.calls(), 1);
        assert_eq!(terminator.last_code(), FATAL_EXIT_CODE);
        Ok(())
    }

    #[test]
    fn test_close_reports_later_writes() -> Result<()> {
        let dir = tempdir()?;
        let out = dir.path().join("out.log");
        let errors = dir.path().join("errors.log");
        let registry = Registry::new();
        registry.configure(
            &Options::default()
                .with_output_path(out.to_str().unwrap())
                .with_error_output_path(errors.to_str().unwrap()),
        )?;

        registry.default_logger().info("before close");
        registry.close()?;
        registry.default_logger().info("after close");

        assert!(fs::read_to_string(&out)?.contains("before close"));
        assert!(!fs::read_to_string(&out)?.contains("after close"));
        assert!(fs::read_to_string(&errors)?.contains("log write error"));
        Ok(())
    }

    #[test]
    fn test_emit_external_uses_handle_settings() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ext.log");
        let registry = Registry::new();
        registry.configure(
            &Options::default()
                .with_output_path(path.to_str().unwrap())
                .with_log_caller(true),
        )?;

        let table = registry.table();
        assert!(!table.external_enabled(Level::Debug));
        table.emit_external(Level::Debug, "hidden".to_string(), None, Vec::new());
        table.emit_external(
            Level::Info,
            "shown".to_string(),
            Some(Caller::new("src/ext.rs", 9)),
            vec![("k".to_string(), "v".into())],
        );
        table.sync()?;

        let content = fs::read_to_string(&path)?;
        assert!(!content.contains("hidden"));
        assert!(content.contains("\tinfo\text.rs:9\tshown\t{\"k\":\"v\"}"));
        Ok(())
    }
}
