//! # Scoped Log
//!
//! Process-wide structured logging that can be reconfigured while other
//! threads are logging.
//!
//! ## Features
//!
//! - **Runtime thresholds**: output level, stack trace level and caller
//!   logging are atomics, adjustable at any time
//! - **Hot reconfiguration**: [`configure`] builds a complete new pipeline and
//!   swaps it in atomically; a failed call changes nothing
//! - **Console or JSON lines** with a fixed-width microsecond UTC timestamp
//! - **Rotating file output** bounded by size, age and backup count
//! - **Flag binding** through `clap`
//! - **Facade capture**: records sent through `log` and `tracing` land in the
//!   same sinks
//!
//! ## Example
//!
//! ```no_run
//! use scoped_log::Options;
//!
//! scoped_log::configure(&Options::default().with_output_level("debug")).unwrap();
//! scoped_log::info("server started");
//! scoped_log::debug!("listening on port {}", 8080);
//! scoped_log::sync().unwrap();
//! ```

pub mod core;
pub mod macros;
pub mod pipeline;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        Level, Logger, LoggerError, Options, ProcessTerminator, Registry, Result,
    };
}

pub use crate::core::{
    Caller, Encoder, Entry, ExitProcess, Field, FieldValue, Level, LogBridge, Logger, LoggerError,
    Options, ProcessTerminator, RecordingTerminator, Registry, Result, TracingBridge,
    DEFAULT_LOGGER_NAME, FATAL_EXIT_CODE,
};

use std::fmt;
use std::sync::Arc;

/// Apply `options` to the process-wide registry.
///
/// The first successful call also redirects the `log` and `tracing` facades
/// into this crate's sinks, unless the application installed its own.
///
/// # Errors
///
/// See [`Registry::configure`]. On error the previous configuration stays in
/// effect.
pub fn configure(options: &Options) -> Result<()> {
    Registry::global().configure(options)
}

/// Flush the process-wide sinks.
pub fn sync() -> Result<()> {
    Registry::global().sync()
}

/// Flush and release the process-wide output sinks.
pub fn close() -> Result<()> {
    Registry::global().close()
}

/// A named logger on the process-wide registry.
pub fn logger(name: impl Into<String>) -> Arc<Logger> {
    Registry::global().new_logger(name)
}

fn default_logger() -> &'static Logger {
    Registry::global().default_logger()
}

/// Log a debug-level message on the process-wide default logger.
// one real frame, popped by the default logger's caller skip
#[inline(never)]
#[track_caller]
pub fn debug(message: impl fmt::Display) {
    default_logger().debug(message);
}

/// Log a formatted debug-level message; see [`debug!`] for the macro form.
#[inline(never)]
#[track_caller]
pub fn debugf(args: fmt::Arguments<'_>) {
    default_logger().debugf(args);
}

/// Log an info-level message on the process-wide default logger.
#[inline(never)]
#[track_caller]
pub fn info(message: impl fmt::Display) {
    default_logger().info(message);
}

/// Log a formatted info-level message.
#[inline(never)]
#[track_caller]
pub fn infof(args: fmt::Arguments<'_>) {
    default_logger().infof(args);
}

/// Log a warning-level message on the process-wide default logger.
#[inline(never)]
#[track_caller]
pub fn warn(message: impl fmt::Display) {
    default_logger().warn(message);
}

/// Log a formatted warning-level message.
#[inline(never)]
#[track_caller]
pub fn warnf(args: fmt::Arguments<'_>) {
    default_logger().warnf(args);
}

/// Log an error-level message on the process-wide default logger.
#[inline(never)]
#[track_caller]
pub fn error(message: impl fmt::Display) {
    default_logger().error(message);
}

/// Log a formatted error-level message.
#[inline(never)]
#[track_caller]
pub fn errorf(args: fmt::Arguments<'_>) {
    default_logger().errorf(args);
}

/// Log at fatal level, flush, and exit the process with status 1.
#[inline(never)]
#[track_caller]
pub fn fatal(message: impl fmt::Display) {
    default_logger().fatal(message);
}

/// Formatted variant of [`fatal`].
#[inline(never)]
#[track_caller]
pub fn fatalf(args: fmt::Arguments<'_>) {
    default_logger().fatalf(args);
}

/// Whether debug output is currently written by the default logger.
pub fn debug_enabled() -> bool {
    default_logger().debug_enabled()
}

/// Whether info output is currently written by the default logger.
pub fn info_enabled() -> bool {
    default_logger().info_enabled()
}

/// Whether warning output is currently written by the default logger.
pub fn warn_enabled() -> bool {
    default_logger().warn_enabled()
}

/// Whether error output is currently written by the default logger.
pub fn error_enabled() -> bool {
    default_logger().error_enabled()
}

/// Whether fatal output is currently written by the default logger.
pub fn fatal_enabled() -> bool {
    default_logger().fatal_enabled()
}
