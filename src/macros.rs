//! Logging macros with `format!`-style arguments.
//!
//! Without a logger the macros write through the process-wide registry;
//! `logger: <expr>` selects a specific [`Logger`](crate::Logger). Arguments
//! are only formatted when the level is enabled.
//!
//! # Examples
//!
//! ```no_run
//! use scoped_log::{info, warn, Registry};
//!
//! let port = 8080;
//! info!("Server listening on port {}", port);
//!
//! let registry = Registry::new();
//! let logger = registry.new_logger("http");
//! warn!(logger: logger, "Retry attempt {} of {}", 3, 5);
//! ```

/// Log a debug-level message.
///
/// ```no_run
/// scoped_log::debug!("Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    (logger: $logger:expr, $($arg:tt)+) => {
        $logger.debugf(format_args!($($arg)+))
    };
    ($($arg:tt)+) => {
        $crate::debugf(format_args!($($arg)+))
    };
}

/// Log an info-level message.
///
/// ```no_run
/// scoped_log::info!("Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    (logger: $logger:expr, $($arg:tt)+) => {
        $logger.infof(format_args!($($arg)+))
    };
    ($($arg:tt)+) => {
        $crate::infof(format_args!($($arg)+))
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    (logger: $logger:expr, $($arg:tt)+) => {
        $logger.warnf(format_args!($($arg)+))
    };
    ($($arg:tt)+) => {
        $crate::warnf(format_args!($($arg)+))
    };
}

/// Log an error-level message.
///
/// ```no_run
/// scoped_log::error!("Failed to connect: {}", "timeout");
/// ```
#[macro_export]
macro_rules! error {
    (logger: $logger:expr, $($arg:tt)+) => {
        $logger.errorf(format_args!($($arg)+))
    };
    ($($arg:tt)+) => {
        $crate::errorf(format_args!($($arg)+))
    };
}

/// Log a fatal message, flush, and exit the process with status 1.
#[macro_export]
macro_rules! fatal {
    (logger: $logger:expr, $($arg:tt)+) => {
        $logger.fatalf(format_args!($($arg)+))
    };
    ($($arg:tt)+) => {
        $crate::fatalf(format_args!($($arg)+))
    };
}
