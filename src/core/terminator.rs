//! Process termination capability used by fatal logging

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

/// Exit status used after a fatal entry.
pub const FATAL_EXIT_CODE: i32 = 1;

/// How a fatal log call ends the process.
///
/// Production code uses [`ExitProcess`]; tests install a
/// [`RecordingTerminator`] through
/// [`Registry::set_terminator`](super::Registry::set_terminator).
pub trait ProcessTerminator: Send + Sync {
    fn terminate(&self, code: i32);
}

/// Ends the process with [`std::process::exit`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ExitProcess;

impl ProcessTerminator for ExitProcess {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Records termination requests instead of acting on them.
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    calls: AtomicUsize,
    last_code: AtomicI32,
}

impl RecordingTerminator {
    pub const fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_code: AtomicI32::new(0),
        }
    }

    /// Number of times termination was requested.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Code passed to the most recent request, 0 if none.
    pub fn last_code(&self) -> i32 {
        self.last_code.load(Ordering::SeqCst)
    }
}

impl ProcessTerminator for RecordingTerminator {
    fn terminate(&self, code: i32) {
        self.last_code.store(code, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}
