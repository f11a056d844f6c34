//! Process terminators: how a finished run reports its status to the host

use std::cell::Cell;
use std::rc::Rc;

/// Signals the run's exit status once it has finished
pub trait Terminator {
    /// Called exactly once, after the summary, with 0 or 1
    fn terminate(&mut self, code: i32);
}

/// Exits the process with the run status
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&mut self, code: i32) {
        tracing::debug!(code, "exiting process");
        std::process::exit(code);
    }
}

/// For hosts without a process to exit
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTerminator;

impl Terminator for NoopTerminator {
    fn terminate(&mut self, code: i32) {
        tracing::debug!(code, "run finished; no process to terminate");
    }
}

/// Remembers the requested status instead of exiting
#[derive(Debug, Default, Clone)]
pub struct RecordingTerminator {
    code: Rc<Cell<Option<i32>>>,
}

impl RecordingTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status passed to `terminate`, if it has been called
    pub fn code(&self) -> Option<i32> {
        self.code.get()
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&mut self, code: i32) {
        self.code.set(Some(code));
    }
}
