//! Line sinks: where the TAP stream goes
//!
//! The engine only ever writes whole lines of text. Hosts choose whether
//! those lines reach stdout or an in-memory buffer.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Receives the report one line at a time
pub trait LineSink {
    /// Write one line of the report, without a trailing newline
    fn write_line(&mut self, line: &str);
}

/// Writes the report to the process's standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn write_line(&mut self, line: &str) {
        let mut stdout = io::stdout().lock();
        if let Err(error) = writeln!(stdout, "{}", line).and_then(|_| stdout.flush()) {
            tracing::warn!(%error, "failed to write report line to stdout");
        }
    }
}

/// Collects the report in memory
///
/// Clones share one buffer, so a host can hand one clone to the harness and
/// read the transcript through another.
#[derive(Debug, Default, Clone)]
pub struct CaptureSink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl CaptureSink {
    /// Create an empty capture buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// The transcript joined with newlines
    pub fn text(&self) -> String {
        self.lines.borrow().join("\n")
    }

    /// Check whether any written line equals `line`
    pub fn contains_line(&self, line: &str) -> bool {
        self.lines.borrow().iter().any(|l| l == line)
    }
}

impl LineSink for CaptureSink {
    fn write_line(&mut self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}
