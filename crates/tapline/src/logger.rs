//! Result logger - turns outcomes into TAP lines
//!
//! The logger owns the run counters and the line sink. Everything that ends
//! up in the report goes through it: the header, test comments, assertion
//! results with their diagnostic blocks, and the closing summary.

use crate::fault::Fault;
use crate::format;
use crate::sink::LineSink;
use crate::stack::StackCleaner;

/// TAP version line opening every report
pub const TAP_HEADER: &str = "TAP version 13";

/// Counters for one run; only ever incremented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Next registry index to dequeue
    pub test_index: usize,
    /// Ordinal of the last emitted assertion line
    pub assert_index: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Final tallies of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    /// Size of the TAP plan
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// Check if nothing failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Status handed to the terminator
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Metadata printed under a failing result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostic {
    pub operator: &'static str,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl Diagnostic {
    pub fn new(operator: &'static str) -> Self {
        Self {
            operator,
            expected: None,
            actual: None,
        }
    }

    /// Attach an already rendered expected value
    pub fn expected(mut self, rendered: String) -> Self {
        self.expected = Some(rendered);
        self
    }

    /// Attach an already rendered actual value
    pub fn actual(mut self, rendered: String) -> Self {
        self.actual = Some(rendered);
        self
    }
}

/// Writes the TAP stream and keeps the run counters
pub struct ResultLogger {
    sink: Box<dyn LineSink>,
    counters: RunCounters,
    stacks: StackCleaner,
    capture_stack: bool,
}

impl ResultLogger {
    pub fn new(sink: Box<dyn LineSink>, stacks: StackCleaner, capture_stack: bool) -> Self {
        Self {
            sink,
            counters: RunCounters::default(),
            stacks,
            capture_stack,
        }
    }

    /// Snapshot of the counters
    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    fn emit(&mut self, line: &str) {
        self.sink.write_line(line);
    }

    /// Emit the `TAP version 13` line
    pub fn header(&mut self) {
        self.emit(TAP_HEADER);
    }

    /// Registry index to dequeue next; advances unconditionally
    pub fn next_test(&mut self) -> usize {
        let index = self.counters.test_index;
        self.counters.test_index += 1;
        index
    }

    /// Emit `# <name>` before a test runs
    pub fn test_started(&mut self, name: &str) {
        self.emit(&format!("# {}", name));
    }

    /// Emit `# skip <name>` and count the skip
    pub fn test_skipped(&mut self, name: &str) {
        self.counters.skipped += 1;
        self.emit(&format!("# skip {}", name));
    }

    /// Record one assertion outcome and return its ordinal
    pub fn record(&mut self, ok: bool, message: &str, diagnostic: Diagnostic) -> usize {
        self.counters.assert_index += 1;
        let ordinal = self.counters.assert_index;
        tracing::trace!(ordinal, ok, operator = diagnostic.operator, "assertion");

        if ok {
            self.counters.passed += 1;
            self.emit(&format!("ok {} — {}", ordinal, message));
        } else {
            self.counters.failed += 1;
            self.emit(&format!("not ok {} — {}", ordinal, message));

            let stack = if self.capture_stack {
                self.stacks.capture()
            } else {
                Vec::new()
            };
            self.diagnostic_block(&diagnostic, &stack);
        }

        ordinal
    }

    /// Record a fault that escaped a test function
    pub fn fault(&mut self, fault: &Fault) -> usize {
        self.counters.assert_index += 1;
        self.counters.failed += 1;
        let ordinal = self.counters.assert_index;

        self.emit(&format!("not ok {} — {}", ordinal, fault));

        let stack = match fault.backtrace() {
            Some(backtrace) if self.capture_stack => self.stacks.clean(&backtrace.to_string()),
            _ => Vec::new(),
        };
        self.diagnostic_block(&Diagnostic::new("error"), &stack);

        ordinal
    }

    fn diagnostic_block(&mut self, diagnostic: &Diagnostic, stack: &[String]) {
        self.emit("  ---");
        self.emit(&format!("  operator: {}", diagnostic.operator));
        if let Some(expected) = &diagnostic.expected {
            self.emit(&format::labelled("expected", expected));
        }
        if let Some(actual) = &diagnostic.actual {
            self.emit(&format::labelled("actual", actual));
        }
        self.emit("  stack:");
        for frame in stack {
            self.emit(&format!("    {}", frame));
        }
        self.emit("  ...");
    }

    /// Emit the plan and counts, returning the final tallies
    pub fn summarize(&mut self) -> Summary {
        let summary = Summary {
            passed: self.counters.passed,
            failed: self.counters.failed,
            skipped: self.counters.skipped,
        };

        self.emit("");
        self.emit(&format!("1..{}", summary.total()));
        self.emit(&format!("# tests {}", summary.total()));
        if summary.passed > 0 {
            self.emit(&format!("# pass {}", summary.passed));
        }
        if summary.failed > 0 {
            self.emit(&format!("# fail {}", summary.failed));
        }
        if summary.skipped > 0 {
            self.emit(&format!("# skip {}", summary.skipped));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CaptureSink;
    use pretty_assertions::assert_eq;

    fn logger() -> (ResultLogger, CaptureSink) {
        let capture = CaptureSink::new();
        let logger = ResultLogger::new(Box::new(capture.clone()), StackCleaner::default(), false);
        (logger, capture)
    }

    #[test]
    fn test_pass_line() {
        let (mut logger, capture) = logger();
        let ordinal = logger.record(true, "works", Diagnostic::new("pass"));

        assert_eq!(ordinal, 1);
        assert_eq!(capture.lines(), vec!["ok 1 — works"]);
        assert_eq!(logger.counters().passed, 1);
    }

    #[test]
    fn test_fail_line_with_diagnostic_block() {
        let (mut logger, capture) = logger();
        logger.record(
            false,
            "should be equal",
            Diagnostic::new("equal")
                .expected("2".to_string())
                .actual("3".to_string()),
        );

        assert_eq!(
            capture.lines(),
            vec![
                "not ok 1 — should be equal",
                "  ---",
                "  operator: equal",
                "  expected: 2",
                "  actual: 3",
                "  stack:",
                "  ...",
            ]
        );
        assert_eq!(logger.counters().failed, 1);
    }

    #[test]
    fn test_ordinals_are_shared_and_increasing() {
        let (mut logger, _capture) = logger();
        let first = logger.record(true, "a", Diagnostic::new("pass"));
        let second = logger.record(false, "b", Diagnostic::new("fail"));
        let third = logger.fault(&Fault::msg("boom"));

        assert_eq!((first, second, third), (1, 2, 3));
        assert_eq!(logger.counters().assert_index, 3);
    }

    #[test]
    fn test_fault_line_uses_error_operator() {
        let (mut logger, capture) = logger();
        logger.fault(&Fault::msg("boom"));

        let lines = capture.lines();
        assert_eq!(lines[0], "not ok 1 — Error: boom");
        assert_eq!(lines[2], "  operator: error");
    }

    #[test]
    fn test_summary_omits_zero_counts() {
        let (mut logger, capture) = logger();
        logger.record(true, "a", Diagnostic::new("pass"));
        logger.test_skipped("later");
        let summary = logger.summarize();

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(
            capture.lines(),
            vec!["ok 1 — a", "# skip later", "", "1..2", "# tests 2", "# pass 1", "# skip 1"]
        );
    }

    #[test]
    fn test_summary_exit_code_on_failure() {
        let summary = Summary {
            passed: 3,
            failed: 1,
            skipped: 0,
        };
        assert!(!summary.is_success());
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn test_next_test_advances() {
        let (mut logger, _capture) = logger();
        assert_eq!(logger.next_test(), 0);
        assert_eq!(logger.next_test(), 1);
        assert_eq!(logger.counters().test_index, 2);
    }
}
