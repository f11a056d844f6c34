//! Tapline - a sequential test harness that streams results as TAP
//!
//! Tests are registered on a [`Harness`] and run one at a time in
//! registration order. Each test receives an [`Assertions`] handle; every
//! assertion becomes one numbered `ok` / `not ok` line, and a failure carries
//! a YAML-ish diagnostic block. The run ends with the `1..N` plan, the
//! counts, and a call to the harness's [`Terminator`] with 0 or 1.
//!
//! # Example
//!
//! ```no_run
//! use tapline::{Expected, Fault, Harness};
//!
//! let harness = Harness::new();
//!
//! harness.test("arithmetic", |t| async move {
//!     t.equal(2 + 2, 4, None);
//!     t.ok(!"tap".is_empty(), "strings have length");
//! });
//!
//! harness.test("parsing", |t| async move {
//!     t.throws(|| "x".parse::<i32>(), Expected::kind("ParseIntError"), None);
//!     Ok::<(), Fault>(())
//! });
//!
//! harness.skip("not yet", |_t| async {});
//!
//! // Exits the process with the run status.
//! harness.run_blocking().ok();
//! ```
//!
//! # Selection
//!
//! - `skip` tests are reported as `# skip <name>` and never invoked
//! - once any `only` test is registered, plain tests are left out of the run
//!
//! The policy is fixed one scheduling tick after the first registration.

pub mod assert;
pub mod completion;
pub mod error;
pub mod fault;
pub mod format;
pub mod harness;
pub mod logger;
pub mod logging;
pub mod registry;
mod scheduler;
pub mod sink;
pub mod stack;
pub mod terminator;

pub use assert::{Assertions, Expected, Pattern, Truthy};
pub use completion::Completion;
pub use error::UsageError;
pub use fault::Fault;
pub use harness::{Harness, HarnessBuilder};
pub use logger::{Summary, TAP_HEADER};
pub use registry::{Mode, TestOutcome};
pub use scheduler::State;
pub use sink::{CaptureSink, LineSink, StdoutSink};
pub use stack::StackCleaner;
pub use terminator::{NoopTerminator, ProcessTerminator, RecordingTerminator, Terminator};
pub use tapline_config::{ExitMode, RunnerConfig};
