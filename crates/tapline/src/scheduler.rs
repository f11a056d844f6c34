//! Scheduler - drives the run from first registration to summary
//!
//! State machine: `Idle -> Starting -> Running -> Done`.
//!
//! - The first registration moves `Idle -> Starting` and writes the TAP header.
//! - The run driver yields once, so registrations made in the same tick are
//!   included, then takes the only/skip policy snapshot (`Starting -> Running`).
//! - Records are dequeued strictly in registration order, one at a time, each
//!   test awaited to completion before the next starts.
//! - When the registry is exhausted the summary is written, the completion
//!   signal fulfilled and the terminator called (`Running -> Done`).

use crate::assert::Assertions;
use crate::completion::Completion;
use crate::error::UsageError;
use crate::fault::{Fault, PanicCapture};
use crate::logger::{ResultLogger, Summary};
use crate::registry::{Mode, Registry, TestBody, TestRecord};
use crate::terminator::Terminator;
use futures_util::FutureExt;
use std::cell::{Cell, RefCell};
use std::future;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;
use tracing::Instrument;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Starting,
    Running,
    Done,
}

/// Outcome of one dequeue step
enum Step {
    Invoke {
        index: usize,
        name: Rc<str>,
        body: TestBody,
    },
    Skip(Rc<str>),
    Excluded(Rc<str>),
    Exhausted,
}

pub(crate) struct Scheduler {
    registry: RefCell<Registry>,
    logger: Rc<RefCell<ResultLogger>>,
    terminator: RefCell<Box<dyn Terminator>>,
    completion: Completion,
    state: Cell<State>,
    driven: Cell<bool>,
}

impl Scheduler {
    pub(crate) fn new(logger: ResultLogger, terminator: Box<dyn Terminator>) -> Self {
        Self {
            registry: RefCell::new(Registry::new()),
            logger: Rc::new(RefCell::new(logger)),
            terminator: RefCell::new(terminator),
            completion: Completion::new(),
            state: Cell::new(State::Idle),
            driven: Cell::new(false),
        }
    }

    pub(crate) fn state(&self) -> State {
        self.state.get()
    }

    pub(crate) fn completion(&self) -> &Completion {
        &self.completion
    }

    pub(crate) fn registered(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Append a record, starting the run if this is the first one
    pub(crate) fn register(&self, record: TestRecord) {
        match self.state.get() {
            State::Idle => self.start(),
            State::Starting | State::Running => {}
            State::Done => UsageError::RegistrationAfterCompletion {
                name: record.name().to_string(),
            }
            .raise(),
        }

        tracing::debug!(test = record.name(), mode = ?record.mode(), "registered");
        self.registry.borrow_mut().push(record);
    }

    fn start(&self) {
        self.state.set(State::Starting);
        self.logger.borrow_mut().header();
        tracing::debug!("run starting");
    }

    /// Drive the run to completion
    pub(crate) async fn run(&self) -> Summary {
        if self.driven.replace(true) {
            UsageError::AlreadyRan.raise();
        }
        if self.state.get() == State::Idle {
            self.start();
        }

        // One scheduling tick so same-tick registrations share the snapshot.
        tokio::task::yield_now().await;

        let has_only = self.registry.borrow_mut().resolve_all();
        self.state.set(State::Running);
        tracing::debug!(has_only, tests = self.registered(), "policy resolved");

        let span = tracing::debug_span!("run");
        async {
            loop {
                match self.next_step(has_only) {
                    Step::Exhausted => break,
                    Step::Excluded(name) => tracing::trace!(test = %name, "excluded by only"),
                    Step::Skip(name) => self.logger.borrow_mut().test_skipped(&name),
                    Step::Invoke { index, name, body } => self.invoke(index, name, body).await,
                }
            }
        }
        .instrument(span)
        .await;

        let summary = self.logger.borrow_mut().summarize();
        self.state.set(State::Done);
        self.completion.fulfil();
        tracing::info!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            "run complete"
        );

        self.terminator.borrow_mut().terminate(summary.exit_code());
        summary
    }

    /// Dequeue the next record; the index advances whatever the record holds
    fn next_step(&self, has_only: bool) -> Step {
        let index = self.logger.borrow_mut().next_test();
        let mut registry = self.registry.borrow_mut();

        let Some(record) = registry.get_mut(index) else {
            return Step::Exhausted;
        };
        let name = record.shared_name();

        // Records registered after the snapshot resolve against it here.
        if !record.resolve(has_only) {
            return match record.mode() {
                Mode::Skip => Step::Skip(name),
                Mode::Plain | Mode::Only => Step::Excluded(name),
            };
        }

        match record.take_body() {
            Some(body) => Step::Invoke { index, name, body },
            None => Step::Excluded(name),
        }
    }

    async fn invoke(&self, index: usize, name: Rc<str>, body: TestBody) {
        self.logger.borrow_mut().test_started(&name);

        let assertions = Assertions::new(Rc::clone(&self.logger), Rc::clone(&name));
        let span = tracing::debug_span!("test", index, test = %name);
        let mut test = AssertUnwindSafe(body(assertions)).catch_unwind();
        // Panic backtraces are recorded only while the test itself is polled.
        let outcome = future::poll_fn(|cx| {
            let _capture = PanicCapture::enter();
            test.poll_unpin(cx)
        })
        .instrument(span)
        .await;

        let fault = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(fault)) => fault,
            Err(payload) => Fault::from_panic(payload),
        };

        tracing::warn!(test = %name, %fault, "test function faulted");
        self.logger.borrow_mut().fault(&fault);
    }
}
