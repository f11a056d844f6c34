//! Test registry - registered tests in insertion order
//!
//! The registry only grows. Each record's run eligibility is resolved once
//! against the run's policy snapshot and never recomputed.

use crate::assert::Assertions;
use crate::fault::Fault;
use futures_util::future::{FutureExt, LocalBoxFuture};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Type-erased test function
pub(crate) type TestBody = Box<dyn FnOnce(Assertions) -> LocalBoxFuture<'static, Result<(), Fault>>>;

/// What a test function's future may resolve to
pub trait TestOutcome {
    fn into_result(self) -> Result<(), Fault>;
}

impl TestOutcome for () {
    fn into_result(self) -> Result<(), Fault> {
        Ok(())
    }
}

impl<E: Into<Fault>> TestOutcome for Result<(), E> {
    fn into_result(self) -> Result<(), Fault> {
        self.map_err(Into::into)
    }
}

/// Which registration variant created a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Plain,
    Skip,
    Only,
}

impl Mode {
    /// Run eligibility under a policy snapshot
    pub fn should_run(self, has_only: bool) -> bool {
        match self {
            Mode::Skip => false,
            Mode::Only => true,
            Mode::Plain => !has_only,
        }
    }
}

/// One registered test
pub struct TestRecord {
    name: Rc<str>,
    mode: Mode,
    should_run: Option<bool>,
    body: Option<TestBody>,
}

impl TestRecord {
    pub(crate) fn new<F, Fut, R>(name: impl Into<String>, mode: Mode, f: F) -> Self
    where
        F: FnOnce(Assertions) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
        R: TestOutcome,
    {
        let body: TestBody = Box::new(move |t| async move { f(t).await.into_result() }.boxed_local());
        Self {
            name: Rc::from(name.into()),
            mode,
            should_run: None,
            body: Some(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Rc<str> {
        Rc::clone(&self.name)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Resolved eligibility; `None` until the policy reaches this record
    pub fn should_run(&self) -> Option<bool> {
        self.should_run
    }

    /// Resolve eligibility once; later calls return the first answer
    pub(crate) fn resolve(&mut self, has_only: bool) -> bool {
        let mode = self.mode;
        *self
            .should_run
            .get_or_insert_with(|| mode.should_run(has_only))
    }

    /// Hand out the test function; a record is invoked at most once
    pub(crate) fn take_body(&mut self) -> Option<TestBody> {
        self.body.take()
    }
}

impl fmt::Debug for TestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRecord")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("should_run", &self.should_run)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of test records
#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<TestRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: TestRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TestRecord> {
        self.records.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut TestRecord> {
        self.records.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestRecord> {
        self.records.iter()
    }

    /// Check if any record was registered with `only`
    pub fn has_only(&self) -> bool {
        self.records.iter().any(|r| r.mode == Mode::Only)
    }

    /// Take the policy snapshot and resolve every current record against it
    pub(crate) fn resolve_all(&mut self) -> bool {
        let has_only = self.has_only();
        for record in &mut self.records {
            record.resolve(has_only);
        }
        has_only
    }
}
