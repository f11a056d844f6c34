//! Harness - the public handle for registering and running tests
//!
//! A harness owns one run: its registry, counters, report sink and
//! terminator. Clones share that run, so a test body may hold a clone and
//! register further tests while the run is in progress.

use crate::completion::Completion;
use crate::logger::{ResultLogger, Summary};
use crate::registry::{Mode, TestOutcome, TestRecord};
use crate::scheduler::{Scheduler, State};
use crate::sink::{LineSink, StdoutSink};
use crate::stack::StackCleaner;
use crate::terminator::{NoopTerminator, ProcessTerminator, Terminator};
use crate::Assertions;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use tapline_config::{ExitMode, RunnerConfig};

/// Registration surface and run driver
#[derive(Clone)]
pub struct Harness {
    scheduler: Rc<Scheduler>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// Harness reporting to stdout and exiting the process when done
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    /// Harness configured from a loaded `tapline.toml`
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Register a test
    ///
    /// The body's future may resolve to `()` or to `Result<(), E>` with
    /// `E: Into<Fault>`. A body that never completes normally, such as one
    /// that only panics, has no outcome type to infer; name it explicitly:
    ///
    /// ```no_run
    /// # let harness = tapline::Harness::new();
    /// harness.test::<_, _, ()>("unfinished", |_t| async {
    ///     panic!("not written yet");
    /// });
    /// ```
    pub fn test<F, Fut, R>(&self, name: impl Into<String>, f: F)
    where
        F: FnOnce(Assertions) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
        R: TestOutcome,
    {
        self.scheduler.register(TestRecord::new(name, Mode::Plain, f));
    }

    /// Register a test that is reported as skipped and never invoked
    pub fn skip<F, Fut, R>(&self, name: impl Into<String>, f: F)
    where
        F: FnOnce(Assertions) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
        R: TestOutcome,
    {
        self.scheduler.register(TestRecord::new(name, Mode::Skip, f));
    }

    /// Register a test; once any `only` test exists, plain tests do not run
    pub fn only<F, Fut, R>(&self, name: impl Into<String>, f: F)
    where
        F: FnOnce(Assertions) -> Fut + 'static,
        Fut: Future<Output = R> + 'static,
        R: TestOutcome,
    {
        self.scheduler.register(TestRecord::new(name, Mode::Only, f));
    }

    /// Run every registered test, one at a time
    ///
    /// The returned future must be polled on a single thread. It finishes
    /// after the summary is written and the terminator has been called.
    pub fn run(&self) -> impl Future<Output = Summary> {
        let scheduler = Rc::clone(&self.scheduler);
        async move { scheduler.run().await }
    }

    /// Run on a fresh current-thread tokio runtime
    pub fn run_blocking(&self) -> io::Result<Summary> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(runtime.block_on(self.run()))
    }

    /// Resolves once the run's summary has been written
    pub fn done(&self) -> impl Future<Output = ()> {
        let completion: Completion = self.scheduler.completion().clone();
        async move { completion.wait().await }
    }

    pub fn is_done(&self) -> bool {
        self.scheduler.completion().is_fulfilled()
    }

    pub fn state(&self) -> State {
        self.scheduler.state()
    }

    /// Number of registered tests
    pub fn registered(&self) -> usize {
        self.scheduler.registered()
    }
}

/// Builder for [`Harness`]
pub struct HarnessBuilder {
    sink: Option<Box<dyn LineSink>>,
    terminator: Option<Box<dyn Terminator>>,
    capture_stack: bool,
    strip_cwd: bool,
    cwd: Option<PathBuf>,
    exit_mode: ExitMode,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            sink: None,
            terminator: None,
            capture_stack: true,
            strip_cwd: true,
            cwd: None,
            exit_mode: ExitMode::Auto,
        }
    }
}

impl HarnessBuilder {
    /// Report somewhere other than stdout
    pub fn sink(mut self, sink: impl LineSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Use an explicit terminator, overriding the exit mode
    pub fn terminator(mut self, terminator: impl Terminator + 'static) -> Self {
        self.terminator = Some(Box::new(terminator));
        self
    }

    /// Attach stack traces to failing results
    pub fn capture_stack(mut self, capture: bool) -> Self {
        self.capture_stack = capture;
        self
    }

    /// Strip the working directory from stack frames
    pub fn strip_cwd(mut self, strip: bool) -> Self {
        self.strip_cwd = strip;
        self
    }

    /// Directory to strip instead of the process working directory
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn exit_mode(mut self, mode: ExitMode) -> Self {
        self.exit_mode = mode;
        self
    }

    /// Apply a runner configuration
    pub fn config(mut self, config: &RunnerConfig) -> Self {
        self.capture_stack = config.capture_stack();
        self.strip_cwd = config.strip_cwd();
        if let Some(cwd) = config.cwd() {
            self.cwd = Some(cwd.to_path_buf());
        }
        self.exit_mode = config.exit_mode();
        self
    }

    pub fn build(self) -> Harness {
        let reports_to_stdout = self.sink.is_none();
        let sink = self.sink.unwrap_or_else(|| Box::new(StdoutSink));

        let exit_mode = self.exit_mode;
        let terminator: Box<dyn Terminator> = match self.terminator {
            Some(terminator) => terminator,
            None => match exit_mode {
                ExitMode::Always => Box::new(ProcessTerminator),
                ExitMode::Auto if reports_to_stdout => Box::new(ProcessTerminator),
                ExitMode::Auto | ExitMode::Never => Box::new(NoopTerminator),
            },
        };

        let stacks = match (self.strip_cwd, self.cwd) {
            (false, _) => StackCleaner::new(None),
            (true, Some(cwd)) => StackCleaner::new(Some(&cwd)),
            (true, None) => StackCleaner::from_current_dir(),
        };

        tracing::debug!(
            capture_stack = self.capture_stack,
            exit_mode = %exit_mode,
            reports_to_stdout,
            "harness built"
        );

        let logger = ResultLogger::new(sink, stacks, self.capture_stack);
        Harness {
            scheduler: Rc::new(Scheduler::new(logger, terminator)),
        }
    }
}
