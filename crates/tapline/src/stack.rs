//! Stack trace capture and cleanup for TAP diagnostics
//!
//! A captured backtrace starts inside the capture machinery and the engine
//! (logger, assertion engine) and ends inside the scheduler that polled the
//! test. Only the frames in between belong to the caller, so the cleaner drops
//! the leading engine and library frames and stops at the next engine frame.

use std::backtrace::Backtrace;
use std::path::{Path, MAIN_SEPARATOR};

/// Module prefixes of the engine itself
const ENGINE_MODULES: &[&str] = &[
    "tapline::assert",
    "tapline::fault",
    "tapline::harness",
    "tapline::logger",
    "tapline::registry",
    "tapline::scheduler",
    "tapline::stack",
];

/// Frames produced by taking the backtrace
const CAPTURE_MACHINERY: &[&str] = &["std::backtrace", "std::backtrace_rs", "backtrace::"];

/// Library frames between the failure site and the caller's code
///
/// Skipped only before the first caller frame: the panic runtime and hook
/// dispatch, and the `?` conversion of an error into a fault.
const PRELUDE: &[&str] = &[
    "std::panicking",
    "core::panicking",
    "std::sys::backtrace",
    "std::sys_common::backtrace",
    "rust_begin_unwind",
    "__rustc::rust_begin_unwind",
    "alloc::boxed::Box<",
    "core::ops::function::",
    "core::result::",
    "core::option::",
];

/// One parsed frame of a rendered backtrace
#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    symbol: String,
    location: Option<String>,
}

impl Frame {
    fn is_internal(&self) -> bool {
        let symbol = self.symbol.trim_start_matches('<');
        if symbol.contains("::tests::") {
            return false;
        }
        ENGINE_MODULES
            .iter()
            .chain(CAPTURE_MACHINERY)
            .any(|prefix| symbol.starts_with(prefix))
    }

    fn is_prelude(&self) -> bool {
        let symbol = self.symbol.trim_start_matches('<');
        self.is_internal() || PRELUDE.iter().any(|prefix| symbol.starts_with(prefix))
    }
}

/// Cleans captured backtraces into portable diagnostic frames
#[derive(Debug, Clone, Default)]
pub struct StackCleaner {
    /// Working-directory prefix (with trailing separator) removed from frames
    cwd_prefix: Option<String>,
}

impl StackCleaner {
    /// Create a cleaner that strips `cwd` from frame locations
    pub fn new(cwd: Option<&Path>) -> Self {
        let cwd_prefix = cwd
            .map(|dir| dir.display().to_string())
            .filter(|dir| !dir.is_empty())
            .map(|mut prefix| {
                if !prefix.ends_with(['/', '\\']) {
                    prefix.push(MAIN_SEPARATOR);
                }
                prefix
            });
        Self { cwd_prefix }
    }

    /// Create a cleaner for the process working directory
    pub fn from_current_dir() -> Self {
        let cwd = std::env::current_dir().ok();
        Self::new(cwd.as_deref())
    }

    /// Capture the current call stack and clean it
    pub fn capture(&self) -> Vec<String> {
        self.clean(&Backtrace::force_capture().to_string())
    }

    /// Clean an already rendered backtrace
    pub fn clean(&self, rendered: &str) -> Vec<String> {
        parse_frames(rendered)
            .into_iter()
            .skip_while(Frame::is_prelude)
            .take_while(|frame| !frame.is_internal())
            .map(|frame| self.render(&frame))
            .collect()
    }

    fn render(&self, frame: &Frame) -> String {
        let line = match &frame.location {
            Some(location) => format!("{} at {}", frame.symbol, location),
            None => frame.symbol.clone(),
        };
        match &self.cwd_prefix {
            Some(prefix) => line.replacen(prefix.as_str(), "", 1).trim().to_string(),
            None => line.trim().to_string(),
        }
    }
}

/// Parse the `Display` form of a `std::backtrace::Backtrace`
///
/// Frames look like `  3: symbol` optionally followed by `at path:line:col`.
fn parse_frames(rendered: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in rendered.lines().map(str::trim) {
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                frame.location = Some(location.trim().to_string());
            }
        } else if let Some((index, symbol)) = line.split_once(": ") {
            if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) {
                frames.push(Frame {
                    symbol: symbol.trim().to_string(),
                    location: None,
                });
            }
        }
    }

    frames
}
