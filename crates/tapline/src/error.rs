//! Caller-contract violations
//!
//! These are not test failures. They are raised as panics: inside a test
//! function the scheduler contains them like any other fault, anywhere else
//! they abort the run.

use thiserror::Error;

/// Misuse of the harness or the assertion API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("second argument to throws must be an error-kind descriptor, a pattern, or a predicate: invalid pattern `{pattern}`: {reason}")]
    InvalidThrowsExpectation { pattern: String, reason: String },

    #[error("cannot register test `{name}`: the run has already completed")]
    RegistrationAfterCompletion { name: String },

    #[error("this harness has already been run")]
    AlreadyRan,
}

impl UsageError {
    /// Raise this violation the way contract violations propagate
    pub(crate) fn raise(self) -> ! {
        panic!("{}", self)
    }
}
