//! Assertion engine - the five primitives handed to every test
//!
//! - `fail(msg)` / `pass(msg)` record an unconditional outcome
//! - `ok(value, msg)` checks that `value` is truthy
//! - `equal(actual, expected, msg)` checks `actual == expected`
//! - `throws(fn, expected, msg)` checks that `fn` raises a matching fault
//!
//! Assertion failures are recorded, never raised. Every call goes through
//! the run's [`ResultLogger`], which owns the shared ordinal.

use crate::error::UsageError;
use crate::fault::{Fault, PanicCapture};
use crate::format;
use crate::logger::{Diagnostic, ResultLogger};
use regex::Regex;
use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;

// ============================================================================
// Truthiness
// ============================================================================

/// Values that `ok` can judge
///
/// Zero, NaN, empty strings, `None`, `Err` and `()` are falsy. Collections
/// are always truthy, whatever their length.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

macro_rules! impl_truthy_for_integers {
    ($($ty:ty),*) => {
        $(
            impl Truthy for $ty {
                fn is_truthy(&self) -> bool {
                    *self != 0
                }
            }
        )*
    };
}

impl_truthy_for_integers!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Truthy for f32 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for char {
    fn is_truthy(&self) -> bool {
        true
    }
}

impl Truthy for () {
    fn is_truthy(&self) -> bool {
        false
    }
}

impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

impl<T, E> Truthy for Result<T, E> {
    fn is_truthy(&self) -> bool {
        self.is_ok()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        true
    }
}

impl<T> Truthy for [T] {
    fn is_truthy(&self) -> bool {
        true
    }
}

impl<T, const N: usize> Truthy for [T; N] {
    fn is_truthy(&self) -> bool {
        true
    }
}

impl<T: Truthy + ?Sized> Truthy for &T {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl<T: Truthy + ?Sized> Truthy for Box<T> {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl<T: Truthy + ?Sized> Truthy for Rc<T> {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl<T: Truthy + ?Sized> Truthy for Arc<T> {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

// ============================================================================
// throws expectations
// ============================================================================

/// What a `throws` call expects the raised fault to look like
pub enum Expected {
    /// The fault's kind must equal this name
    Kind(String),
    /// The stringified fault must match this pattern
    Pattern(Pattern),
    /// The predicate decides
    Predicate(Box<dyn FnOnce(&Fault) -> bool>),
}

/// A regular expression, compiled up front or from source on first use
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: Option<Regex>,
}

impl Pattern {
    fn resolve(self) -> Result<Regex, UsageError> {
        match self.compiled {
            Some(regex) => Ok(regex),
            None => Regex::new(&self.source).map_err(|e| UsageError::InvalidThrowsExpectation {
                pattern: self.source,
                reason: e.to_string(),
            }),
        }
    }
}

impl Expected {
    /// Expect a fault of kind `name`
    pub fn kind(name: impl Into<String>) -> Self {
        Expected::Kind(name.into())
    }

    /// Expect the stringified fault to match `source`
    ///
    /// The source is compiled when a fault is actually raised; an invalid
    /// pattern is a usage error at that point.
    pub fn pattern(source: impl Into<String>) -> Self {
        Expected::Pattern(Pattern {
            source: source.into(),
            compiled: None,
        })
    }

    /// Expect the stringified fault to match a compiled regex
    pub fn regex(regex: Regex) -> Self {
        Expected::Pattern(Pattern {
            source: regex.as_str().to_string(),
            compiled: Some(regex),
        })
    }

    /// Let `predicate` judge the fault
    pub fn predicate(predicate: impl FnOnce(&Fault) -> bool + 'static) -> Self {
        Expected::Predicate(Box::new(predicate))
    }

    /// Rendering used when nothing was raised
    fn describe(&self) -> String {
        match self {
            Expected::Kind(kind) => format::value(kind),
            Expected::Pattern(pattern) => format!("/{}/", pattern.source),
            Expected::Predicate(_) => "[predicate]".to_string(),
        }
    }
}

impl From<Regex> for Expected {
    fn from(regex: Regex) -> Self {
        Expected::regex(regex)
    }
}

impl fmt::Debug for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            Expected::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.source).finish(),
            Expected::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

// ============================================================================
// Assertions handle
// ============================================================================

/// Handle passed to a test function for reporting outcomes
#[derive(Clone)]
pub struct Assertions {
    logger: Rc<RefCell<ResultLogger>>,
    test: Rc<str>,
}

impl Assertions {
    pub(crate) fn new(logger: Rc<RefCell<ResultLogger>>, test: Rc<str>) -> Self {
        Self { logger, test }
    }

    /// Name of the test this handle belongs to
    pub fn test_name(&self) -> &str {
        &self.test
    }

    fn log(&self, ok: bool, message: &str, diagnostic: Diagnostic) {
        self.logger.borrow_mut().record(ok, message, diagnostic);
    }

    /// Record an unconditional failure
    pub fn fail<'a>(&self, msg: impl Into<Option<&'a str>>) {
        self.log(false, msg.into().unwrap_or(""), Diagnostic::new("fail"));
    }

    /// Record an unconditional pass
    pub fn pass<'a>(&self, msg: impl Into<Option<&'a str>>) {
        self.log(true, msg.into().unwrap_or(""), Diagnostic::new("pass"));
    }

    /// Pass when `value` is truthy
    pub fn ok<'a, T>(&self, value: T, msg: impl Into<Option<&'a str>>)
    where
        T: Truthy + Debug,
    {
        let passed = value.is_truthy();
        let mut diagnostic = Diagnostic::new("ok");
        if !passed {
            diagnostic = diagnostic
                .actual(format::value(&value))
                .expected(format::value(&true));
        }
        self.log(passed, msg.into().unwrap_or("should be truthy"), diagnostic);
    }

    /// Pass when `actual == expected`
    ///
    /// Plain `PartialEq`, no coercion: `equal(f64::NAN, f64::NAN)` fails.
    pub fn equal<'a, A, B>(&self, actual: A, expected: B, msg: impl Into<Option<&'a str>>)
    where
        A: PartialEq<B> + Debug,
        B: Debug,
    {
        let passed = actual == expected;
        let mut diagnostic = Diagnostic::new("equal");
        if !passed {
            diagnostic = diagnostic
                .actual(format::value(&actual))
                .expected(format::value(&expected));
        }
        self.log(passed, msg.into().unwrap_or("should be equal"), diagnostic);
    }

    /// Pass when `f` raises a fault matching `expected`
    ///
    /// Raising means returning `Err` or panicking. A pattern that does not
    /// compile is a usage error and panics out of this call.
    pub fn throws<'a, T, E, F>(
        &self,
        f: F,
        expected: impl Into<Expected>,
        msg: impl Into<Option<&'a str>>,
    ) where
        F: FnOnce() -> Result<T, E>,
        E: Into<Fault>,
    {
        let message = msg.into().unwrap_or("should throw");
        let expected = expected.into();
        let diagnostic = Diagnostic::new("throws");

        let caught = {
            let _capture = PanicCapture::enter();
            panic::catch_unwind(AssertUnwindSafe(f))
        };
        let raised = match caught {
            Ok(Ok(_)) => None,
            Ok(Err(error)) => Some(error.into()),
            Err(payload) => Some(Fault::from_panic(payload)),
        };

        let Some(fault) = raised else {
            self.log(false, message, diagnostic.expected(expected.describe()));
            return;
        };

        match expected {
            Expected::Kind(kind) => {
                let diagnostic = diagnostic
                    .actual(format::value(fault.kind()))
                    .expected(format::value(&kind));
                self.log(fault.kind() == kind, message, diagnostic);
            }
            Expected::Pattern(pattern) => {
                let regex = pattern.resolve().unwrap_or_else(|e| e.raise());
                let rendered = fault.to_string();
                let diagnostic = diagnostic
                    .actual(format::value(&rendered))
                    .expected(format!("/{}/", regex.as_str()));
                self.log(regex.is_match(&rendered), message, diagnostic);
            }
            Expected::Predicate(predicate) => {
                let diagnostic = diagnostic.actual(format::value(&fault));
                self.log(predicate(&fault), message, diagnostic);
            }
        }
    }
}

impl fmt::Debug for Assertions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assertions")
            .field("test", &self.test)
            .finish_non_exhaustive()
    }
}
