//! Faults raised by test functions
//!
//! A [`Fault`] is what a test function returns when it gives up, and what
//! [`Assertions::throws`](crate::Assertions::throws) inspects. Any
//! `std::error::Error` converts into one, so `?` works inside test bodies.
//!
//! `Fault` must not implement `std::error::Error`: the blanket `From` impl
//! below depends on it.
//!
//! Panics carry no backtrace of their own. While a [`PanicCapture`] guard is
//! alive on a thread, a process-wide panic hook records the backtrace at the
//! panic site instead of printing the panic, and [`Fault::from_panic`] picks
//! it up. Threads without a guard fall through to the previous hook.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic;
use std::sync::Once;

/// Kind given to faults built from a panic payload
pub const PANIC_KIND: &str = "panic";

thread_local! {
    static CAPTURE_DEPTH: Cell<usize> = const { Cell::new(0) };
    static PANIC_BACKTRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let capturing = CAPTURE_DEPTH.try_with(|depth| depth.get() > 0).unwrap_or(false);
            if !capturing {
                previous(info);
                return;
            }
            let backtrace = Backtrace::force_capture();
            let _ = PANIC_BACKTRACE.try_with(|slot| *slot.borrow_mut() = Some(backtrace));
        }));
    });
}

/// Records panic backtraces on this thread for as long as it is alive
///
/// Guards nest. Hold one only around code whose panics are caught and
/// converted with [`Fault::from_panic`].
pub(crate) struct PanicCapture {
    _private: (),
}

impl PanicCapture {
    pub(crate) fn enter() -> Self {
        install_hook();
        CAPTURE_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self { _private: () }
    }
}

impl Drop for PanicCapture {
    fn drop(&mut self) {
        CAPTURE_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

fn take_panic_backtrace() -> Option<Backtrace> {
    PANIC_BACKTRACE
        .try_with(|slot| slot.borrow_mut().take())
        .ok()
        .flatten()
}

/// An error escaping a test function or raised inside `throws`
pub struct Fault {
    kind: String,
    message: String,
    backtrace: Option<Backtrace>,
}

impl Fault {
    /// Create a fault with an explicit kind, like `TypeError`
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            backtrace: Some(Backtrace::force_capture()),
        }
    }

    /// Create a fault of the generic `Error` kind
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new("Error", message)
    }

    /// Convert a caught panic payload
    ///
    /// Carries the backtrace recorded at the panic site when the panic
    /// happened under a [`PanicCapture`] guard.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "test function panicked".to_string());

        Self {
            kind: PANIC_KIND.to_string(),
            message,
            backtrace: take_panic_backtrace(),
        }
    }

    /// Discriminating kind name
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Human readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Backtrace taken where the fault was created or where it panicked
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.as_ref()
    }
}

impl<E> From<E> for Fault
where
    E: std::error::Error + 'static,
{
    fn from(error: E) -> Self {
        Self::new(short_type_name::<E>(), error.to_string())
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

/// `std::num::ParseIntError` -> `ParseIntError`
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
