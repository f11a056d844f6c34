//! Completion signal - resolves once the run's summary has been written

use std::rc::Rc;
use tokio::sync::watch;

/// Single-fulfilment signal shared by every clone
///
/// Waiting before fulfilment suspends; waiting afterwards returns at once.
#[derive(Debug, Clone)]
pub struct Completion {
    state: Rc<watch::Sender<bool>>,
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

impl Completion {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Rc::new(state),
        }
    }

    /// Fulfil the signal; returns false if it was already fulfilled
    pub(crate) fn fulfil(&self) -> bool {
        self.state.send_if_modified(|done| {
            if *done {
                false
            } else {
                *done = true;
                true
            }
        })
    }

    pub fn is_fulfilled(&self) -> bool {
        *self.state.borrow()
    }

    /// Wait for the signal
    pub async fn wait(&self) {
        let mut receiver = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = receiver.wait_for(|done| *done).await;
    }
}
