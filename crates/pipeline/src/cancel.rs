//! Coarse-grained cancellation for training runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Shared flag checked between candidate fits.
///
/// Clones share the same flag. Once cancelled, a token stays cancelled;
/// start the next run with a fresh token.
///
/// A token may also carry a budget of checks: after that many calls to
/// `should_stop`, it cancels itself. This caps how many candidates a
/// sweep fits.
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    remaining: Arc<AtomicUsize>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            remaining: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that allows `checks` calls to `should_stop` and then cancels
    pub fn with_budget(checks: usize) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            remaining: Arc::new(AtomicUsize::new(checks)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Check before starting one unit of work; consumes one unit of budget.
    pub fn should_stop(&self) -> bool {
        if self.is_cancelled() {
            return true;
        }
        let exhausted = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err();
        if exhausted {
            self.cancel();
        }
        exhausted
    }
}
