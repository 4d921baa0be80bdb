//! Termination tokens — exact-count, cooperative scale-down.
//!
//! The controller deposits a budget of "please exit" grants; idle workers
//! race to claim them. `claim_one` is a single compare-and-decrement, so
//! however many workers race, exactly `n` of them win after
//! `set_pending(n)`.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Budget of pending exit grants.
#[derive(Debug, Default)]
pub struct TerminationTokens {
    pending: AtomicUsize,
}

impl TerminationTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the outstanding budget with `n`. Unclaimed grants from an
    /// earlier deposit are discarded, not added to.
    pub fn set_pending(&self, n: usize) {
        self.pending.store(n, Ordering::Release);
    }

    /// Take one grant if any remain. `true` obliges the caller to exit.
    pub fn claim_one(&self) -> bool {
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Grants not yet claimed.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}
