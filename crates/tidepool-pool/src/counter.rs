//! Active pool counter — how many worker loops are running right now.
//!
//! The only way to move the count is through a [`Registration`]: taking
//! one increments, dropping it decrements. A decrement without a matching
//! increment is therefore unrepresentable, and a worker that unwinds out
//! of a panic still gives its slot back.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tracing::trace;

/// Thread-safe live-worker count plus lifetime start/exit totals.
#[derive(Debug, Default)]
pub struct ActivePoolCounter {
    active: AtomicUsize,
    started: AtomicU64,
    exited: AtomicU64,
}

impl ActivePoolCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the caller as a live worker until the returned guard drops.
    pub fn register(self: &Arc<Self>) -> Registration {
        let now = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.started.fetch_add(1, Ordering::Relaxed);
        trace!(active = now, "worker registered");
        Registration {
            counter: Arc::clone(self),
        }
    }

    /// Snapshot of the live-worker count. May already be stale.
    pub fn value(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Workers registered since creation.
    pub fn started_total(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    /// Workers deregistered since creation.
    pub fn exited_total(&self) -> u64 {
        self.exited.load(Ordering::Relaxed)
    }

    fn deregister(&self) {
        let before = self.active.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(before > 0, "deregister without registration");
        self.exited.fetch_add(1, Ordering::Relaxed);
        trace!(active = before - 1, "worker deregistered");
    }
}

/// Proof of one live worker. Dropping it decrements the counter exactly once.
#[must_use = "dropping a Registration immediately deregisters the worker"]
#[derive(Debug)]
pub struct Registration {
    counter: Arc<ActivePoolCounter>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.counter.deregister();
    }
}
