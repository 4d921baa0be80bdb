//! Work queue — unbounded FIFO shared by producers and workers.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tidepool_core::WorkItem;

/// Thread-safe FIFO buffer of work items.
///
/// Backed by a `std::sync::Mutex`. Every operation holds the lock for a
/// single `VecDeque` call and never across an `.await`.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<WorkItem>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item at the back.
    pub fn push(&self, item: impl Into<WorkItem>) {
        self.lock().push_back(item.into());
    }

    /// Remove and return the oldest item. `None` means the queue was
    /// empty at the time of the call; it never waits for an item.
    pub fn pop(&self) -> Option<WorkItem> {
        self.lock().pop_front()
    }

    /// Point-in-time length; may be stale as soon as it returns.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Every mutation is a single VecDeque call; a poisoned queue is still consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<WorkItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
