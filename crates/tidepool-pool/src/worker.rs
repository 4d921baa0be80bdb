//! Worker — a task that drains the queue until it is granted termination.
//!
//! # Lifecycle
//!
//! ```text
//! START → REGISTER
//!   loop:
//!     claim_one()?  → DEREGISTER → EXIT(Terminated)
//!     pop()
//!       Some(item)  → process(item) → loop      (Err → EXIT(Faulted))
//!       None        → sleep(retry)  → loop
//! ```
//!
//! The termination check runs once per iteration, before fetching work:
//! a granted worker never starts another item, and an item already being
//! processed always runs to completion. Deregistration is tied to the
//! [`Registration`](crate::Registration) guard, so it also happens when
//! processing returns an error or panics.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tidepool_core::WorkItem;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::PoolHandles;

/// Boxed future returned by a processing callback.
pub type ProcessFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// Callback that performs the work for one item.
pub type ProcessFn = Arc<dyn Fn(WorkItem) -> ProcessFuture + Send + Sync>;

/// Wrap an async closure as a [`ProcessFn`].
pub fn processor_fn<F, Fut>(f: F) -> ProcessFn
where
    F: Fn(WorkItem) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |item| Box::pin(f(item)))
}

/// Processing that just waits `magnitude × unit`.
pub fn simulated_processor(unit: Duration) -> ProcessFn {
    processor_fn(move |item: WorkItem| async move {
        tokio::time::sleep(item.cost(unit)).await;
        Ok(())
    })
}

/// Why a worker loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Claimed a termination grant.
    Terminated,
    /// Processing an item failed.
    Faulted,
}

/// One consumer of the work queue.
pub struct Worker {
    id: u64,
    handles: PoolHandles,
    retry_interval: Duration,
    process: ProcessFn,
}

impl Worker {
    pub fn new(id: u64, handles: PoolHandles, retry_interval: Duration, process: ProcessFn) -> Self {
        Self {
            id,
            handles,
            retry_interval,
            process,
        }
    }

    /// Run the worker on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<WorkerExit> {
        tokio::spawn(self.run())
    }

    /// The worker loop. Registers before anything else and deregisters
    /// when the returned future completes or unwinds.
    pub async fn run(self) -> WorkerExit {
        let _registration = self.handles.pool.register();
        debug!(worker = self.id, "worker started");

        let mut processed: u64 = 0;
        loop {
            if self.handles.tokens.claim_one() {
                debug!(worker = self.id, processed, "termination granted, worker exiting");
                return WorkerExit::Terminated;
            }

            match self.handles.queue.pop() {
                Some(item) => {
                    if let Err(e) = (self.process)(item).await {
                        warn!(
                            worker = self.id,
                            magnitude = item.magnitude(),
                            error = %e,
                            "processing failed, worker exiting"
                        );
                        return WorkerExit::Faulted;
                    }
                    processed += 1;
                }
                None => tokio::time::sleep(self.retry_interval).await,
            }
        }
    }
}
