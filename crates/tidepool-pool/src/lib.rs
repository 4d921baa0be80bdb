//! tidepool-pool — the shared resources a worker pool is made of.
//!
//! Three independent, separately synchronized leaves and the worker task
//! that ties them together:
//!
//! ```text
//! WorkQueue            Mutex<VecDeque<WorkItem>>   producers push, workers pop
//! ActivePoolCounter    AtomicUsize                 workers register themselves
//! TerminationTokens    AtomicUsize                 controller deposits, workers claim
//!
//! Worker
//!   register → loop { claim_one? exit : pop → process | sleep(retry) }
//! ```
//!
//! No operation ever holds more than one of these at a time, so there is
//! no lock ordering to get wrong. All three are handed to tasks as `Arc`
//! handles bundled in [`PoolHandles`].

pub mod counter;
pub mod queue;
pub mod tokens;
pub mod worker;

use std::sync::Arc;

pub use counter::{ActivePoolCounter, Registration};
pub use queue::WorkQueue;
pub use tokens::TerminationTokens;
pub use worker::{ProcessFn, ProcessFuture, Worker, WorkerExit, processor_fn, simulated_processor};

/// Shared handles to the pool's resources.
///
/// Cloning is cheap: every field is an `Arc`.
#[derive(Clone, Default)]
pub struct PoolHandles {
    pub queue: Arc<WorkQueue>,
    pub pool: Arc<ActivePoolCounter>,
    pub tokens: Arc<TerminationTokens>,
}

impl PoolHandles {
    pub fn new() -> Self {
        Self::default()
    }
}
