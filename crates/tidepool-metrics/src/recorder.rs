//! Per-tick sample history, drained by whoever polls the control surface.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tidepool_core::Sample;
use tracing::{debug, trace};

/// Bounded buffer of telemetry samples.
///
/// When nobody drains for a while the oldest samples are discarded so the
/// buffer never grows past `limit`. The first discard after each drain
/// is logged; the running total is available from [`Recorder::dropped`].
#[derive(Debug)]
pub struct Recorder {
    samples: Mutex<VecDeque<Sample>>,
    limit: usize,
    dropped: AtomicU64,
    gap_reported: AtomicBool,
}

impl Recorder {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            samples: Mutex::new(VecDeque::with_capacity(limit.min(1024))),
            limit,
            dropped: AtomicU64::new(0),
            gap_reported: AtomicBool::new(false),
        }
    }

    pub fn record(&self, sample: Sample) {
        let mut samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        if samples.len() == self.limit {
            if let Some(oldest) = samples.pop_front() {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if !self.gap_reported.swap(true, Ordering::Relaxed) {
                    debug!(
                        tick = oldest.tick,
                        limit = self.limit,
                        dropped_total = total,
                        "telemetry history full, dropping oldest samples"
                    );
                }
            }
        }
        samples.push_back(sample);
    }

    /// Take every sample recorded since the previous drain, oldest first.
    pub fn drain(&self) -> Vec<Sample> {
        let drained: Vec<Sample> = self
            .samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        self.gap_reported.store(false, Ordering::Relaxed);
        trace!(count = drained.len(), "telemetry samples drained");
        drained
    }

    pub fn len(&self) -> usize {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples discarded because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
