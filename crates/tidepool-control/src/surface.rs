//! Control surface — what a telemetry transport is allowed to see and do.
//!
//! Cheap to clone; every clone talks to the same pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tidepool_core::{PoolSnapshot, Sample, Tunable, TunableValues, WorkItem};
use tidepool_metrics::{Recorder, TunableResult, Tunables, render_prometheus};
use tidepool_pid::PidState;
use tidepool_pool::PoolHandles;

#[derive(Clone)]
pub struct ControlSurface {
    handles: PoolHandles,
    tunables: Arc<Tunables>,
    recorder: Arc<Recorder>,
    ticks: Arc<AtomicU64>,
    pid: Arc<RwLock<PidState>>,
}

impl ControlSurface {
    pub(crate) fn new(
        handles: PoolHandles,
        tunables: Arc<Tunables>,
        recorder: Arc<Recorder>,
        ticks: Arc<AtomicU64>,
        pid: Arc<RwLock<PidState>>,
    ) -> Self {
        Self {
            handles,
            tunables,
            recorder,
            ticks,
            pid,
        }
    }

    /// Current backlog, pool size, tunables and controller state. The fields are read one
    /// after another without a common lock, so they can disagree slightly.
    pub fn snapshot(&self) -> PoolSnapshot {
        let tunables = self.tunables.values();
        let pid = *self.pid.read().unwrap_or_else(PoisonError::into_inner);
        PoolSnapshot {
            backlog: self.handles.queue.len(),
            active: self.handles.pool.value(),
            pending_terminations: self.handles.tokens.pending(),
            setpoint: tunables.setpoint,
            gains: tunables.gains,
            ticks: self.ticks.load(Ordering::Relaxed),
            workers_started: self.handles.pool.started_total(),
            workers_exited: self.handles.pool.exited_total(),
            integral: pid.integral,
            previous_error: pid.previous_error,
            samples_dropped: self.recorder.dropped(),
        }
    }

    /// Per-tick samples since the last call.
    pub fn drain_samples(&self) -> Vec<Sample> {
        self.recorder.drain()
    }

    pub fn tunables(&self) -> TunableValues {
        self.tunables.values()
    }

    pub fn render_tunables(&self) -> String {
        self.tunables.render()
    }

    pub fn set_tunable(&self, name: &str, value: f64) -> TunableResult<Tunable> {
        self.tunables.set(name, value)
    }

    /// Apply a `name=value; name=value` update, all fields or none.
    pub fn apply_tunables(&self, update: &str) -> TunableResult<Vec<(Tunable, f64)>> {
        self.tunables.apply(update)
    }

    /// Enqueue work through the surface.
    pub fn submit(&self, item: impl Into<WorkItem>) {
        self.handles.queue.push(item);
    }

    pub fn prometheus(&self) -> String {
        render_prometheus(&self.snapshot())
    }
}
