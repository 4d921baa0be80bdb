//! Control loop — converts backlog into spawn / terminate decisions.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tidepool_core::{Sample, TidepoolConfig};
use tidepool_metrics::{Recorder, Tunables};
use tidepool_pid::{PidController, PidState};
use tidepool_pool::{PoolHandles, ProcessFn, Worker, simulated_processor};
use tracing::{debug, info};

use crate::surface::ControlSurface;

/// What a tick decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleAction {
    /// Launched this many new workers.
    Spawn(usize),
    /// Set the termination budget to this many grants.
    Terminate(usize),
    /// Desired size matched the live count.
    Hold,
}

/// Inputs and result of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub tick: u64,
    pub backlog: usize,
    pub active: usize,
    /// Raw controller output (already clamped to ≥ 0).
    pub desired: f64,
    /// Pool size the tick reconciled toward.
    pub target: usize,
    pub action: ScaleAction,
}

/// Timing and sizing knobs for the loop and the workers it spawns.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
    pub tick_interval: Duration,
    pub retry_interval: Duration,
    pub work_unit: Duration,
    pub max_workers: Option<usize>,
    pub history_limit: usize,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from(&TidepoolConfig::default())
    }
}

impl From<&TidepoolConfig> for LoopSettings {
    fn from(config: &TidepoolConfig) -> Self {
        Self {
            tick_interval: config.control.tick_interval(),
            retry_interval: config.worker.retry_interval(),
            work_unit: config.worker.work_unit(),
            max_workers: config.control.max_workers,
            history_limit: config.telemetry.history_limit,
        }
    }
}

/// The single orchestrator task of a pool.
pub struct ControlLoop {
    handles: PoolHandles,
    pid: PidController,
    tunables: Arc<Tunables>,
    recorder: Arc<Recorder>,
    settings: LoopSettings,
    process: ProcessFn,
    ticks: Arc<AtomicU64>,
    published: Arc<RwLock<PidState>>,
    next_worker_id: u64,
}

impl ControlLoop {
    /// Create a loop whose workers simulate `magnitude × work_unit` of work.
    pub fn new(handles: PoolHandles, tunables: Arc<Tunables>, settings: LoopSettings) -> Self {
        let pid = PidController::new(tunables.values().gains);
        Self {
            handles,
            pid,
            tunables,
            recorder: Arc::new(Recorder::new(settings.history_limit)),
            process: simulated_processor(settings.work_unit),
            settings,
            ticks: Arc::new(AtomicU64::new(0)),
            published: Arc::new(RwLock::new(PidState::default())),
            next_worker_id: 0,
        }
    }

    /// Replace the processing callback used by workers spawned from now on.
    pub fn with_processor(mut self, process: ProcessFn) -> Self {
        self.process = process;
        self
    }

    /// Read/write view for the telemetry transport.
    pub fn surface(&self) -> ControlSurface {
        ControlSurface::new(
            self.handles.clone(),
            Arc::clone(&self.tunables),
            Arc::clone(&self.recorder),
            Arc::clone(&self.ticks),
            Arc::clone(&self.published),
        )
    }

    /// Controller integral and previous error after the last tick.
    pub fn pid_state(&self) -> PidState {
        self.pid.state()
    }

    /// Run one decision cycle.
    ///
    /// Must be called from within a tokio runtime: spawned workers are
    /// tokio tasks.
    pub fn tick(&mut self) -> TickOutcome {
        let tunables = self.tunables.values();
        self.pid.set_gains(tunables.gains);

        let backlog = self.handles.queue.len();
        let active = self.handles.pool.value();
        let desired = self.pid.calc_desired(backlog as f64, tunables.setpoint);
        *self.published.write().unwrap_or_else(PoisonError::into_inner) = self.pid.state();
        let target = self.target_size(desired);

        let action = match target.cmp(&active) {
            CmpOrdering::Greater => {
                let n = target - active;
                for _ in 0..n {
                    self.spawn_worker();
                }
                ScaleAction::Spawn(n)
            }
            CmpOrdering::Less => {
                let n = active - target;
                self.handles.tokens.set_pending(n);
                ScaleAction::Terminate(n)
            }
            CmpOrdering::Equal => ScaleAction::Hold,
        };

        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        self.recorder.record(Sample {
            tick,
            backlog,
            setpoint: tunables.setpoint,
            active,
            desired,
            timestamp: epoch_secs_f64(),
        });

        debug!(
            tick,
            backlog,
            active,
            desired,
            target,
            setpoint = tunables.setpoint,
            action = ?action,
            "control tick"
        );

        TickOutcome {
            tick,
            backlog,
            active,
            desired,
            target,
            action,
        }
    }

    /// Tick every `tick_interval` until the shutdown signal fires.
    ///
    /// On shutdown every live worker is handed a termination grant, so
    /// idle workers leave on their next check and busy ones after their
    /// current item.
    pub async fn run(mut self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        info!(
            interval_ms = self.settings.tick_interval.as_millis() as u64,
            max_workers = ?self.settings.max_workers,
            "control loop started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.settings.tick_interval) => {
                    self.tick();
                }
                _ = shutdown.changed() => {
                    let active = self.handles.pool.value();
                    self.handles.tokens.set_pending(active);
                    info!(active, "control loop shutting down, retiring workers");
                    break;
                }
            }
        }
    }

    fn target_size(&self, desired: f64) -> usize {
        // `as` saturates; desired is already finite and ≥ 0.
        let rounded = desired.round() as usize;
        match self.settings.max_workers {
            Some(max) => rounded.min(max),
            None => rounded,
        }
    }

    fn spawn_worker(&mut self) {
        let id = self.next_worker_id;
        self.next_worker_id += 1;
        Worker::new(
            id,
            self.handles.clone(),
            self.settings.retry_interval,
            Arc::clone(&self.process),
        )
        .spawn();
        debug!(worker = id, "worker spawned");
    }
}

fn epoch_secs_f64() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
