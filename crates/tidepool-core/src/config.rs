//! tidepool.toml configuration parser.
//!
//! Every section and field is optional. Missing values fall back to the
//! defaults below, which reproduce the stock demo: five producers, a
//! 100 ms control tick, setpoint 20 and gains `kp=0.5, ki=1, kd=0`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Gains, TunableValues};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TidepoolConfig {
    pub control: ControlConfig,
    pub worker: WorkerConfig,
    pub telemetry: TelemetryConfig,
    pub producers: Vec<ProducerConfig>,
}

impl Default for TidepoolConfig {
    fn default() -> Self {
        Self {
            control: ControlConfig::default(),
            worker: WorkerConfig::default(),
            telemetry: TelemetryConfig::default(),
            producers: default_producers(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub tick_interval_ms: u64,
    pub setpoint: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Upper bound on concurrently spawned workers. Unbounded when absent.
    pub max_workers: Option<usize>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            setpoint: 20.0,
            kp: 0.5,
            ki: 1.0,
            kd: 0.0,
            max_workers: None,
        }
    }
}

impl ControlConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn gains(&self) -> Gains {
        Gains::new(self.kp, self.ki, self.kd)
    }

    /// Initial values for the runtime tunables store.
    pub fn tunables(&self) -> TunableValues {
        TunableValues {
            setpoint: self.setpoint,
            gains: self.gains(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Sleep between polls of an empty queue.
    pub retry_interval_ms: u64,
    /// Simulated processing time per unit of item magnitude.
    pub work_unit_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: 100,
            work_unit_ms: 1,
        }
    }
}

impl WorkerConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn work_unit(&self) -> Duration {
        Duration::from_millis(self.work_unit_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Samples kept between two drains; older samples are dropped first.
    pub history_limit: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            history_limit: 4096,
        }
    }
}

/// A synthetic producer: pushes an item of random magnitude in
/// `[0, max_work)` and then idles for `idle_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerConfig {
    pub idle_ms: u64,
    pub max_work: u64,
}

impl ProducerConfig {
    pub fn idle(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }
}

fn default_producers() -> Vec<ProducerConfig> {
    [(230, 500), (240, 500), (250, 1500), (260, 500), (270, 500)]
        .into_iter()
        .map(|(idle_ms, max_work)| ProducerConfig { idle_ms, max_work })
        .collect()
}

impl TidepoolConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: TidepoolConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check values the parser cannot reject on its own.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.control.tick_interval_ms == 0 {
            return Err(ConfigError::invalid("control.tick_interval_ms", "must be > 0"));
        }
        for (field, value) in [
            ("control.setpoint", self.control.setpoint),
            ("control.kp", self.control.kp),
            ("control.ki", self.control.ki),
            ("control.kd", self.control.kd),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, "must be a finite number"));
            }
        }
        if self.worker.retry_interval_ms == 0 {
            return Err(ConfigError::invalid("worker.retry_interval_ms", "must be > 0"));
        }
        if self.telemetry.history_limit == 0 {
            return Err(ConfigError::invalid("telemetry.history_limit", "must be > 0"));
        }
        for (i, p) in self.producers.iter().enumerate() {
            if p.idle_ms == 0 {
                return Err(ConfigError::invalid(format!("producers[{i}].idle_ms"), "must be > 0"));
            }
            if p.max_work == 0 {
                return Err(ConfigError::invalid(format!("producers[{i}].max_work"), "must be > 0"));
            }
        }
        Ok(())
    }
}
