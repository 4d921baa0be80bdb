//! Prometheus text exposition format.
//!
//! Renders a pool snapshot for scraping by a Prometheus server or a
//! compatible agent.

use std::fmt::Write;

use tidepool_core::PoolSnapshot;

/// Render a snapshot into Prometheus text format.
pub fn render_prometheus(s: &PoolSnapshot) -> String {
    let mut out = String::new();

    let gauges: [(&str, &str, f64); 10] = [
        ("tidepool_backlog", "Items waiting in the work queue.", s.backlog as f64),
        ("tidepool_active_workers", "Workers currently registered.", s.active as f64),
        (
            "tidepool_pending_terminations",
            "Termination grants not yet claimed.",
            s.pending_terminations as f64,
        ),
        ("tidepool_setpoint", "Target backlog.", s.setpoint),
        ("tidepool_gain_kp", "Proportional gain.", s.gains.kp),
        ("tidepool_gain_ki", "Integral gain.", s.gains.ki),
        ("tidepool_gain_kd", "Derivative gain.", s.gains.kd),
        ("tidepool_control_ticks", "Control ticks executed.", s.ticks as f64),
        ("tidepool_pid_integral", "Accumulated controller error.", s.integral),
        (
            "tidepool_pid_previous_error",
            "Controller error at the last tick.",
            s.previous_error,
        ),
    ];
    for (name, help, value) in gauges {
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} gauge");
        let _ = writeln!(out, "{name} {value}");
    }

    let counters = [
        ("tidepool_workers_started_total", "Workers started.", s.workers_started),
        ("tidepool_workers_exited_total", "Workers exited.", s.workers_exited),
        (
            "tidepool_samples_dropped_total",
            "History samples discarded before being drained.",
            s.samples_dropped,
        ),
    ];
    for (name, help, value) in counters {
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} counter");
        let _ = writeln!(out, "{name} {value}");
    }

    out
}
