//! tidepoold — the Tidepool daemon.
//!
//! Single binary that assembles a self-regulating pool:
//! - Work queue fed by synthetic producers
//! - PID control loop resizing the worker pool
//! - REST API + Prometheus endpoint for telemetry and tunables
//!
//! # Usage
//!
//! ```text
//! tidepoold run --config tidepool.toml --port 8080
//! tidepoold default-config > tidepool.toml
//! ```

mod producer;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tidepool_control::{ControlLoop, LoopSettings};
use tidepool_core::TidepoolConfig;
use tidepool_metrics::Tunables;
use tidepool_pool::PoolHandles;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::producer::Producer;

#[derive(Parser)]
#[command(name = "tidepoold", about = "Tidepool self-regulating worker pool")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pool, its producers and the HTTP control surface.
    Run {
        /// Path to tidepool.toml. Built-in defaults when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port for the HTTP control surface.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Override control.tick_interval_ms.
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Override control.setpoint.
        #[arg(long)]
        setpoint: Option<f64>,
    },
    /// Print the built-in configuration as TOML.
    DefaultConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Run {
            config,
            port,
            tick_ms,
            setpoint,
        } => {
            let config = load_config(config, tick_ms, setpoint)?;
            run(config, port).await
        }
        Command::DefaultConfig => {
            print!("{}", TidepoolConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tidepoold=debug,tidepool=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(
    path: Option<PathBuf>,
    tick_ms: Option<u64>,
    setpoint: Option<f64>,
) -> anyhow::Result<TidepoolConfig> {
    let mut config = match path {
        Some(path) => TidepoolConfig::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => TidepoolConfig::default(),
    };
    if let Some(ms) = tick_ms {
        config.control.tick_interval_ms = ms;
    }
    if let Some(sp) = setpoint {
        config.control.setpoint = sp;
    }
    config.validate()?;
    Ok(config)
}

async fn run(config: TidepoolConfig, port: u16) -> anyhow::Result<()> {
    info!("Tidepool daemon starting");

    // ── Initialize subsystems ──────────────────────────────────

    let handles = PoolHandles::new();
    let tunables = Arc::new(Tunables::new(config.control.tunables()));
    info!(tunables = %tunables.render(), "tunables initialized");

    let control = ControlLoop::new(handles.clone(), tunables, LoopSettings::from(&config));
    let surface = control.surface();

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    let producer_handles: Vec<_> = config
        .producers
        .iter()
        .cloned()
        .enumerate()
        .map(|(id, p)| {
            let producer = Producer::new(id, p, Arc::clone(&handles.queue));
            tokio::spawn(producer.run(shutdown_rx.clone()))
        })
        .collect();
    info!(count = producer_handles.len(), "producers started");

    let control_handle = tokio::spawn(control.run(shutdown_rx.clone()));

    // ── Start API server ───────────────────────────────────────

    let router = tidepool_api::build_router(surface.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c, shutting down");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    let mut produced = 0;
    for handle in producer_handles {
        produced += join_task("producer", handle).await.unwrap_or(0);
    }
    join_task("control loop", control_handle).await;

    let snapshot = surface.snapshot();
    info!(
        produced,
        backlog = snapshot.backlog,
        workers_started = snapshot.workers_started,
        workers_exited = snapshot.workers_exited,
        "Tidepool daemon stopped"
    );
    Ok(())
}

/// Await a background task; a panic or cancellation is logged, not lost.
async fn join_task<T>(name: &str, handle: JoinHandle<T>) -> Option<T> {
    match handle.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(task = name, error = %e, panicked = e.is_panic(), "background task failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_task_returns_value() {
        let handle = tokio::spawn(async { 7u64 });
        assert_eq!(join_task("ok", handle).await, Some(7));
    }

    #[tokio::test]
    async fn join_task_reports_panic_as_none() {
        let handle: JoinHandle<()> = tokio::spawn(async {
            panic!("control loop blew up");
        });
        assert_eq!(join_task("control loop", handle).await, None);
    }

    #[tokio::test]
    async fn join_task_reports_abort_as_none() {
        let handle = tokio::spawn(std::future::pending::<u64>());
        handle.abort();
        assert_eq!(join_task("producer", handle).await, None);
    }
}
