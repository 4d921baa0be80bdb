//! tidepool-api — HTTP control surface for a running pool.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/snapshot` | Backlog, pool size, tunables |
//! | GET | `/api/v1/samples` | Per-tick history since the last call (drains) |
//! | GET | `/api/v1/tunables` | Current setpoint and gains |
//! | PUT | `/api/v1/tunables` | Text update, `kp=0.5; setpoint=20` |
//! | PUT | `/api/v1/tunables/{name}` | JSON `{"value": 0.5}` for one tunable |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;

use axum::Router;
use axum::routing::get;
use tidepool_control::ControlSurface;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub surface: ControlSurface,
}

/// Build the complete API router.
pub fn build_router(surface: ControlSurface) -> Router {
    let state = ApiState { surface };

    let api_routes = Router::new()
        .route("/snapshot", get(handlers::get_snapshot))
        .route("/samples", get(handlers::drain_samples))
        .route("/tunables", get(handlers::get_tunables).put(handlers::apply_tunables))
        .route("/tunables/{name}", axum::routing::put(handlers::set_tunable))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::prometheus_metrics).with_state(state))
}
