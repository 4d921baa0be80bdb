//! REST API handlers.
//!
//! Reads go straight to the `ControlSurface`; writes are validated there
//! and a rejected update leaves every tunable untouched.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use tidepool_metrics::TunableError;
use tracing::warn;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn rejected(e: &TunableError, status: StatusCode) -> axum::response::Response {
    warn!(error = %e, %status, "tunable update rejected");
    error_response(&e.to_string(), status).into_response()
}

// ── Telemetry ──────────────────────────────────────────────────

/// GET /api/v1/snapshot
pub async fn get_snapshot(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.surface.snapshot())
}

/// GET /api/v1/samples
pub async fn drain_samples(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.surface.drain_samples())
}

// ── Tunables ───────────────────────────────────────────────────

/// GET /api/v1/tunables
pub async fn get_tunables(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.surface.tunables())
}

/// PUT /api/v1/tunables
///
/// Body is plain text: `kp=0.5; ki=1; setpoint=20`. Any bad field,
/// including an unknown name, is a `400`.
pub async fn apply_tunables(State(state): State<ApiState>, body: String) -> impl IntoResponse {
    match state.surface.apply_tunables(&body) {
        Ok(_) => ApiResponse::ok(state.surface.tunables()).into_response(),
        Err(e) => rejected(&e, StatusCode::BAD_REQUEST),
    }
}

/// Single tunable update body.
#[derive(serde::Deserialize)]
pub struct SetTunableRequest {
    pub value: f64,
}

/// PUT /api/v1/tunables/:name
pub async fn set_tunable(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(req): Json<SetTunableRequest>,
) -> impl IntoResponse {
    match state.surface.set_tunable(&name, req.value) {
        Ok(_) => ApiResponse::ok(state.surface.tunables()).into_response(),
        Err(e @ TunableError::Unknown(_)) => rejected(&e, StatusCode::NOT_FOUND),
        Err(e) => rejected(&e, StatusCode::BAD_REQUEST),
    }
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.surface.prometheus(),
    )
}
