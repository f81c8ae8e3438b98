//! Liveness and Prometheus scrape endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub event_bus: &'static str,
    pub subscribers: usize,
}

/// GET /health
///
/// 503 once the event bus is closed, since commands would no longer reach
/// the consumers.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let closed = state.bus.is_closed();
    let response = HealthResponse {
        status: if closed { "degraded" } else { "ok" },
        event_bus: if closed { "closed" } else { "open" },
        subscribers: state.bus.subscriber_count(),
    };
    let status = if closed {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(response))
}

/// GET /metrics
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
