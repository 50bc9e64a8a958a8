//! Operational HTTP endpoints.
//!
//! - `/health`  : liveness, independent of refresh outcome
//! - `/metrics` : Prometheus text format, whatever the last refreshes produced

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;

/// Prometheus text exposition content type.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.render_metrics();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        body,
    )
        .into_response()
}
