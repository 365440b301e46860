//! Health and service-info endpoints
//!
//! All of these sit on the public allow-list and must never touch a
//! validation path.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;

use super::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: String,
    pub auth_mode: &'static str,
}

/// Simple health check - returns 200 if the service is running
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// Liveness check for restart probes
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Root info: what this service is and how it authenticates
pub async fn service_info(State(state): State<AppState>) -> impl IntoResponse {
    let response = ServiceInfo {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION").to_string(),
        auth_mode: state.auth.describe(),
    };

    (StatusCode::OK, Json(response))
}
