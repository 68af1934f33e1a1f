use crate::routes::types::{HealthCheckResponse, RootResponse};
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use super::AppState;

/// Liveness endpoint; never touches storage
pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        status: "API is running".to_string(),
        timestamp: chrono::Utc::now(),
        allowed_origins: state.policy.allowed_origins().to_vec(),
    })
}

/// Health check endpoint reporting the environment mode
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthCheckResponse> {
    let now = chrono::Utc::now();

    Json(HealthCheckResponse {
        status: "ok".to_string(),
        environment: state.policy.environment().to_string(),
        uptime_seconds: now.signed_duration_since(state.started_at).num_seconds(),
        timestamp: now,
    })
}
