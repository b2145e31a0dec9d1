//! Health check handler

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use pagevault_processing::DependencyStatus;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
pub(super) struct HealthCheckResponse {
    pub status: &'static str,
    pub storage: String,
    pub processing: &'static str,
    pub dependencies: Vec<DependencyStatus>,
}

/// GET /health
///
/// Always 200 while the process is serving; component states are reported
/// in the body.
pub(super) async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let storage = state.storage.clone();
    let storage_status = match tokio::time::timeout(
        CHECK_TIMEOUT,
        storage.exists("health-check-non-existent-key"),
    )
    .await
    {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Storage health check failed");
            format!("unhealthy: {}", e)
        }
        Err(_) => "timeout".to_string(),
    };

    let response = HealthCheckResponse {
        status: "healthy",
        storage: storage_status,
        processing: if state.pipeline.is_some() {
            "enabled"
        } else {
            "disabled"
        },
        dependencies: state.dependencies.dependencies.clone(),
    };

    (StatusCode::OK, Json(response))
}
