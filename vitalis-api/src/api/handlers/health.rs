use std::time::Instant;

use axum::Json;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Server start time, set once during startup for uptime reporting
static SERVER_START: OnceCell<Instant> = OnceCell::new();

/// Record the server start time. Idempotent.
pub fn initialize_server_start_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status, always "healthy" when the process can answer
    pub status: String,

    /// Seconds since the server started
    pub uptime_seconds: u64,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    let uptime_seconds = SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds,
    })
}
