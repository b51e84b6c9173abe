//! Health check endpoints.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::AppState;
use crate::models::{DetailedHealthResponse, HealthResponse};

const OK: &str = "ok";

/// `GET /health`: liveness only, always 200.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: OK.to_string(),
    })
}

/// `GET /health/detailed`: probes the database and the counter store.
///
/// Always 200; a failing dependency flips `status` to `"error"` and its own
/// field to `"error: <detail>"`.
pub async fn detailed_health_handler(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    let database = match tasker_core::db::ping(&state.pool).await {
        Ok(()) => OK.to_string(),
        Err(e) => {
            warn!(error = %e, "database health check failed");
            format!("error: {e}")
        }
    };

    let redis = match state.limiter.store_health().await {
        Ok(()) => OK.to_string(),
        Err(e) => {
            warn!(error = %e, "counter store health check failed");
            format!("error: {e}")
        }
    };

    let status = if database == OK && redis == OK {
        OK
    } else {
        "error"
    };

    Json(DetailedHealthResponse {
        status: status.to_string(),
        database,
        redis,
        version: tasker_core::version().to_string(),
    })
}
