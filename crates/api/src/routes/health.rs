use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use tdm_core::storage::Storage;

use crate::state::AppState;

/// Hidden, so cleanup passes and listings never see it.
const STORAGE_PROBE_PATH: &str = ".health/probe";

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when any check fails.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Whether the image backend accepted a write and delete.
    pub storage_writable: bool,
    /// Name of the image backend.
    pub storage_backend: String,
}

/// Write then remove a hidden probe file on `storage`.
async fn storage_writable(storage: &dyn Storage) -> bool {
    if let Err(e) = storage.save(STORAGE_PROBE_PATH, b"ok").await {
        tracing::warn!(backend = storage.name(), error = %e, "Storage health probe failed");
        return false;
    }
    if let Err(e) = storage.delete(STORAGE_PROBE_PATH).await {
        tracing::warn!(backend = storage.name(), error = %e, "Failed to remove storage health probe");
    }
    true
}

/// GET /health -- database reachability and image storage writability.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = tdm_db::health_check(&state.pool).await.is_ok();
    let storage_writable = storage_writable(state.storage.as_ref()).await;

    let status = if db_healthy && storage_writable {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        storage_writable,
        storage_backend: state.storage.name().to_string(),
    })
}

/// Mount health check routes at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
