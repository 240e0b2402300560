use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::api::AppState;

/// Health check endpoint response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// MAC addresses indexed in the current metadata snapshot
    pub cached_mac_addresses: usize,
}

/// GET /health
///
/// Reports service liveness plus the size of the server metadata
/// snapshot, so an empty or never-warmed cache is visible to monitoring
/// without grepping logs.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_mac_addresses: state.cache.len().await,
    };

    (StatusCode::OK, Json(response))
}
