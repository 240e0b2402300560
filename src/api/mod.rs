//! HTTP API module for the cloud-config server
//!
//! # Endpoints
//! - `GET /cloud-config.yml` — per-host boot configuration, keyed by the
//!   caller's MAC address
//! - `GET /health` — health check

pub mod handlers;

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::arp::MacResolver;
use crate::cache::ServerCache;
use crate::compute::Vlan;
use crate::config::Config;

/// Application state shared with endpoints
pub struct AppState {
    pub config: Config,
    pub cache: Arc<ServerCache>,
    pub resolver: Arc<dyn MacResolver>,
    pub vlan: Vlan,
    pub ssh_public_key: String,
}

/// Creates the main Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/cloud-config.yml", get(handlers::cloud_config))
        .route("/health", get(handlers::health_check))
        .with_state(state)
}
