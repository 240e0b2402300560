use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::AppState;
use crate::compute::{NetworkAdapter, Server, VirtualMachineNetwork};
use crate::error::{AppError, Result};
use crate::render;

/// GET /cloud-config.yml
///
/// Resolves the caller's MAC address from its IP, finds the matching
/// server record, and renders its boot configuration. Requests from the
/// loopback address get a synthetic test record instead.
pub async fn cloud_config(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    // Resolution uses the parsed IP only, never the raw addr:port string.
    let client_ip = peer.ip();

    tracing::info!("Received cloud-config request from {}", client_ip);

    match generate_for_client(&state, client_ip).await {
        Ok(body) => (
            StatusCode::OK,
            [("Content-Type", "text/yaml; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(AppError::Resolution(ip)) => {
            tracing::warn!("No MAC address found for {}", ip);
            (
                StatusCode::BAD_REQUEST,
                format!(
                    "Sorry, I can't figure out your MAC address from your IP address ({ip})."
                ),
            )
                .into_response()
        }
        Err(AppError::LookupMiss(mac)) => {
            tracing::warn!("No server found with MAC address {}", mac);
            (
                StatusCode::BAD_REQUEST,
                format!("Sorry, {mac}, I can't find the server your MAC address corresponds to."),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to generate cloud-config for {}: {}", client_ip, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to generate cloud-config: {e}"),
            )
                .into_response()
        }
    }
}

async fn generate_for_client(state: &AppState, client_ip: IpAddr) -> Result<String> {
    let server = if client_ip.is_loopback() {
        tracing::info!("Request originates from the local machine; treating this as a test request");
        Arc::new(test_server(state))
    } else {
        let mac_address = state
            .resolver
            .resolve(client_ip)
            .await
            .ok_or(AppError::Resolution(client_ip))?;

        state
            .cache
            .lookup(&mac_address)
            .await
            .ok_or(AppError::LookupMiss(mac_address))?
    };

    render::render_cloud_config(
        &server,
        &state.vlan,
        &state.ssh_public_key,
        &state.config.rancher_settings(),
    )
}

/// Synthetic record served to loopback callers (local development)
fn test_server(state: &AppState) -> Server {
    Server {
        id: "local-test".to_string(),
        name: state.config.test_hostname.clone(),
        network: VirtualMachineNetwork {
            primary_adapter: NetworkAdapter {
                id: None,
                mac_address: None,
                private_ipv4_address: Some(state.config.test_host_ipv4.clone()),
                private_ipv6_address: Some(state.config.test_host_ipv6.clone()),
            },
            additional_adapters: vec![],
        },
    }
}
