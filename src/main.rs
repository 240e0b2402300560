use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cloudconfig_server::{
    ARP_REFRESH_INTERVAL, AppState, ArpTable, ComputeClient, Config, Result, ServerCache,
    ServerInventory, create_router, load_ssh_public_key, start_arp_refresh_loop,
    start_refresh_loop,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    setup_tracing();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;

    let ssh_public_key = load_ssh_public_key(&config.ssh_public_key_file).map_err(|e| {
        tracing::error!(
            "Cannot read SSH public key from '{}': {}",
            config.ssh_public_key_file.display(),
            e
        );
        e
    })?;

    let client = match &config.api_url {
        Some(url) => ComputeClient::with_base_url(url, &config.mcp_user, &config.mcp_password),
        None => ComputeClient::new(&config.mcp_region, &config.mcp_user, &config.mcp_password),
    };
    let client = Arc::new(client);

    // The VLAN gives us the gateways for rendered configs and leads to the
    // network domain whose inventory we cache.
    let vlan = client.get_vlan(&config.vlan_id).await.map_err(|e| {
        tracing::error!("Cannot find VLAN '{}': {}", config.vlan_id, e);
        e
    })?;

    let network_domain = client
        .get_network_domain(&vlan.network_domain.id)
        .await
        .map_err(|e| {
            tracing::error!(
                "Cannot find network domain '{}': {}",
                vlan.network_domain.id,
                e
            );
            e
        })?;

    tracing::info!(
        "Serving cloud-config for network domain '{}' ('{}'), VLAN '{}'",
        network_domain.name,
        network_domain.id,
        vlan.name
    );

    // Shutdown channel shared by the refresh loops and the HTTP server
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let arp_table = Arc::new(ArpTable::new());
    start_arp_refresh_loop(arp_table.clone(), ARP_REFRESH_INTERVAL, shutdown_rx.clone());

    let inventory: Arc<dyn ServerInventory> = client;
    let cache = Arc::new(ServerCache::new(inventory, network_domain.id.clone()));
    start_refresh_loop(
        cache.clone(),
        Duration::from_secs(config.refresh_interval_secs),
        shutdown_rx.clone(),
    )
    .await;

    let addr: SocketAddr = config.server_addr.parse().map_err(|e| {
        tracing::error!("Invalid server address: {}", e);
        e
    })?;

    let state = Arc::new(AppState {
        config,
        cache,
        resolver: arp_table,
        vlan,
        ssh_public_key,
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind address: {}", e);
        e
    })?;

    tracing::info!("Cloud-config server starting on {}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  - GET /cloud-config.yml - Per-host boot configuration");
    tracing::info!("  - GET /health           - Health check");

    let mut server_shutdown = shutdown_rx;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = server_shutdown.changed().await;
        tracing::info!("HTTP server shutting down");
    })
    .await
    .map_err(|e| {
        tracing::error!("Server error: {}", e);
        e
    })?;

    Ok(())
}

fn setup_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
