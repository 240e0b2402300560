// SPDX-License-Identifier: MIT

//! Server metadata cache
//!
//! Maintains the MAC address → server record mapping that the request
//! handler queries, rebuilt periodically from the CloudControl server
//! listing. A server with several network adapters appears under one key
//! per adapter, all pointing at the same record.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::compute::{Server, ServerInventory};
use crate::error::Result;

/// Page size used when draining the server listing
pub const PAGE_SIZE: u32 = 50;

/// MAC address → server record cache for one network domain
///
/// All access goes through one mutex. `refresh` holds it across the whole
/// rebuild, so a refresh in progress blocks lookups for its duration;
/// network-domain inventories are small and refreshes infrequent, which
/// keeps that window short. Readers only ever observe a complete snapshot.
pub struct ServerCache {
    inventory: Arc<dyn ServerInventory>,
    network_domain_id: String,
    servers: Mutex<HashMap<String, Arc<Server>>>,
}

impl ServerCache {
    #[must_use]
    pub fn new(inventory: Arc<dyn ServerInventory>, network_domain_id: impl Into<String>) -> Self {
        Self {
            inventory,
            network_domain_id: network_domain_id.into(),
            servers: Mutex::new(HashMap::new()),
        }
    }

    /// Rebuilds the MAC address mapping from the full server listing
    ///
    /// Drains every page of the inventory, indexing each adapter's MAC
    /// address only when that adapter has a private IPv4 address (adapters
    /// without one are mid-provisioning or mid-teardown). The new mapping
    /// replaces the old one wholesale.
    ///
    /// # Errors
    ///
    /// Returns the inventory error when any page fetch fails; the previous
    /// mapping is left untouched, so readers keep seeing stale but
    /// consistent data.
    pub async fn refresh(&self) -> Result<()> {
        let mut servers = self.servers.lock().await;

        let mut by_mac_address: HashMap<String, Arc<Server>> = HashMap::new();
        let mut page_number = 1;

        loop {
            let page = self
                .inventory
                .list_servers_page(&self.network_domain_id, page_number, PAGE_SIZE)
                .await
                .inspect_err(|e| {
                    tracing::error!(
                        "Failed to list servers in network domain '{}' (page {}): {}",
                        self.network_domain_id,
                        page_number,
                        e
                    );
                })?;

            if page.is_empty() {
                tracing::debug!(
                    "No more servers in network domain '{}'",
                    self.network_domain_id
                );
                break;
            }

            let page_len = page.items.len();

            for server in page.items {
                index_server(&mut by_mac_address, Arc::new(server));
            }

            // A short page is the last one; stopping here saves the
            // trailing empty-page fetch.
            if page_len < PAGE_SIZE as usize {
                break;
            }

            page_number += 1;
        }

        tracing::debug!(
            "Refreshed server metadata for network domain '{}': {} MAC address(es)",
            self.network_domain_id,
            by_mac_address.len()
        );

        *servers = by_mac_address;

        Ok(())
    }

    /// Returns the server owning the adapter with this exact MAC address
    pub async fn lookup(&self, mac_address: &str) -> Option<Arc<Server>> {
        let servers = self.servers.lock().await;
        servers.get(mac_address).cloned()
    }

    /// Number of indexed MAC addresses in the current snapshot
    pub async fn len(&self) -> usize {
        let servers = self.servers.lock().await;
        servers.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Indexes one server under each of its qualifying adapters' MAC addresses
fn index_server(by_mac_address: &mut HashMap<String, Arc<Server>>, server: Arc<Server>) {
    let primary = &server.network.primary_adapter;
    match (&primary.mac_address, &primary.private_ipv4_address) {
        (Some(mac), Some(_)) => {
            by_mac_address.insert(mac.clone(), server.clone());
        }
        _ => {
            tracing::debug!(
                "Skipping server '{}' ('{}') because its primary adapter has no private IPv4 address",
                server.name,
                server.id
            );
            return;
        }
    }

    for adapter in &server.network.additional_adapters {
        match (&adapter.mac_address, &adapter.private_ipv4_address) {
            (Some(mac), Some(_)) => {
                by_mac_address.insert(mac.clone(), server.clone());
            }
            (Some(mac), None) => {
                tracing::debug!(
                    "Skipping additional adapter (MAC='{}') of server '{}' ('{}') because it has no private IPv4 address",
                    mac,
                    server.name,
                    server.id
                );
            }
            (None, _) => {}
        }
    }
}

/// Starts the background server metadata refresh loop
///
/// Performs one warming refresh before returning, then spawns a task that
/// refreshes the cache every `interval` until the shutdown signal fires.
/// Refresh failures are logged and swallowed; the cache keeps serving the
/// last committed snapshot.
pub async fn start_refresh_loop(
    cache: Arc<ServerCache>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tracing::info!(
        "Starting server metadata refresh loop every {}s",
        interval.as_secs()
    );

    if let Err(e) = cache.refresh().await {
        tracing::warn!("Initial server metadata refresh failed: {e}; starting with empty cache");
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The interval fires immediately; the warming refresh already ran.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {},
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Stopping server metadata refresh loop");
                        break;
                    }
                }
            }

            if let Err(e) = cache.refresh().await {
                tracing::warn!("Server metadata refresh failed: {e}; serving stale cache");
            }
        }
    })
}
