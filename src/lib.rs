// SPDX-License-Identifier: MIT

//! # Cloud-Config Server
//!
//! Generates per-host boot configuration ("cloud-config") documents for
//! virtual machines on a CloudControl network domain, keyed by the
//! requesting machine's MAC address.
//!
//! Per request: the caller's IP is resolved to a MAC address via the
//! system ARP table, the MAC is looked up in a server metadata cache
//! refreshed periodically from the CloudControl inventory, and the
//! matching record is rendered as nested YAML (network interfaces, SSH
//! keys, installer script).
//!
//! ## Main modules
//! - `api`: HTTP API handlers
//! - `arp`: MAC address resolution from the system ARP table
//! - `cache`: server metadata cache and refresh loop
//! - `compute`: CloudControl inventory client
//! - `config`: configuration management
//! - `error`: error types
//! - `render`: cloud-config document rendering
//! - `prelude`: commonly used types and traits

mod api;
mod arp;
mod cache;
mod compute;
mod config;
mod error;
mod render;
pub mod prelude;

// Re-export commonly used types
/// Application configuration
pub use config::{Config, load_ssh_public_key};

/// Application error and result type
pub use error::{AppError, Result};

/// HTTP API router and state
pub use api::{AppState, create_router};

/// Server metadata cache and its refresh loop
pub use cache::{PAGE_SIZE, ServerCache, start_refresh_loop};

/// MAC resolution
pub use arp::{ARP_REFRESH_INTERVAL, ArpTable, MacResolver, start_arp_refresh_loop};

/// CloudControl inventory client and records
pub use compute::{
    ComputeClient, NetworkAdapter, NetworkDomain, NetworkDomainRef, Server, ServerInventory,
    ServerPage, VirtualMachineNetwork, Vlan,
};

/// Cloud-config rendering
pub use render::{INSTALL_SCRIPT, RancherSettings, render_cloud_config};
