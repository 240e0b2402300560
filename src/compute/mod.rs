//! CloudControl compute API module
//!
//! Provides typed inventory records and a client for the VLAN,
//! network-domain, and paginated server-listing endpoints.

mod client;
mod inventory;
mod types;

// Re-export public types and functions
pub use client::ComputeClient;
pub use inventory::ServerInventory;
pub use types::{
    NetworkAdapter, NetworkDomain, NetworkDomainRef, Server, ServerPage, VirtualMachineNetwork,
    Vlan,
};
