// SPDX-License-Identifier: MIT

//! Type definitions for CloudControl inventory records

use serde::Deserialize;

/// A network adapter attached to a virtual machine
///
/// Addresses are optional: an adapter that is mid-deployment or
/// mid-teardown has no private IPv4 address yet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAdapter {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub private_ipv4_address: Option<String>,
    #[serde(default)]
    pub private_ipv6_address: Option<String>,
}

/// Network configuration of a virtual machine
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineNetwork {
    pub primary_adapter: NetworkAdapter,
    #[serde(default)]
    pub additional_adapters: Vec<NetworkAdapter>,
}

/// One virtual machine in a network domain
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: String,
    pub name: String,
    pub network: VirtualMachineNetwork,
}

/// One page of a server listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPage {
    #[serde(default)]
    pub items: Vec<Server>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
}

impl ServerPage {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Reference to a network domain from another record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDomainRef {
    pub id: String,
}

/// A VLAN and the gateway addresses embedded in rendered configs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vlan {
    pub id: String,
    pub name: String,
    pub network_domain: NetworkDomainRef,
    pub ipv4_gateway_address: String,
    pub ipv6_gateway_address: String,
}

/// A logical grouping of virtual machines queried for inventory
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDomain {
    pub id: String,
    pub name: String,
}
