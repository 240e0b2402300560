//! Cloud-config document rendering
//!
//! Two nested documents: the outer cloud-config only writes the inner one
//! plus an installer script to disk; the inner one carries the per-host
//! network configuration and SSH keys that drive the installed RancherOS.

use serde::Serialize;

use crate::compute::{Server, Vlan};
use crate::error::{AppError, Result};

/// Script the outer document drops at /opt/rancher/bin/start.sh
pub const INSTALL_SCRIPT: &str = "\
#!/bin/bash
echo Y | sudo ros install -f -c /opt/rancher/bin/install.yml -d /dev/sda
";

const INSTALL_YML_PATH: &str = "/opt/rancher/bin/install.yml";
const INSTALL_SCRIPT_PATH: &str = "/opt/rancher/bin/start.sh";

/// Optional RancherOS settings embedded in the inner document
///
/// Each piece is emitted only when configured: `dns_nameserver` adds a
/// `dns.nameservers` entry, and `agent_image` + `agent_url` together add
/// the rancher-agent service that registers the host with a Rancher
/// server.
#[derive(Debug, Clone, Default)]
pub struct RancherSettings {
    pub dns_nameserver: Option<String>,
    pub agent_image: Option<String>,
    pub agent_url: Option<String>,
}

#[derive(Serialize)]
struct CloudConfig {
    write_files: Vec<WriteFile>,
}

#[derive(Serialize)]
struct WriteFile {
    path: &'static str,
    permissions: &'static str,
    content: String,
}

#[derive(Serialize)]
struct InnerCloudConfig {
    hostname: String,
    rancher: Rancher,
    ssh_authorized_keys: Vec<String>,
}

#[derive(Serialize)]
struct Rancher {
    network: RancherNetwork,
    #[serde(skip_serializing_if = "Option::is_none")]
    services: Option<Services>,
}

#[derive(Serialize)]
struct RancherNetwork {
    interfaces: Interfaces,
}

#[derive(Serialize)]
struct Interfaces {
    /// Disables DHCP on every interface; eth0 below overrides it.
    #[serde(rename = "eth*")]
    catch_all: CatchAll,
    eth0: Eth0,
    #[serde(skip_serializing_if = "Option::is_none")]
    dns: Option<Dns>,
}

#[derive(Serialize)]
struct CatchAll {
    dhcp: bool,
}

#[derive(Serialize)]
struct Eth0 {
    addresses: Vec<String>,
    gateway: String,
    gateway_ipv6: String,
    mtu: u32,
}

#[derive(Serialize)]
struct Dns {
    nameservers: Vec<String>,
}

#[derive(Serialize)]
struct Services {
    #[serde(rename = "rancher-agent1")]
    rancher_agent: AgentService,
}

#[derive(Serialize)]
struct AgentService {
    image: String,
    command: String,
    privileged: bool,
    volumes: Vec<String>,
    environment: AgentEnvironment,
}

#[derive(Serialize)]
struct AgentEnvironment {
    #[serde(rename = "CATTLE_AGENT_IP")]
    cattle_agent_ip: String,
}

/// Renders the full cloud-config response body for one server
///
/// # Errors
///
/// Returns `AppError::Render` when the server record lacks a primary
/// IPv4 address or YAML serialization fails.
pub fn render_cloud_config(
    server: &Server,
    vlan: &Vlan,
    ssh_public_key: &str,
    rancher: &RancherSettings,
) -> Result<String> {
    let inner = render_inner_cloud_config(server, vlan, ssh_public_key, rancher)?;

    let document = CloudConfig {
        write_files: vec![
            WriteFile {
                path: INSTALL_YML_PATH,
                permissions: "0700",
                content: inner,
            },
            WriteFile {
                path: INSTALL_SCRIPT_PATH,
                permissions: "0700",
                content: INSTALL_SCRIPT.to_string(),
            },
        ],
    };

    Ok(format!("#cloud-config\n{}", to_yaml(&document)?))
}

/// Renders the inner, host-specific cloud-config document
fn render_inner_cloud_config(
    server: &Server,
    vlan: &Vlan,
    ssh_public_key: &str,
    rancher: &RancherSettings,
) -> Result<String> {
    let primary = &server.network.primary_adapter;

    let ipv4 = primary.private_ipv4_address.as_ref().ok_or_else(|| {
        AppError::Render(format!(
            "server '{}' has no private IPv4 address on its primary adapter",
            server.name
        ))
    })?;

    let mut addresses = vec![format!("{ipv4}/24")];
    if let Some(ipv6) = &primary.private_ipv6_address {
        addresses.push(format!("{ipv6}/64"));
    }

    let dns = rancher.dns_nameserver.as_ref().map(|nameserver| Dns {
        nameservers: vec![nameserver.clone()],
    });

    // The agent service needs both an image and a registration URL.
    let services = match (&rancher.agent_image, &rancher.agent_url) {
        (Some(image), Some(url)) => Some(Services {
            rancher_agent: AgentService {
                image: image.clone(),
                command: url.clone(),
                privileged: true,
                volumes: vec![
                    "/var/run/docker.sock:/var/run/docker.sock".to_string(),
                    "/var/lib/rancher:/var/lib/rancher".to_string(),
                ],
                environment: AgentEnvironment {
                    cattle_agent_ip: ipv4.clone(),
                },
            },
        }),
        _ => None,
    };

    let document = InnerCloudConfig {
        hostname: server.name.clone(),
        rancher: Rancher {
            network: RancherNetwork {
                interfaces: Interfaces {
                    catch_all: CatchAll { dhcp: false },
                    eth0: Eth0 {
                        addresses,
                        gateway: vlan.ipv4_gateway_address.clone(),
                        gateway_ipv6: vlan.ipv6_gateway_address.clone(),
                        mtu: 1500,
                    },
                    dns,
                },
            },
            services,
        },
        ssh_authorized_keys: vec![ssh_public_key.to_string()],
    };

    Ok(format!("#cloud-config\n{}", to_yaml(&document)?))
}

fn to_yaml<T: Serialize>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).map_err(|e| AppError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{NetworkAdapter, NetworkDomainRef, VirtualMachineNetwork};

    fn test_vlan() -> Vlan {
        Vlan {
            id: "vlan-01".to_string(),
            name: "rancher".to_string(),
            network_domain: NetworkDomainRef {
                id: "nd-01".to_string(),
            },
            ipv4_gateway_address: "10.0.0.1".to_string(),
            ipv6_gateway_address: "2001:db8::1".to_string(),
        }
    }

    fn test_server(ipv4: Option<&str>, ipv6: Option<&str>) -> Server {
        Server {
            id: "srv-01".to_string(),
            name: "rancher-host-01".to_string(),
            network: VirtualMachineNetwork {
                primary_adapter: NetworkAdapter {
                    id: None,
                    mac_address: Some("AA:BB:CC:DD:EE:01".to_string()),
                    private_ipv4_address: ipv4.map(str::to_string),
                    private_ipv6_address: ipv6.map(str::to_string),
                },
                additional_adapters: vec![],
            },
        }
    }

    #[test]
    fn outer_document_writes_install_files() {
        let body = render_cloud_config(
            &test_server(Some("10.0.0.5"), Some("2001:db8::5")),
            &test_vlan(),
            "ssh-rsa AAAA test@host",
            &RancherSettings::default(),
        )
        .unwrap();

        assert!(body.starts_with("#cloud-config\n"));
        assert!(body.contains("write_files:"));
        assert!(body.contains("/opt/rancher/bin/install.yml"));
        assert!(body.contains("/opt/rancher/bin/start.sh"));
        assert!(body.contains("'0700'") || body.contains("\"0700\"") || body.contains("permissions: 0700"));
        assert!(body.contains("ros install"));
    }

    #[test]
    fn inner_document_carries_host_network_config() {
        let inner = render_inner_cloud_config(
            &test_server(Some("10.0.0.5"), Some("2001:db8::5")),
            &test_vlan(),
            "ssh-rsa AAAA test@host",
            &RancherSettings::default(),
        )
        .unwrap();

        assert!(inner.starts_with("#cloud-config\n"));
        assert!(inner.contains("hostname: rancher-host-01"));
        assert!(inner.contains("10.0.0.5/24"));
        assert!(inner.contains("2001:db8::5/64"));
        assert!(inner.contains("gateway: 10.0.0.1"));
        assert!(inner.contains("gateway_ipv6:"));
        assert!(inner.contains("2001:db8::1"));
        assert!(inner.contains("mtu: 1500"));
        assert!(inner.contains("ssh-rsa AAAA test@host"));
        assert!(inner.contains("eth*"));
        assert!(inner.contains("dhcp: false"));
    }

    #[test]
    fn missing_ipv6_is_omitted_from_addresses() {
        let inner = render_inner_cloud_config(
            &test_server(Some("10.0.0.5"), None),
            &test_vlan(),
            "ssh-rsa AAAA",
            &RancherSettings::default(),
        )
        .unwrap();

        assert!(inner.contains("10.0.0.5/24"));
        assert!(!inner.contains("/64"));
    }

    #[test]
    fn missing_ipv4_is_a_render_error() {
        let result = render_cloud_config(
            &test_server(None, Some("2001:db8::5")),
            &test_vlan(),
            "ssh-rsa AAAA",
            &RancherSettings::default(),
        );
        assert!(matches!(result, Err(AppError::Render(_))));
    }

    #[test]
    fn configured_dns_and_agent_service_are_emitted() {
        let rancher = RancherSettings {
            dns_nameserver: Some("10.0.0.2".to_string()),
            agent_image: Some("rancher/agent:v1.2.0".to_string()),
            agent_url: Some("https://rancher.example.com/v1/scripts/token".to_string()),
        };

        let inner = render_inner_cloud_config(
            &test_server(Some("10.0.0.5"), Some("2001:db8::5")),
            &test_vlan(),
            "ssh-rsa AAAA",
            &rancher,
        )
        .unwrap();

        assert!(inner.contains("nameservers"));
        assert!(inner.contains("10.0.0.2"));
        assert!(inner.contains("rancher-agent1"));
        assert!(inner.contains("rancher/agent:v1.2.0"));
        assert!(inner.contains("https://rancher.example.com/v1/scripts/token"));
        assert!(inner.contains("privileged: true"));
        assert!(inner.contains("/var/run/docker.sock:/var/run/docker.sock"));
        // The agent registers with the bare IP, no prefix length.
        assert!(inner.contains("CATTLE_AGENT_IP: 10.0.0.5"));
    }

    #[test]
    fn unconfigured_dns_and_agent_service_are_omitted() {
        let inner = render_inner_cloud_config(
            &test_server(Some("10.0.0.5"), Some("2001:db8::5")),
            &test_vlan(),
            "ssh-rsa AAAA",
            &RancherSettings::default(),
        )
        .unwrap();

        assert!(!inner.contains("nameservers"));
        assert!(!inner.contains("services"));
        assert!(!inner.contains("rancher-agent1"));
    }

    #[test]
    fn agent_service_needs_both_image_and_url() {
        let rancher = RancherSettings {
            dns_nameserver: None,
            agent_image: Some("rancher/agent:v1.2.0".to_string()),
            agent_url: None,
        };

        let inner = render_inner_cloud_config(
            &test_server(Some("10.0.0.5"), None),
            &test_vlan(),
            "ssh-rsa AAAA",
            &rancher,
        )
        .unwrap();

        assert!(!inner.contains("rancher-agent1"));
    }
}
