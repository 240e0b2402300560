// SPDX-License-Identifier: MIT

//! Configuration module for the cloud-config server
//!
//! Loads configuration from environment variables. Missing credentials,
//! a missing VLAN id, or an unreadable SSH public key abort startup.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::render::RancherSettings;


/// Default configuration values
pub mod defaults {
    pub const PORT: &str = "19123";
    pub const BIND_ADDR: &str = "0.0.0.0";
    pub const REFRESH_INTERVAL_SECS: u64 = 10;
    pub const TEST_HOST_IPV4: &str = "127.0.0.1";
    pub const TEST_HOST_IPV6: &str = "::1";
}

/// Environment variable names used by the application
pub mod env_vars {
    pub const MCP_USER: &str = "MCP_USER";
    pub const MCP_PASSWORD: &str = "MCP_PASSWORD";
    pub const MCP_REGION: &str = "MCP_REGION";
    pub const MCP_VLAN_ID: &str = "MCP_VLAN_ID";
    pub const MCP_API_URL: &str = "MCP_API_URL";
    pub const PORT: &str = "PORT";
    pub const SERVER_ADDR: &str = "SERVER_ADDR";
    pub const REFRESH_INTERVAL_SECONDS: &str = "REFRESH_INTERVAL_SECONDS";
    pub const SSH_PUBLIC_KEY_FILE: &str = "SSH_PUBLIC_KEY_FILE";
    pub const MCP_TEST_HOST_IPV4: &str = "MCP_TEST_HOST_IPV4";
    pub const MCP_TEST_HOST_IPV6: &str = "MCP_TEST_HOST_IPV6";
    pub const HOST: &str = "HOST";
    pub const RANCHER_DNS: &str = "RANCHER_DNS";
    pub const RANCHER_AGENT_IMAGE: &str = "RANCHER_AGENT_IMAGE";
    pub const RANCHER_AGENT_URL: &str = "RANCHER_AGENT_URL";
}

/// Application-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// CloudControl API username
    pub mcp_user: String,
    /// CloudControl API password
    pub mcp_password: String,
    /// CloudControl region, e.g. "dd-eu"
    pub mcp_region: String,
    /// VLAN whose network domain is served
    pub vlan_id: String,
    /// Optional API base URL override (testing / private endpoints)
    pub api_url: Option<String>,
    /// Listen address for the HTTP server
    pub server_addr: String,
    /// Server metadata refresh interval in seconds
    pub refresh_interval_secs: u64,
    /// Path to the SSH public key embedded in rendered configs
    pub ssh_public_key_file: PathBuf,
    /// Hostname used for the synthetic loopback test record
    pub test_hostname: String,
    /// IPv4 address used for the synthetic loopback test record
    pub test_host_ipv4: String,
    /// IPv6 address used for the synthetic loopback test record
    pub test_host_ipv6: String,
    /// DNS nameserver written into rendered configs, when set
    pub rancher_dns: Option<String>,
    /// Rancher agent container image, when set
    pub rancher_agent_image: Option<String>,
    /// Rancher agent registration URL, when set
    pub rancher_agent_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mcp_user: String::new(),
            mcp_password: String::new(),
            mcp_region: String::new(),
            vlan_id: String::new(),
            api_url: None,
            server_addr: format!("{}:{}", defaults::BIND_ADDR, defaults::PORT),
            refresh_interval_secs: defaults::REFRESH_INTERVAL_SECS,
            ssh_public_key_file: default_ssh_public_key_file(),
            test_hostname: "localhost".to_string(),
            test_host_ipv4: defaults::TEST_HOST_IPV4.to_string(),
            test_host_ipv6: defaults::TEST_HOST_IPV6.to_string(),
            rancher_dns: None,
            rancher_agent_image: None,
            rancher_agent_url: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a required variable is missing or
    /// empty. There is no partial-startup mode.
    pub fn from_env() -> Result<Self> {
        let mcp_user = require_env(env_vars::MCP_USER)?;
        let mcp_password = require_env(env_vars::MCP_PASSWORD)?;
        let mcp_region = require_env(env_vars::MCP_REGION)?;
        let vlan_id = require_env(env_vars::MCP_VLAN_ID)?;

        let api_url = std::env::var(env_vars::MCP_API_URL).ok();

        // SERVER_ADDR wins; otherwise bind all interfaces on PORT.
        let server_addr = std::env::var(env_vars::SERVER_ADDR).unwrap_or_else(|_| {
            let port =
                std::env::var(env_vars::PORT).unwrap_or_else(|_| defaults::PORT.to_string());
            format!("{}:{}", defaults::BIND_ADDR, port)
        });

        let refresh_interval_secs = std::env::var(env_vars::REFRESH_INTERVAL_SECONDS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::REFRESH_INTERVAL_SECS);

        let ssh_public_key_file = std::env::var(env_vars::SSH_PUBLIC_KEY_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_ssh_public_key_file());

        let test_hostname =
            std::env::var(env_vars::HOST).unwrap_or_else(|_| "localhost".to_string());
        let test_host_ipv4 = std::env::var(env_vars::MCP_TEST_HOST_IPV4)
            .unwrap_or_else(|_| defaults::TEST_HOST_IPV4.to_string());
        let test_host_ipv6 = std::env::var(env_vars::MCP_TEST_HOST_IPV6)
            .unwrap_or_else(|_| defaults::TEST_HOST_IPV6.to_string());

        let rancher_dns = std::env::var(env_vars::RANCHER_DNS).ok();
        let rancher_agent_image = std::env::var(env_vars::RANCHER_AGENT_IMAGE).ok();
        let rancher_agent_url = std::env::var(env_vars::RANCHER_AGENT_URL).ok();

        Ok(Config {
            mcp_user,
            mcp_password,
            mcp_region,
            vlan_id,
            api_url,
            server_addr,
            refresh_interval_secs,
            ssh_public_key_file,
            test_hostname,
            test_host_ipv4,
            test_host_ipv6,
            rancher_dns,
            rancher_agent_image,
            rancher_agent_url,
        })
    }

    /// RancherOS document settings derived from this configuration
    #[must_use]
    pub fn rancher_settings(&self) -> RancherSettings {
        RancherSettings {
            dns_nameserver: self.rancher_dns.clone(),
            agent_image: self.rancher_agent_image.clone(),
            agent_url: self.rancher_agent_url.clone(),
        }
    }
}

/// Reads the SSH public key file, rejecting empty keys
pub fn load_ssh_public_key(path: &Path) -> Result<String> {
    let key = std::fs::read_to_string(path)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::Config(format!(
            "SSH public key file '{}' is empty",
            path.display()
        )));
    }
    Ok(key.to_string())
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("{name} must be set")))
}

fn default_ssh_public_key_file() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".ssh").join("id_rsa.pub")
}
