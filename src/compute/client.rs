//! CloudControl API client

use async_trait::async_trait;

use crate::error::{AppError, Result};

use super::inventory::ServerInventory;
use super::types::{NetworkDomain, ServerPage, Vlan};

/// CloudControl compute API client
///
/// Thin HTTPS+JSON client for the pieces of the compute API this service
/// needs: VLAN and network-domain lookups at startup, and the paginated
/// server listing drained on every cache refresh.
pub struct ComputeClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl ComputeClient {
    /// Creates a client for the given CloudControl region
    #[must_use]
    pub fn new(region: &str, username: &str, password: &str) -> Self {
        Self::with_base_url(
            format!("https://api-{region}.dimensiondata.com/caas/2.4"),
            username,
            password,
        )
    }

    /// Creates a client against an explicit API base URL
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>, username: &str, password: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Looks up a VLAN by id
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the API answers with a non-2xx
    /// status (including an unknown VLAN id); these lookups only happen
    /// at startup, where a missing record is a configuration problem.
    pub async fn get_vlan(&self, vlan_id: &str) -> Result<Vlan> {
        let url = format!("{}/vlan/{vlan_id}", self.base_url);
        let response = self
            .get(&url)
            .await
            .map_err(|e| startup_lookup_error(e, &format!("Cannot find VLAN '{vlan_id}'")))?;
        Ok(response.json().await?)
    }

    /// Looks up a network domain by id
    pub async fn get_network_domain(&self, network_domain_id: &str) -> Result<NetworkDomain> {
        let url = format!("{}/networkDomain/{network_domain_id}", self.base_url);
        let response = self.get(&url).await.map_err(|e| {
            startup_lookup_error(
                e,
                &format!("Cannot find network domain '{network_domain_id}'"),
            )
        })?;
        Ok(response.json().await?)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Inventory(format!("GET {url} returned {status}")));
        }

        Ok(response)
    }
}

/// Reclassifies a failed startup lookup as a configuration error
///
/// Transport-level failures keep their own variant; only an API-level
/// miss becomes `AppError::Config`.
fn startup_lookup_error(err: AppError, description: &str) -> AppError {
    match err {
        AppError::Inventory(msg) => AppError::Config(format!("{description}: {msg}")),
        other => other,
    }
}

#[async_trait]
impl ServerInventory for ComputeClient {
    async fn list_servers_page(
        &self,
        network_domain_id: &str,
        page_number: u32,
        page_size: u32,
    ) -> Result<ServerPage> {
        let url = format!(
            "{}/server?networkDomainId={network_domain_id}&pageNumber={page_number}&pageSize={page_size}",
            self.base_url
        );
        let response = self.get(&url).await?;
        Ok(response.json().await?)
    }
}
