//! Inventory listing seam consumed by the server metadata cache

use async_trait::async_trait;

use crate::error::Result;

use super::types::ServerPage;

/// Paginated access to the virtual machines of a network domain
///
/// The server metadata cache drains this page by page on every refresh;
/// test doubles implement it to exercise the cache without a remote API.
#[async_trait]
pub trait ServerInventory: Send + Sync {
    /// Fetches one page of the server listing for a network domain
    ///
    /// Page numbers start at 1. A page with no items terminates the
    /// listing.
    async fn list_servers_page(
        &self,
        network_domain_id: &str,
        page_number: u32,
        page_size: u32,
    ) -> Result<ServerPage>;
}
