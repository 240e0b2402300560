// SPDX-License-Identifier: MIT

//! MAC address resolution from the system ARP table
//!
//! The request handler only knows the caller's IP address; the ARP table
//! is what ties that back to a MAC address the metadata cache can key on.
//! The table is re-read from `/proc/net/arp` on a short cycle, so
//! resolution is eventually consistent and may miss hosts the kernel has
//! not talked to recently.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;

use crate::error::Result;

/// How often the ARP table is re-read
pub const ARP_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

const PROC_NET_ARP: &str = "/proc/net/arp";
const NULL_MAC: &str = "00:00:00:00:00:00";

/// Maps a peer IP address to a MAC address
///
/// Resolution may return nothing (unknown IP) and is safe to call
/// concurrently with cache operations.
#[async_trait]
pub trait MacResolver: Send + Sync {
    async fn resolve(&self, ip: IpAddr) -> Option<String>;
}

/// IP → MAC mapping read from the kernel ARP table
pub struct ArpTable {
    path: PathBuf,
    entries: RwLock<HashMap<IpAddr, String>>,
}

impl Default for ArpTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ArpTable {
    #[must_use]
    pub fn new() -> Self {
        Self::with_path(PROC_NET_ARP)
    }

    /// Reads ARP entries from an alternative file (tests)
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Re-reads the ARP table, replacing the previous entries
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` when the table file cannot be read; the
    /// previous entries are kept in that case.
    pub async fn refresh(&self) -> Result<()> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let parsed = parse_arp_table(&contents);

        let mut entries = self.entries.write().await;
        *entries = parsed;

        Ok(())
    }

    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }
}

#[async_trait]
impl MacResolver for ArpTable {
    async fn resolve(&self, ip: IpAddr) -> Option<String> {
        let entries = self.entries.read().await;
        entries.get(&ip).cloned()
    }
}

/// Parses `/proc/net/arp` contents into an IP → MAC mapping
///
/// Line format: `IP address  HW type  Flags  HW address  Mask  Device`.
/// Incomplete entries (flags `0x0` or an all-zero MAC) are dropped.
fn parse_arp_table(contents: &str) -> HashMap<IpAddr, String> {
    let mut entries = HashMap::new();

    for line in contents.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }

        let (ip, flags, mac) = (fields[0], fields[2], fields[3]);
        if flags == "0x0" || mac == NULL_MAC {
            continue;
        }

        if let Ok(ip) = ip.parse::<IpAddr>() {
            entries.insert(ip, mac.to_string());
        }
    }

    entries
}

/// Starts the background ARP table refresh loop
///
/// Performs one immediate read, then re-reads every `interval` until the
/// shutdown signal fires. Read failures are logged and the previous
/// entries kept.
pub fn start_arp_refresh_loop(
    table: std::sync::Arc<ArpTable>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tracing::info!("Starting ARP table refresh loop every {}s", interval.as_secs());

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = table.refresh().await {
                        tracing::warn!("ARP table refresh failed: {e}");
                    }
                },
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!("Stopping ARP table refresh loop");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const SAMPLE: &str = "\
IP address       HW type     Flags       HW address            Mask     Device
10.0.0.5         0x1         0x2         aa:bb:cc:dd:ee:01     *        eth0
10.0.0.9         0x1         0x0         00:00:00:00:00:00     *        eth0
10.0.0.12        0x1         0x2         aa:bb:cc:dd:ee:0c     *        eth1
";

    #[test]
    fn test_parse_skips_header_and_incomplete_entries() {
        let entries = parse_arp_table(SAMPLE);
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries.get(&"10.0.0.5".parse::<IpAddr>().unwrap()).unwrap(),
            "aa:bb:cc:dd:ee:01"
        );
        assert!(!entries.contains_key(&"10.0.0.9".parse::<IpAddr>().unwrap()));
    }

    #[test]
    fn test_parse_empty_table() {
        let entries = parse_arp_table("IP address HW type Flags HW address Mask Device\n");
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_and_resolve_from_file() {
        let path = std::env::temp_dir().join("cloudconfig-server-arp-test");
        std::fs::write(&path, SAMPLE).unwrap();

        let table = ArpTable::with_path(&path);
        table.refresh().await.unwrap();

        let mac = table.resolve("10.0.0.12".parse().unwrap()).await;
        assert_eq!(mac.as_deref(), Some("aa:bb:cc:dd:ee:0c"));
        assert!(table.resolve("10.0.0.99".parse().unwrap()).await.is_none());

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_entries() {
        let path = std::env::temp_dir().join("cloudconfig-server-arp-gone");
        std::fs::write(&path, SAMPLE).unwrap();

        let table = ArpTable::with_path(&path);
        table.refresh().await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(table.refresh().await.is_err());
        assert_eq!(table.len().await, 2);
    }

    #[tokio::test]
    async fn test_refresh_loop_respects_shutdown_signal() {
        let path = std::env::temp_dir().join("cloudconfig-server-arp-loop");
        std::fs::write(&path, SAMPLE).unwrap();

        let table = Arc::new(ArpTable::with_path(&path));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = start_arp_refresh_loop(table.clone(), Duration::from_millis(10), shutdown_rx);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(table.len().await, 2);

        let _ = shutdown_tx.send(true);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("ARP refresh loop did not stop on shutdown signal")
            .unwrap();

        std::fs::remove_file(&path).ok();
    }
}
