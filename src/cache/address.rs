//! Address membership cache implementation

use std::sync::Arc;
use std::time::Duration;
use moka::future::Cache;
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::debug;

use crate::db::address;

/// Caches "is this address monitored" answers in front of the wallets table.
///
/// The ingestion path asks once or twice per feed message, so the answers
/// are kept for a short TTL. Wallet changes made through the service write
/// the new answer straight into the cache.
#[derive(Clone)]
pub struct AddressCache {
    cache: Cache<String, bool>,
    // Read-throughs hold this shared from the store read until their insert;
    // write-throughs take it exclusively, so a stale read never lands last.
    fill: Arc<RwLock<()>>,
}

impl AddressCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self {
            cache,
            fill: Arc::new(RwLock::new(())),
        }
    }

    /// Cached answer, or a read-through to the store. `address` must be
    /// normalized.
    pub async fn is_tracked(&self, pool: &SqlitePool, address: &str) -> Result<bool, sqlx::Error> {
        if let Some(tracked) = self.cache.get(address).await {
            return Ok(tracked);
        }

        let _fill = self.fill.read().await;
        // A write-through may have landed while we waited
        if let Some(tracked) = self.cache.get(address).await {
            return Ok(tracked);
        }

        let tracked = address::is_address_tracked(pool, address).await?;
        self.cache.insert(address.to_string(), tracked).await;
        debug!("Cached address tracking status: {} = {}", address, tracked);
        Ok(tracked)
    }

    /// Call after the wallets table has been changed.
    pub async fn set_tracked(&self, address: &str, tracked: bool) {
        let _fill = self.fill.write().await;
        self.cache.insert(address.to_string(), tracked).await;
        debug!("Updated address tracking status: {} = {}", address, tracked);
    }
}
