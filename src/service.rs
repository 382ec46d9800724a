// Entry points used by the presentation layer. Validates and normalizes
// wallet addresses, keeps the address cache in step with the wallets table,
// and delegates everything else to the stores and the ingestion controller.

use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::cache::AddressCache;
use crate::db::{address, transaction};
use crate::feed::{IngestionController, MonitorStatus, StartOutcome, StopOutcome, ToggleOutcome};
use crate::models::{MonitoredAddress, TransactionRecord};
use crate::validation::{normalize_address, validate_eth_address, ValidationError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct MonitorService {
    db_pool: SqlitePool,
    cache: AddressCache,
    controller: Arc<IngestionController>,
}

impl MonitorService {
    pub fn new(db_pool: SqlitePool, cache: AddressCache, controller: Arc<IngestionController>) -> Self {
        Self {
            db_pool,
            cache,
            controller,
        }
    }

    pub async fn toggle_monitoring(&self) -> Result<ToggleOutcome, ServiceError> {
        Ok(self.controller.toggle().await?)
    }

    pub async fn start_monitoring(&self) -> Result<StartOutcome, ServiceError> {
        Ok(self.controller.start().await?)
    }

    pub async fn stop_monitoring(&self) -> StopOutcome {
        self.controller.stop().await
    }

    pub async fn monitoring_status(&self) -> MonitorStatus {
        self.controller.status().await
    }

    /// Registers a wallet. Adding one that is already monitored is a no-op
    /// returning the existing entry.
    ///
    /// A running session keeps the provider-side filter it subscribed with;
    /// the new wallet reaches that filter on the next start.
    pub async fn add_wallet(&self, raw_address: &str) -> Result<MonitoredAddress, ServiceError> {
        let address = validate_eth_address(raw_address)?;
        let wallet = address::add_address(&self.db_pool, &address).await?;
        self.cache.set_tracked(&address, true).await;

        info!("Added address {} to monitoring", address);
        Ok(wallet)
    }

    /// Returns whether the wallet was monitored. Unknown wallets are a no-op.
    pub async fn remove_wallet(&self, raw_address: &str) -> Result<bool, ServiceError> {
        let address = normalize_address(raw_address);
        let removed = address::remove_address(&self.db_pool, &address).await?;
        self.cache.set_tracked(&address, false).await;

        if removed {
            info!("Removed address {} from monitoring", address);
        }
        Ok(removed)
    }

    pub async fn list_wallets(&self) -> Result<Vec<MonitoredAddress>, ServiceError> {
        Ok(address::list_addresses(&self.db_pool).await?)
    }

    /// Newest first.
    pub async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, ServiceError> {
        Ok(transaction::list_transactions(&self.db_pool).await?)
    }
}
