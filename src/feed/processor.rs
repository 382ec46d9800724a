use sqlx::SqlitePool;
use tracing::debug;

use crate::cache::AddressCache;
use crate::db::transaction;
use crate::models::{FeedTransaction, TransactionRecord};
use crate::validation::normalize_address;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Stored(TransactionRecord),
    /// Neither side of the transaction is monitored right now.
    Dropped,
}

/// Stores `tx` if its `from` or `to` is monitored at this moment.
///
/// Membership is checked against the current wallet set rather than the set
/// the subscription was opened with, so removals take effect immediately.
pub async fn ingest_transaction(
    db_pool: &SqlitePool,
    cache: &AddressCache,
    tx: &FeedTransaction,
) -> Result<IngestOutcome, sqlx::Error> {
    if !is_transaction_relevant(db_pool, cache, tx).await? {
        debug!("Dropping transaction {}: no monitored participant", tx.hash);
        return Ok(IngestOutcome::Dropped);
    }

    let record = transaction::add_transaction(db_pool, tx).await?;
    debug!("Stored transaction {} as #{}", record.hash, record.id);
    Ok(IngestOutcome::Stored(record))
}

/// Check if a transaction involves tracked addresses
async fn is_transaction_relevant(
    db_pool: &SqlitePool,
    cache: &AddressCache,
    tx: &FeedTransaction,
) -> Result<bool, sqlx::Error> {
    for participant in tx.participants() {
        if cache.is_tracked(db_pool, &normalize_address(participant)).await? {
            return Ok(true);
        }
    }

    Ok(false)
}
