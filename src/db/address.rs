// Monitored wallet addresses. Callers pass addresses already validated and
// normalized; nothing here checks the format.

use sqlx::{Pool, Row, Sqlite};
use sqlx::sqlite::SqliteRow;

use crate::db::now_unix;
use crate::models::MonitoredAddress;

/// Inserts `address`, or returns the existing row when it is already tracked.
pub async fn add_address(pool: &Pool<Sqlite>, address: &str) -> Result<MonitoredAddress, sqlx::Error> {
    sqlx::query(
        "INSERT INTO wallets (address, added_at) VALUES (?, ?)
         ON CONFLICT(address) DO NOTHING"
    )
    .bind(address)
    .bind(now_unix())
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT id, address, added_at FROM wallets WHERE address = ?")
        .bind(address)
        .fetch_one(pool)
        .await?;

    Ok(map_address(&row))
}

/// Returns whether a row was deleted. Unknown addresses are not an error.
pub async fn remove_address(pool: &Pool<Sqlite>, address: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM wallets WHERE address = ?")
        .bind(address)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn is_address_tracked(pool: &Pool<Sqlite>, address: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("SELECT 1 FROM wallets WHERE address = ?")
        .bind(address)
        .fetch_optional(pool)
        .await?;

    Ok(result.is_some())
}

pub async fn list_addresses(pool: &Pool<Sqlite>) -> Result<Vec<MonitoredAddress>, sqlx::Error> {
    let rows = sqlx::query("SELECT id, address, added_at FROM wallets ORDER BY id ASC")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(map_address).collect())
}

pub async fn get_all_tracked_addresses(pool: &Pool<Sqlite>) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT address FROM wallets ORDER BY id ASC")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|row| row.get("address")).collect())
}

fn map_address(row: &SqliteRow) -> MonitoredAddress {
    MonitoredAddress {
        id: row.get("id"),
        address: row.get("address"),
        added_at: row.get("added_at"),
    }
}
