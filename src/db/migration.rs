use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS wallets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT NOT NULL UNIQUE,
            added_at INTEGER NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    // No uniqueness on hash: a re-delivered transaction is stored again
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            hash TEXT NOT NULL,
            from_address TEXT NOT NULL,
            to_address TEXT,
            value TEXT,
            gas TEXT,
            gas_price TEXT,
            nonce TEXT,
            input TEXT,
            tx_type TEXT,
            v TEXT,
            r TEXT,
            s TEXT,
            ingested_at INTEGER NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_hash
         ON transactions(hash)"
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
