// SQLite connection pool setup: creates the database file when missing,
// enables WAL and runs the schema migrations.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;

use crate::db::migration::run_migrations;

pub async fn establish_connection(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    let in_memory = database_url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    if !in_memory {
        // Enable WAL mode for better concurrency
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    // An in-memory database lives and dies with its single connection
    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    run_migrations(&pool).await?;
    info!("Database ready at {}", database_url);

    Ok(pool)
}
