use sqlx::{Pool, Row, Sqlite};
use sqlx::sqlite::SqliteRow;

use crate::db::now_unix;
use crate::models::{FeedTransaction, TransactionRecord};

/// Appends one transaction. Always a new row; hashes are not deduplicated.
pub async fn add_transaction(
    pool: &Pool<Sqlite>,
    transaction: &FeedTransaction,
) -> Result<TransactionRecord, sqlx::Error> {
    let ingested_at = now_unix();

    let result = sqlx::query(
        r#"
        INSERT INTO transactions
        (hash, from_address, to_address, value, gas, gas_price, nonce, input, tx_type, v, r, s, ingested_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#
    )
    .bind(&transaction.hash)
    .bind(&transaction.from)
    .bind(&transaction.to)
    .bind(&transaction.value)
    .bind(&transaction.gas)
    .bind(&transaction.gas_price)
    .bind(&transaction.nonce)
    .bind(&transaction.input)
    .bind(&transaction.tx_type)
    .bind(&transaction.v)
    .bind(&transaction.r)
    .bind(&transaction.s)
    .bind(ingested_at)
    .execute(pool)
    .await?;

    Ok(TransactionRecord {
        id: result.last_insert_rowid(),
        hash: transaction.hash.clone(),
        from_address: transaction.from.clone(),
        to_address: transaction.to.clone(),
        value: transaction.value.clone(),
        gas: transaction.gas.clone(),
        gas_price: transaction.gas_price.clone(),
        nonce: transaction.nonce.clone(),
        input: transaction.input.clone(),
        tx_type: transaction.tx_type.clone(),
        v: transaction.v.clone(),
        r: transaction.r.clone(),
        s: transaction.s.clone(),
        ingested_at,
    })
}

/// All stored transactions, most recent first.
pub async fn list_transactions(pool: &Pool<Sqlite>) -> Result<Vec<TransactionRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, hash, from_address, to_address, value, gas, gas_price,
                  nonce, input, tx_type, v, r, s, ingested_at
           FROM transactions
           ORDER BY id DESC"#
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_transaction).collect())
}

pub async fn count_transactions(pool: &Pool<Sqlite>) -> Result<i64, sqlx::Error> {
    let count = sqlx::query("SELECT COUNT(*) FROM transactions")
        .fetch_one(pool)
        .await?
        .get::<i64, _>(0);

    Ok(count)
}

fn map_transaction(row: &SqliteRow) -> TransactionRecord {
    TransactionRecord {
        id: row.get("id"),
        hash: row.get("hash"),
        from_address: row.get("from_address"),
        to_address: row.get("to_address"),
        value: row.get("value"),
        gas: row.get("gas"),
        gas_price: row.get("gas_price"),
        nonce: row.get("nonce"),
        input: row.get("input"),
        tx_type: row.get("tx_type"),
        v: row.get("v"),
        r: row.get("r"),
        s: row.get("s"),
        ingested_at: row.get("ingested_at"),
    }
}
