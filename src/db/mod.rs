pub mod address;
pub mod connection;
pub mod transaction;
pub mod migration;

use chrono::Utc;

/// Unix timestamp (seconds) stamped onto new rows.
pub(crate) fn now_unix() -> i64 {
    Utc::now().timestamp()
}
