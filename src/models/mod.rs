// Stored rows (wallets, transactions) and the normalized transaction shape
// produced by the feed clients.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredAddress {
    pub id: i64,
    pub address: String,
    pub added_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub hash: String,
    pub from_address: String,
    pub to_address: Option<String>,
    pub value: Option<String>,
    pub gas: Option<String>,
    pub gas_price: Option<String>,
    pub nonce: Option<String>,
    pub input: Option<String>,
    pub tx_type: Option<String>,
    pub v: Option<String>,
    pub r: Option<String>,
    pub s: Option<String>,
    pub ingested_at: i64,
}

/// A candidate transaction as delivered by a feed, before filtering.
///
/// Apart from `hash` and `from` every field is opaque: it is kept exactly as
/// the provider sent it and never parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedTransaction {
    pub hash: String,
    pub from: String,
    #[serde(default, deserialize_with = "opaque")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    pub gas: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    pub gas_price: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    pub nonce: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    pub input: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "opaque")]
    pub tx_type: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    pub v: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    pub r: Option<String>,
    #[serde(default, deserialize_with = "opaque")]
    pub s: Option<String>,
}

impl FeedTransaction {
    /// Addresses this transaction touches, `from` first.
    pub fn participants(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.from.as_str()).chain(self.to.as_deref())
    }
}

// Strings pass through untouched; other scalars keep their JSON text.
fn opaque<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}
