//! Alchemy `alchemy_minedTransactions` feed.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::feed::client::{FeedClient, FeedError, FeedProvider, TransactionStream};
use crate::feed::websocket;
use crate::models::FeedTransaction;

const SUBSCRIPTION_ID: u64 = 1;

pub struct AlchemyClient {
    ws_url: String,
}

impl AlchemyClient {
    pub fn new(ws_url: String) -> Self {
        Self { ws_url }
    }
}

#[async_trait]
impl FeedClient for AlchemyClient {
    fn provider(&self) -> FeedProvider {
        FeedProvider::Alchemy
    }

    async fn subscribe(&self, addresses: &[String]) -> Result<TransactionStream, FeedError> {
        if addresses.is_empty() {
            return Err(FeedError::NoAddresses);
        }

        // The API key is part of the URL, so keep it out of the logs
        info!("Connecting to Alchemy mined transactions feed");
        let mut socket = websocket::connect(&self.ws_url, None).await?;

        let request = subscription_request(addresses);
        websocket::subscribe(&mut socket, &request, SUBSCRIPTION_ID).await?;
        info!("Subscribed to alchemy_minedTransactions for {} addresses", addresses.len());

        Ok(websocket::into_transaction_stream(socket, extract_transaction))
    }
}

/// One `{from}` and one `{to}` filter per address.
pub fn address_filters(addresses: &[String]) -> Vec<Value> {
    addresses
        .iter()
        .flat_map(|address| [json!({ "from": address }), json!({ "to": address })])
        .collect()
}

pub fn subscription_request(addresses: &[String]) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": SUBSCRIPTION_ID,
        "method": "eth_subscribe",
        "params": [
            "alchemy_minedTransactions",
            {
                "addresses": address_filters(addresses),
                "includeRemoved": false,
                "hashesOnly": false,
            }
        ]
    })
}

/// Unwraps `params.result.transaction`.
pub fn extract_transaction(message: &Value) -> Result<Option<FeedTransaction>, FeedError> {
    let Some(result) = websocket::notification_result(message) else {
        return Ok(None);
    };

    let transaction = result
        .get("transaction")
        .filter(|transaction| transaction.is_object())
        .ok_or_else(|| FeedError::MalformedEnvelope("missing params.result.transaction".to_string()))?;

    FeedTransaction::deserialize(transaction)
        .map(Some)
        .map_err(|e| FeedError::MalformedEnvelope(format!("transaction: {e}")))
}
