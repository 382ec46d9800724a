//! bloXroute `newTxs` feed.
//!
//! The provider filters server-side: the subscription carries a filter
//! expression listing every monitored address on both the `to` and `from`
//! side, so each notification should already be relevant. The controller
//! still re-checks membership before storing.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::feed::client::{FeedClient, FeedError, FeedProvider, TransactionStream};
use crate::feed::websocket;
use crate::models::FeedTransaction;

const SUBSCRIPTION_ID: u64 = 1;

pub struct BloxrouteClient {
    ws_url: String,
    api_key: String,
}

impl BloxrouteClient {
    pub fn new(ws_url: String, api_key: String) -> Self {
        Self { ws_url, api_key }
    }
}

#[async_trait]
impl FeedClient for BloxrouteClient {
    fn provider(&self) -> FeedProvider {
        FeedProvider::Bloxroute
    }

    async fn subscribe(&self, addresses: &[String]) -> Result<TransactionStream, FeedError> {
        if addresses.is_empty() {
            return Err(FeedError::NoAddresses);
        }

        info!("Connecting to bloXroute feed at {}", self.ws_url);
        let mut socket = websocket::connect(&self.ws_url, Some(self.api_key.as_str())).await?;

        let request = subscription_request(addresses);
        websocket::subscribe(&mut socket, &request, SUBSCRIPTION_ID).await?;
        info!("Subscribed to newTxs for {} addresses", addresses.len());

        Ok(websocket::into_transaction_stream(socket, extract_transaction))
    }
}

/// `({to} IN ['0x..', ...]) OR ({from} IN ['0x..', ...])`
pub fn filter_expression(addresses: &[String]) -> String {
    let list = addresses
        .iter()
        .map(|address| format!("'{}'", address))
        .collect::<Vec<_>>()
        .join(", ");

    format!("({{to}} IN [{list}]) OR ({{from}} IN [{list}])")
}

pub fn subscription_request(addresses: &[String]) -> Value {
    json!({
        "id": SUBSCRIPTION_ID,
        "method": "subscribe",
        "params": [
            "newTxs",
            {
                "include": ["tx_hash", "tx_contents"],
                "filters": filter_expression(addresses),
            }
        ]
    })
}

/// Unwraps `params.result.txContents`. When the contents omit `hash` the
/// sibling `txHash` is used instead.
pub fn extract_transaction(message: &Value) -> Result<Option<FeedTransaction>, FeedError> {
    let Some(result) = websocket::notification_result(message) else {
        return Ok(None);
    };

    let mut contents = result
        .get("txContents")
        .filter(|contents| contents.is_object())
        .cloned()
        .ok_or_else(|| FeedError::MalformedEnvelope("missing params.result.txContents".to_string()))?;

    if contents.get("hash").map_or(true, Value::is_null) {
        if let (Some(hash), Some(object)) = (result.get("txHash"), contents.as_object_mut()) {
            object.insert("hash".to_string(), hash.clone());
        }
    }

    serde_json::from_value(contents)
        .map(Some)
        .map_err(|e| FeedError::MalformedEnvelope(format!("txContents: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses() -> Vec<String> {
        vec![
            "0x1111111111111111111111111111111111111111".to_string(),
            "0x2222222222222222222222222222222222222222".to_string(),
        ]
    }

    #[test]
    fn filter_covers_both_sides() {
        assert_eq!(
            filter_expression(&addresses()),
            "({to} IN ['0x1111111111111111111111111111111111111111', '0x2222222222222222222222222222222222222222']) \
             OR ({from} IN ['0x1111111111111111111111111111111111111111', '0x2222222222222222222222222222222222222222'])"
        );
    }

    #[test]
    fn request_shape() {
        let request = subscription_request(&addresses());
        assert_eq!(request["id"], 1);
        assert_eq!(request["method"], "subscribe");
        assert_eq!(request["params"][0], "newTxs");
        assert_eq!(request["params"][1]["include"], json!(["tx_hash", "tx_contents"]));
        assert!(request["params"][1]["filters"].as_str().unwrap().starts_with("({to} IN ["));
    }

    #[test]
    fn unwraps_tx_contents() {
        let message = json!({
            "jsonrpc": "2.0",
            "method": "subscribe",
            "params": {
                "subscription": "abc",
                "result": {
                    "txHash": "0xfeed",
                    "txContents": {
                        "from": "0x1111111111111111111111111111111111111111",
                        "to": "0x3333333333333333333333333333333333333333",
                        "value": "0x1",
                        "gas": "0x5208",
                        "gasPrice": "0x2",
                        "nonce": "0x7",
                        "input": "0x",
                        "type": "0x0",
                        "v": "0x25",
                        "r": "0xaa",
                        "s": "0xbb"
                    }
                }
            }
        });

        let tx = extract_transaction(&message).unwrap().unwrap();
        assert_eq!(tx.hash, "0xfeed");
        assert_eq!(tx.gas.as_deref(), Some("0x5208"));
        assert_eq!(tx.tx_type.as_deref(), Some("0x0"));
    }

    #[test]
    fn non_notifications_are_skipped() {
        assert!(extract_transaction(&json!({"id": 1, "result": "sub-id"})).unwrap().is_none());
    }

    #[test]
    fn missing_contents_is_malformed() {
        let message = json!({"params": {"result": {"txHash": "0x1"}}});
        assert!(matches!(
            extract_transaction(&message),
            Err(FeedError::MalformedEnvelope(_))
        ));

        let message = json!({"params": {"result": {"txContents": {"hash": "0x1"}}}});
        assert!(matches!(
            extract_transaction(&message),
            Err(FeedError::MalformedEnvelope(_))
        ));
    }
}
