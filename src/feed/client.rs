use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio_tungstenite::tungstenite;
use tracing::info;

use crate::config::Config;
use crate::feed::alchemy::AlchemyClient;
use crate::feed::bloxroute::BloxrouteClient;
use crate::models::FeedTransaction;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Feed configuration error: {0}")]
    Config(String),

    #[error("WebSocket error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("Failed to decode feed message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Subscription rejected by provider: {0}")]
    Rejected(String),

    #[error("Malformed feed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("No addresses to monitor")]
    NoAddresses,

    #[error("Connection closed before the subscription was acknowledged")]
    Closed,
}

/// Normalized transactions from one live subscription. The stream ends when
/// the provider closes the connection; the first `Err` item is terminal.
pub type TransactionStream = BoxStream<'static, Result<FeedTransaction, FeedError>>;

/// One upstream provider capable of streaming transactions for a set of
/// addresses.
#[async_trait]
pub trait FeedClient: Send + Sync {
    fn provider(&self) -> FeedProvider;

    /// Connects, subscribes for `addresses` and waits for the acknowledgement.
    ///
    /// The address filter is fixed for the lifetime of the returned stream.
    /// An empty address list fails with [`FeedError::NoAddresses`] without
    /// touching the network.
    async fn subscribe(&self, addresses: &[String]) -> Result<TransactionStream, FeedError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedProvider {
    /// bloXroute `newTxs`, filtered server-side.
    Bloxroute,
    /// Alchemy `alchemy_minedTransactions`.
    Alchemy,
}

impl fmt::Display for FeedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bloxroute => write!(f, "bloxroute"),
            Self::Alchemy => write!(f, "alchemy"),
        }
    }
}

impl FromStr for FeedProvider {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bloxroute" => Ok(Self::Bloxroute),
            "alchemy" => Ok(Self::Alchemy),
            other => Err(FeedError::Config(format!("unknown feed provider: {other}"))),
        }
    }
}

/// Builds the client selected by `FEED_PROVIDER`. An unknown provider name is
/// a [`FeedError::Config`].
pub fn build_feed_client(config: &Config) -> Result<Arc<dyn FeedClient>, FeedError> {
    let provider: FeedProvider = config.feed_provider.parse()?;
    let client: Arc<dyn FeedClient> = match provider {
        FeedProvider::Bloxroute => {
            let url = config
                .bloxroute_ws_url
                .clone()
                .ok_or_else(|| FeedError::Config("BLOXROUTE_WS_URL is not set".to_string()))?;
            let api_key = config
                .bloxroute_api_key
                .clone()
                .ok_or_else(|| FeedError::Config("BLOXROUTE_API_KEY is not set".to_string()))?;
            Arc::new(BloxrouteClient::new(url, api_key))
        }
        FeedProvider::Alchemy => {
            let url = config
                .alchemy_ws_url
                .clone()
                .ok_or_else(|| FeedError::Config("ALCHEMY_WS_URL is not set".to_string()))?;
            Arc::new(AlchemyClient::new(url))
        }
    };

    info!("Using {} transaction feed", client.provider());
    Ok(client)
}
