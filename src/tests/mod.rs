//! Shared fixtures for the service-level tests.

mod api_tests;

use async_trait::async_trait;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::{stream, StreamExt};
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::AddressCache;
use crate::db::connection::establish_connection;
use crate::feed::{FeedClient, FeedError, FeedProvider, IngestionController, TransactionStream};
use crate::models::FeedTransaction;
use crate::service::MonitorService;

pub fn watched() -> String {
    format!("0x{}", "A".repeat(40))
}

pub fn other_address(digit: char) -> String {
    format!("0x{}", digit.to_string().repeat(40))
}

pub async fn test_pool() -> SqlitePool {
    establish_connection("sqlite::memory:").await.expect("in-memory database")
}

pub fn test_cache() -> AddressCache {
    AddressCache::new(1_000, Duration::from_secs(60))
}

pub fn sample_tx(hash: &str, from: &str, to: Option<&str>) -> FeedTransaction {
    FeedTransaction {
        hash: hash.to_string(),
        from: from.to_string(),
        to: to.map(str::to_string),
        value: Some("0x2386F26FC10000".to_string()),
        gas: Some("0x5208".to_string()),
        gas_price: Some("0x12A05F200".to_string()),
        nonce: Some("0x2a".to_string()),
        input: Some("0x".to_string()),
        tx_type: Some("0x2".to_string()),
        v: Some("0x1".to_string()),
        r: Some("0x5e1d3a76fbf824220eafc8c79ad578ad2b67d01b0c2425eb1f1347e8f50882ab".to_string()),
        s: Some("0x5bd428537f05f9830e93792f90ea6a3e2d1ee84952dd96edbae9f658f831ab13".to_string()),
    }
}

/// Polls `check` until it holds, failing the test after five seconds.
pub async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check().await {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// In-process feed: every subscription gets its own channel, and the test
/// pushes items into the most recent one.
#[derive(Default)]
pub struct ChannelFeed {
    senders: Mutex<Vec<UnboundedSender<Result<FeedTransaction, FeedError>>>>,
    subscribed_with: Mutex<Vec<Vec<String>>>,
    open: Arc<AtomicUsize>,
    max_open: Arc<AtomicUsize>,
}

struct OpenConnection(Arc<AtomicUsize>);

impl Drop for OpenConnection {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ChannelFeed {
    pub fn subscriptions(&self) -> usize {
        self.subscribed_with.lock().unwrap().len()
    }

    pub fn last_addresses(&self) -> Vec<String> {
        self.subscribed_with.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn max_open_connections(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    pub fn push(&self, item: Result<FeedTransaction, FeedError>) {
        let senders = self.senders.lock().unwrap();
        senders
            .last()
            .expect("no subscription yet")
            .unbounded_send(item)
            .expect("subscription dropped");
    }

    /// Simulates the provider closing the current connection.
    pub fn close_current(&self) {
        if let Some(sender) = self.senders.lock().unwrap().last() {
            sender.close_channel();
        }
    }
}

#[async_trait]
impl FeedClient for ChannelFeed {
    fn provider(&self) -> FeedProvider {
        FeedProvider::Bloxroute
    }

    async fn subscribe(&self, addresses: &[String]) -> Result<TransactionStream, FeedError> {
        if addresses.is_empty() {
            return Err(FeedError::NoAddresses);
        }

        let (sender, receiver) = unbounded();
        self.senders.lock().unwrap().push(sender);
        self.subscribed_with.lock().unwrap().push(addresses.to_vec());

        let now_open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(now_open, Ordering::SeqCst);
        let guard = OpenConnection(self.open.clone());

        Ok(stream::unfold((receiver, guard), |(mut receiver, guard)| async move {
            receiver.next().await.map(|item| (item, (receiver, guard)))
        })
        .boxed())
    }
}

pub struct Harness {
    pub pool: SqlitePool,
    pub feed: Arc<ChannelFeed>,
    pub controller: Arc<IngestionController>,
    pub service: MonitorService,
}

pub async fn harness() -> Harness {
    let pool = test_pool().await;
    let cache = test_cache();
    let feed = Arc::new(ChannelFeed::default());
    let controller = Arc::new(IngestionController::new(pool.clone(), cache.clone(), feed.clone()));
    let service = MonitorService::new(pool.clone(), cache, controller.clone());

    Harness {
        pool,
        feed,
        controller,
        service,
    }
}
