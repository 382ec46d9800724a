use futures::StreamExt;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::AddressCache;
use crate::db::address;
use crate::feed::client::{FeedClient, FeedError, FeedProvider};
use crate::feed::processor::{self, IngestOutcome};

/// Lifecycle of the feed connection owned by the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connecting,
    /// Subscription acknowledged, nothing received yet.
    Subscribed,
    Streaming,
    Closed,
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
    /// Nothing to watch; no connection was opened.
    NoAddresses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Started,
    Stopped,
    NoAddresses,
}

/// Connection state and last failure of the current (or last) session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub connection: ConnectionState,
    pub subscribed_addresses: usize,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub running: bool,
    pub provider: FeedProvider,
    pub connection: ConnectionState,
    pub subscribed_addresses: usize,
    pub received: u64,
    pub stored: u64,
    pub dropped: u64,
    pub store_errors: u64,
    pub last_error: Option<String>,
}

struct Session {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl Session {
    fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

struct SessionShared {
    report: watch::Sender<SessionReport>,
    /// Set when a session is spawned, cleared when its task ends.
    running: AtomicBool,
    received: AtomicU64,
    stored: AtomicU64,
    dropped: AtomicU64,
    store_errors: AtomicU64,
}

impl SessionShared {
    fn new() -> Self {
        let (report, _) = watch::channel(SessionReport {
            connection: ConnectionState::Idle,
            subscribed_addresses: 0,
            last_error: None,
        });

        Self {
            report,
            running: AtomicBool::new(false),
            received: AtomicU64::new(0),
            stored: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            store_errors: AtomicU64::new(0),
        }
    }

    fn reset(&self, subscribed_addresses: usize) {
        for counter in [&self.received, &self.stored, &self.dropped, &self.store_errors] {
            counter.store(0, Ordering::Relaxed);
        }
        self.report.send_replace(SessionReport {
            connection: ConnectionState::Idle,
            subscribed_addresses,
            last_error: None,
        });
    }

    fn set_connection(&self, connection: ConnectionState) {
        self.report.send_modify(|report| report.connection = connection);
    }

    fn mark_finished(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn fail(&self, error: &FeedError) {
        self.report.send_modify(|report| {
            report.connection = ConnectionState::Errored;
            report.last_error = Some(error.to_string());
        });
    }
}

struct SessionContext {
    db_pool: SqlitePool,
    cache: AddressCache,
    feed: Arc<dyn FeedClient>,
    shared: Arc<SessionShared>,
}

/// Owns the monitoring session: at most one feed connection at a time,
/// started and stopped on request.
///
/// Session changes happen under one async mutex, and `stop` waits for the
/// background task to finish before releasing it, so a `start` issued right
/// after a `stop` can never overlap the old connection.
pub struct IngestionController {
    db_pool: SqlitePool,
    cache: AddressCache,
    feed: Arc<dyn FeedClient>,
    session: Mutex<Option<Session>>,
    shared: Arc<SessionShared>,
}

impl IngestionController {
    pub fn new(db_pool: SqlitePool, cache: AddressCache, feed: Arc<dyn FeedClient>) -> Self {
        Self {
            db_pool,
            cache,
            feed,
            session: Mutex::new(None),
            shared: Arc::new(SessionShared::new()),
        }
    }

    pub async fn start(&self) -> Result<StartOutcome, sqlx::Error> {
        let mut session = self.session.lock().await;
        self.start_locked(&mut session).await
    }

    pub async fn stop(&self) -> StopOutcome {
        let mut session = self.session.lock().await;
        Self::stop_locked(&mut session).await
    }

    /// Stops a live session, otherwise starts one.
    pub async fn toggle(&self) -> Result<ToggleOutcome, sqlx::Error> {
        let mut session = self.session.lock().await;

        if session.as_ref().is_some_and(Session::is_live) {
            Self::stop_locked(&mut session).await;
            return Ok(ToggleOutcome::Stopped);
        }

        Ok(match self.start_locked(&mut session).await? {
            StartOutcome::NoAddresses => ToggleOutcome::NoAddresses,
            StartOutcome::Started | StartOutcome::AlreadyRunning => ToggleOutcome::Started,
        })
    }

    /// A session whose feed failed or closed is no longer running. Does not
    /// wait on a start or stop in progress.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub async fn status(&self) -> MonitorStatus {
        let running = self.is_running();
        let report = self.shared.report.borrow().clone();

        MonitorStatus {
            running,
            provider: self.feed.provider(),
            connection: report.connection,
            subscribed_addresses: report.subscribed_addresses,
            received: self.shared.received.load(Ordering::Relaxed),
            stored: self.shared.stored.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
            store_errors: self.shared.store_errors.load(Ordering::Relaxed),
            last_error: report.last_error,
        }
    }

    /// Follows connection state changes of the current session.
    pub fn watch_report(&self) -> watch::Receiver<SessionReport> {
        self.shared.report.subscribe()
    }

    pub async fn shutdown(&self) {
        if Self::stop_locked(&mut *self.session.lock().await).await == StopOutcome::Stopped {
            info!("Monitoring stopped for shutdown");
        }
    }

    async fn start_locked(&self, session: &mut Option<Session>) -> Result<StartOutcome, sqlx::Error> {
        if session.as_ref().is_some_and(Session::is_live) {
            debug!("Monitoring already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        // Reap a session that ended on its own (feed error or remote close)
        if let Some(finished) = session.take() {
            join_session(finished).await;
        }

        let addresses = address::get_all_tracked_addresses(&self.db_pool).await?;
        if addresses.is_empty() {
            info!("No addresses to monitor");
            return Ok(StartOutcome::NoAddresses);
        }

        self.shared.reset(addresses.len());

        let shutdown = CancellationToken::new();
        let context = SessionContext {
            db_pool: self.db_pool.clone(),
            cache: self.cache.clone(),
            feed: self.feed.clone(),
            shared: self.shared.clone(),
        };
        self.shared.running.store(true, Ordering::Release);
        let handle = tokio::spawn(run_session(context, addresses, shutdown.clone()));

        *session = Some(Session { shutdown, handle });
        info!("Monitoring started with {} feed", self.feed.provider());
        Ok(StartOutcome::Started)
    }

    async fn stop_locked(session: &mut Option<Session>) -> StopOutcome {
        let Some(current) = session.take() else {
            return StopOutcome::NotRunning;
        };

        let was_live = current.is_live();
        current.shutdown.cancel();
        join_session(current).await;

        if was_live {
            info!("Monitoring stopped");
            StopOutcome::Stopped
        } else {
            StopOutcome::NotRunning
        }
    }
}

impl Drop for IngestionController {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().as_ref() {
            session.shutdown.cancel();
        }
    }
}

/// Clears the running flag however the session task exits.
struct FinishGuard(Arc<SessionShared>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.mark_finished();
    }
}

async fn join_session(session: Session) {
    if let Err(e) = session.handle.await {
        error!("Ingestion task ended abnormally: {}", e);
    }
}

/// Background unit: subscribe, then move transactions from the feed into the
/// store until cancelled, closed by the provider, or the feed fails.
async fn run_session(context: SessionContext, addresses: Vec<String>, shutdown: CancellationToken) {
    let SessionContext { db_pool, cache, feed, shared } = context;
    let _finished = FinishGuard(shared.clone());

    shared.set_connection(ConnectionState::Connecting);
    let subscription = tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            shared.set_connection(ConnectionState::Closed);
            return;
        }
        result = feed.subscribe(&addresses) => result,
    };

    let mut stream = match subscription {
        Ok(stream) => stream,
        Err(FeedError::NoAddresses) => {
            info!("No addresses to monitor");
            shared.set_connection(ConnectionState::Closed);
            return;
        }
        Err(e) => {
            error!("Failed to subscribe to {} feed: {}", feed.provider(), e);
            shared.fail(&e);
            return;
        }
    };

    shared.set_connection(ConnectionState::Subscribed);
    info!("Listening for transactions on {} addresses", addresses.len());

    loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                shared.set_connection(ConnectionState::Closed);
                break;
            }
            next = stream.next() => next,
        };

        let tx = match next {
            Some(Ok(tx)) => tx,
            Some(Err(e)) => {
                error!("Error in feed stream, ending session: {}", e);
                shared.fail(&e);
                break;
            }
            None => {
                warn!("Feed stream ended");
                shared.set_connection(ConnectionState::Closed);
                break;
            }
        };

        if shared.received.fetch_add(1, Ordering::Relaxed) == 0 {
            shared.set_connection(ConnectionState::Streaming);
        }

        match processor::ingest_transaction(&db_pool, &cache, &tx).await {
            Ok(IngestOutcome::Stored(record)) => {
                shared.stored.fetch_add(1, Ordering::Relaxed);
                info!("Recorded transaction {} (#{})", record.hash, record.id);
            }
            Ok(IngestOutcome::Dropped) => {
                shared.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                // The store failing for one message does not end the session
                shared.store_errors.fetch_add(1, Ordering::Relaxed);
                error!("Failed to store transaction {}: {}", tx.hash, e);
            }
        }
    }

    // Dropping the stream closes the connection
    drop(stream);
    debug!("Ingestion session finished");
}
