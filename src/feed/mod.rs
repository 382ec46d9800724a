pub mod alchemy;
pub mod bloxroute;
pub mod client;
pub mod controller;
pub mod processor;
pub mod websocket;

// Re-exports for convenience
pub use client::{build_feed_client, FeedClient, FeedError, FeedProvider, TransactionStream};
pub use controller::{ConnectionState, IngestionController, MonitorStatus, StartOutcome, StopOutcome, ToggleOutcome};
