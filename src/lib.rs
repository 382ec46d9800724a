pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod feed;
pub mod models;
pub mod service;
pub mod validation;
pub mod state;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience if desired
pub use db::connection;
pub use db::transaction;
pub use db::address;
pub use db::migration;
pub use models::{FeedTransaction, MonitoredAddress, TransactionRecord};
pub use validation::{validate_action, validate_eth_address, validate_address_action};
pub use api::error::ApiError;
pub use api::response::ApiResponse;
pub use api::route::{create_router, TrackQuery};
pub use feed::{FeedClient, IngestionController};
pub use service::MonitorService;
