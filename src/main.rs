// Initialize configuration
// Set up logging
// Create database connection pool
// Build the configured feed client and the ingestion controller
// Start HTTP server

use wallet_watch_service::{api, cache, config, db, feed, service, state};

use config::Config;
use service::MonitorService;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting wallet-watch-service");

    // Load configuration
    let config = Config::from_env();
    tracing::info!(
        "Configuration loaded: database {}, feed {}",
        config.database_url,
        config.feed_provider
    );

    // Setup database connection
    let db_pool = db::connection::establish_connection(&config.database_url).await?;

    // Feed settings are checked here so a bad .env fails at boot
    let feed_client = feed::build_feed_client(&config)?;

    let address_cache = cache::init_cache(&config);
    let controller = Arc::new(feed::IngestionController::new(
        db_pool.clone(),
        address_cache.clone(),
        feed_client,
    ));
    let service = MonitorService::new(db_pool.clone(), address_cache, controller.clone());

    if config.monitor_autostart {
        let outcome = service.start_monitoring().await?;
        tracing::info!("Autostart: {:?}", outcome);
    }

    let addr = config.bind_address();
    let app_state = Arc::new(AppState { config, service });

    // Start HTTP server
    let app = api::create_router(app_state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    controller.shutdown().await;
    db_pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
