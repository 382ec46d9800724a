use crate::{
    api::{
        error::ApiError,
        response::{with_status, with_total_count, ApiResponse},
    },
    feed::{MonitorStatus, StartOutcome, StopOutcome, ToggleOutcome},
    state::AppState,
    validation::validate_address_action,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

// POST /track endpoint query parameters
#[derive(Deserialize)]
pub struct TrackQuery {
    #[serde(default)]
    address: String,
    #[serde(default)]
    action: String,
}

#[derive(Serialize)]
struct MonitoringResponse<T> {
    outcome: T,
    status: MonitorStatus,
}

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/track", post(track_address))
        .route("/wallets", get(list_wallets))
        .route("/transactions", get(list_transactions))
        .route("/monitoring", get(monitoring_status))
        .route("/monitoring/toggle", post(toggle_monitoring))
        .route("/monitoring/start", post(start_monitoring))
        .route("/monitoring/stop", post(stop_monitoring))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

// POST /track handler
async fn track_address(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TrackQuery>,
) -> Result<Response, ApiError> {
    info!("Processing track request for address: {}, action: {}", params.address, params.action);

    let action = params.action.to_lowercase();
    validate_address_action(&params.address, &action)?;

    match action.as_str() {
        "add" => {
            let wallet = state.service.add_wallet(&params.address).await?;
            Ok(with_status(StatusCode::CREATED, wallet))
        }
        _ => {
            let removed = state.service.remove_wallet(&params.address).await?;
            Ok(with_status(StatusCode::OK, serde_json::json!({ "removed": removed })))
        }
    }
}

// GET /wallets handler
async fn list_wallets(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let wallets = state.service.list_wallets().await?;
    let total = wallets.len() as i64;
    Ok(with_total_count(wallets, total))
}

// GET /transactions handler
async fn list_transactions(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let transactions = state.service.list_transactions().await?;
    let total = transactions.len() as i64;
    Ok(with_total_count(transactions, total))
}

// GET /monitoring handler
async fn monitoring_status(State(state): State<Arc<AppState>>) -> ApiResponse<MonitorStatus> {
    ApiResponse::new(state.service.monitoring_status().await)
}

async fn toggle_monitoring(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<MonitoringResponse<ToggleOutcome>>, ApiError> {
    let outcome = state.service.toggle_monitoring().await?;
    info!("Monitoring toggled: {:?}", outcome);
    Ok(monitoring_response(&state, outcome).await)
}

async fn start_monitoring(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<MonitoringResponse<StartOutcome>>, ApiError> {
    let outcome = state.service.start_monitoring().await?;
    Ok(monitoring_response(&state, outcome).await)
}

async fn stop_monitoring(
    State(state): State<Arc<AppState>>,
) -> ApiResponse<MonitoringResponse<StopOutcome>> {
    let outcome = state.service.stop_monitoring().await;
    monitoring_response(&state, outcome).await
}

async fn monitoring_response<T: Serialize>(state: &AppState, outcome: T) -> ApiResponse<MonitoringResponse<T>> {
    ApiResponse::new(MonitoringResponse {
        outcome,
        status: state.service.monitoring_status().await,
    })
}
