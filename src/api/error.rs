use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use crate::service::ServiceError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Database(e) => {
                error!("Database error while serving request: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred".to_string())
            }
            ApiError::InvalidAddress(_) => (
                StatusCode::BAD_REQUEST,
                "Please enter a valid Ethereum wallet address".to_string(),
            ),
            ApiError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidEthereumAddress(address) => ApiError::InvalidAddress(address),
            ValidationError::InvalidAction(action) =>
                ApiError::InvalidParameter(format!("Invalid action: {}. Must be 'add' or 'remove'", action)),
            ValidationError::MissingParameter(param) =>
                ApiError::BadRequest(format!("Missing parameter: {}", param)),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => e.into(),
            ServiceError::Store(e) => ApiError::Database(e),
        }
    }
}
