use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::auth::token::{TokenCodec, TokenError};
use crate::certinfo::CertInfoError;
use crate::config::AuthConfig;
use crate::inventory::repository::InventoryRepository;
use crate::user::repository::UserRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub auth_config: Arc<AuthConfig>,
    pub token_codec: Arc<TokenCodec>,
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub inventory_repository: Arc<dyn InventoryRepository + Send + Sync>,
}

impl AppState {
    pub fn new(
        auth_config: AuthConfig,
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        inventory_repository: Arc<dyn InventoryRepository + Send + Sync>,
    ) -> Self {
        let token_codec = Arc::new(TokenCodec::new(&auth_config));
        Self {
            auth_config: Arc::new(auth_config),
            token_codec,
            user_repository,
            inventory_repository,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token type")]
    InvalidTokenType,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Certificate error: {0}")]
    Certificate(#[from] CertInfoError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::WrongKind { .. } => AppError::InvalidTokenType,
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::DatabaseError(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AppError::InvalidTokenType => {
                (StatusCode::UNAUTHORIZED, "Invalid token type".to_string())
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Certificate(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::JwtError(msg) => {
                error!(error = %msg, "Token encoding failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::DatabaseError(msg) => {
                error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
