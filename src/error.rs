use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::crm::{SeedError, StoreError, ValidationError};
use crate::i18n::{DictionaryError, UnsupportedLocale};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error("Seeding failed: {0}")]
    Seed(#[from] SeedError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Locale(#[from] UnsupportedLocale),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "Resource not found"),
            AppError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred",
            ),
            // Configuration and load failures are not the user's to fix
            AppError::Dictionary(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred",
            ),
            AppError::Seed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred",
            ),
            AppError::Auth(AuthError::DomainRejected { .. }) => {
                (StatusCode::FORBIDDEN, "Access denied")
            }
            AppError::Auth(AuthError::Provider(_)) => {
                (StatusCode::BAD_GATEWAY, "Identity provider failure")
            }
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, "Authentication failed"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation error"),
            AppError::Locale(_) => (StatusCode::BAD_REQUEST, "Unsupported locale"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Resource not found"),
        };

        if status.is_server_error() {
            error!("{}", self);
        }

        // Internal details stay in the log
        let details = if status.is_server_error() {
            error_message.to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "details": details,
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
