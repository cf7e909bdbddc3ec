use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::models::InvalidLevel;
use crate::storage::StoreError;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("The progress document was modified concurrently, please retry")]
    Conflict,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Storage error: {0}")]
    Storage(StoreError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => AppError::Conflict,
            other => AppError::Storage(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<InvalidLevel> for AppError {
    fn from(err: InvalidLevel) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Auth(err) => err.status_code(),
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = match self {
            AppError::Auth(err) => return err.into_response(),
            other => other,
        };

        let (status, error_message) = match &err {
            AppError::Auth(_) => (err.status_code(), "Authentication error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            AppError::Conflict => (StatusCode::CONFLICT, "Conflict"),
            AppError::Storage(err) => {
                tracing::error!(error = %err, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error")
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
            "message": message,
        }));

        (status, body).into_response()
    }
}
