use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::document::{DocumentError, UnsupportedFormat};
use crate::sheet::SheetError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown character: {0:?}")]
    UnknownCharacter(char),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormat),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SheetError> for AppError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::UnknownCharacter(c) => AppError::UnknownCharacter(c),
            SheetError::InvalidConfiguration(msg) => AppError::InvalidConfiguration(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnknownCharacter(c) => (
                StatusCode::BAD_REQUEST,
                "UNKNOWN_CHARACTER",
                format!("Unknown character: {c:?}"),
            ),
            AppError::InvalidConfiguration(msg) => (
                StatusCode::BAD_REQUEST,
                "INVALID_CONFIGURATION",
                msg.clone(),
            ),
            AppError::UnsupportedFormat(e) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT", e.to_string())
            }
            AppError::Document(e) => {
                tracing::error!("Document error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "RENDERER_ERROR",
                    "The PDF renderer failed to produce the document".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
