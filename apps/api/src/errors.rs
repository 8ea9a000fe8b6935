use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::sync::SyncError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Save failed: {0}")]
    Save(#[from] SyncError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "A valid owner identity is required".to_string(),
            ),
            AppError::Save(SyncError::NoOwner) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Sign in to save your resume".to_string(),
            ),
            AppError::Save(e) => {
                tracing::warn!("Explicit save failed: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SAVE_FAILED",
                    format!("Your resume could not be saved: {e}"),
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
