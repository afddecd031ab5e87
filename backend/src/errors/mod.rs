//! Global application error types and handlers.
//!
//! [`AppError`] is returned by the transaction and report handlers and maps
//! every failure onto a status code and a JSON body. Store failures are
//! logged and rendered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use finsight_store::StoreError;
use serde_json::json;

pub const NOT_FOUND_MESSAGE: &str = "The requested page does not exist.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad form or query input.
    #[error("{0}")]
    Validation(String),

    /// Missing route or a record the user does not own.
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound(NOT_FOUND_MESSAGE.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Store(err) => {
                tracing::error!(error = %err, "Store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The request failed due to a system error. Please try again.".to_string(),
                )
            }
        };
        (status, Json(json!({ "success": false, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::validation("bad").into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::not_found().into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(StoreError::Conflict).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
