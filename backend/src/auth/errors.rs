//! Custom error types specific to authentication failures.
//!
//! [`AuthError`] covers login and registration outcomes and renders as a JSON
//! body with a user-visible message. [`Denial`] covers the request gate and
//! always renders as a redirect to the login page carrying a reason code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use finsight_store::StoreError;
use serde_json::json;

/// Login and registration failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Bad or missing input. The message is shown to the user as is.
    #[error("{0}")]
    Validation(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username or email already exists")]
    Conflict,

    /// Storage or hashing failure. Details are logged, not shown.
    #[error("system error: {0}")]
    System(String),
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::System(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict,
            other => Self::System(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            Self::System(ref detail) => {
                tracing::error!(error = %detail, "Authentication system error");
                "The request failed due to a system error. Please try again.".to_string()
            }
            ref other => other.to_string(),
        };
        let body = json!({ "success": false, "message": message });
        (self.status(), Json(body)).into_response()
    }
}

/// Reason a request was turned away by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    /// No live session.
    #[error("not authenticated")]
    Unauthorized,

    /// The session was idle past the timeout.
    #[error("session timed out")]
    Timeout,

    /// Authenticated but not allowed.
    #[error("access denied")]
    AccessDenied,
}

impl Denial {
    /// Code carried in the `error` query parameter of the login redirect.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Timeout => "timeout",
            Self::AccessDenied => "access_denied",
        }
    }

    pub fn redirect_target(self) -> String {
        format!("/auth/login?error={}", self.reason())
    }
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        Redirect::to(&self.redirect_target()).into_response()
    }
}
