//! Unified error handling with Sentry integration.
//!
//! Every failure leaves the service as the JSON envelope
//! `{"success": false, "error": <message>, "code": <code>}`. Server errors are
//! captured to Sentry and logged in full before an opaque message is sent to
//! the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::ReviewError;

/// Application-level error type for the reviews service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Review operation failed.
    #[error(transparent)]
    Review(#[from] ReviewError),

    /// No route matches the request.
    #[error("{0}")]
    NotFound(String),

    /// Request body could not be read or decoded.
    #[error("{0}")]
    BadRequest(String),
}

/// Error body sent to clients.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    code: &'a str,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Review(err) => match err {
                ReviewError::InvalidIdentifier | ReviewError::InvalidInput(_) => {
                    StatusCode::BAD_REQUEST
                }
                ReviewError::Unauthenticated => StatusCode::UNAUTHORIZED,
                ReviewError::Forbidden(_) => StatusCode::FORBIDDEN,
                ReviewError::NotFound => StatusCode::NOT_FOUND,
                ReviewError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Review(err) => match err {
                ReviewError::InvalidIdentifier => "invalid_identifier",
                ReviewError::Unauthenticated => "unauthenticated",
                ReviewError::Forbidden(_) => "forbidden",
                ReviewError::NotFound => "not_found",
                ReviewError::InvalidInput(_) => "invalid_input",
                ReviewError::Repository(_) => "internal_error",
            },
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "invalid_input",
        }
    }

    /// Whether this is a server-side fault rather than a client mistake.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if self.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            success: false,
            error: &message,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this once the caller is known to associate errors with them.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
