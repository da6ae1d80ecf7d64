use crate::services::object_store::StoreError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// HTTP-facing error. Carries the underlying failure, when there is one, so
/// the caller sees the provider's message and code.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<ErrorDetails>,
}

/// Diagnostics passed through to the client alongside the error summary.
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub details: String,
    pub code: Option<String>,
}

impl From<StoreError> for ErrorDetails {
    fn from(err: StoreError) -> Self {
        Self {
            details: err.message,
            code: err.code,
        }
    }
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            details: None,
        }
    }

    /// Shortcut for a 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Attach the failure that caused this error.
    pub fn with_details(mut self, details: impl Into<ErrorDetails>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.message, details.details),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self.details {
            Some(details) => json!({
                "error": self.message,
                "details": details.details,
                "code": details.code,
            }),
            None => json!({ "error": self.message }),
        };

        (self.status, Json(body)).into_response()
    }
}
