//! HTTP error responses.
//!
//! Every failure leaves the service as a JSON body of the form
//! `{"error": "..."}`. Internal failures are logged and reported as a
//! generic `Server error` so no detail leaks to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use poster_renderer::RenderError;
use serde_json::json;
use thiserror::Error;

use crate::storage::StorageError;
use crate::validation::ValidationError;

/// Message returned for every internal failure.
pub const SERVER_ERROR: &str = "Server error";

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request was malformed or missing a required field.
    #[error("{0}")]
    BadRequest(String),

    /// The endpoint does not accept this method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Anything else. The message is logged but never sent.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for a 400 with the given message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(message) => message,
            Self::MethodNotAllowed => "Method not allowed".to_string(),
            Self::Internal(detail) => {
                tracing::error!("Request failed: {detail}");
                SERVER_ERROR.to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::InvalidRequest(message) | RenderError::Resource(message) => {
                Self::BadRequest(message)
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ApiError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            ApiError::Internal("disk full".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn render_errors_map_to_client_or_server() {
        let bad: ApiError = RenderError::InvalidRequest("zero size".into()).into();
        assert!(matches!(bad, ApiError::BadRequest(m) if m == "zero size"));
        let internal: ApiError = RenderError::Export("png".into()).into();
        assert!(matches!(internal, ApiError::Internal(_)));
    }
}
