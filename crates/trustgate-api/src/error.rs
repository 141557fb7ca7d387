//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps issuance and repository errors to HTTP status codes and returns JSON
//! bodies with an error code, message, and optional details. Internal and
//! upstream failure details never reach the client.
//!
//! Claim-validation failures surface as `400 BAD_DATA` whose message is the
//! stable error code (e.g. `aggregation.of.not.found`), so callers can match
//! on it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::issuance::IssuanceError;
use crate::repository::RepositoryError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error class (e.g., "BAD_DATA", "NOT_FOUND").
    pub code: String,
    /// Human-readable message; the stable domain code for `BAD_DATA` and
    /// `NOT_FOUND`.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Claim or participant data rejected (400). Carries the stable code.
    #[error("{0}")]
    BadData(String),

    /// Resource not found (404). Carries the stable code.
    #[error("{0}")]
    NotFound(String),

    /// Body or path could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A collaborator failed or is unreachable (502).
    #[error("upstream error: {0}")]
    UpstreamError(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadData(_) => (StatusCode::BAD_REQUEST, "BAD_DATA"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::UpstreamError(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::UpstreamError(_) => "An upstream service error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::UpstreamError(_) => tracing::error!(error = %self, "upstream service error"),
            _ => {}
        }

        let details = match &self {
            Self::BadData(c) | Self::NotFound(c) => Some(serde_json::json!({ "reason": c })),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<IssuanceError> for AppError {
    fn from(err: IssuanceError) -> Self {
        match err {
            IssuanceError::BadData(code) => Self::BadData(code),
            IssuanceError::NotFound(code) => Self::NotFound(code),
            IssuanceError::Upstream { .. } => Self::UpstreamError(err.to_string()),
            IssuanceError::Invariant(_) | IssuanceError::Storage(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<trustgate_core::ValidationError> for AppError {
    fn from(err: trustgate_core::ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}
