//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from nisdesk-guard, nisdesk-state, and nisdesk-core
//! to HTTP status codes with a JSON body of error code, message, and
//! details. Internal error messages are never returned to clients.
//!
//! Guard rejections keep their user-facing reason strings verbatim: the
//! hierarchy failure maps to 403 and the self/last-owner rules to 409.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use nisdesk_guard::GuardError;
use nisdesk_state::DirectoryError;

/// Structured JSON error response body.
///
/// All error responses use this format across the API surface.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "GUARD_REJECTED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Acting user missing or malformed (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Acting user lacks the required membership or role (403).
    ///
    /// Guard hierarchy rejections surface here with their reason string
    /// verbatim.
    #[error("{0}")]
    Forbidden(String),

    /// The mutation conflicts with current state (409). Guard self-action
    /// and last-owner rejections surface here with their reason string
    /// verbatim.
    #[error("{0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// Service dependency not available (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<nisdesk_core::ValidationError> for AppError {
    fn from(err: nisdesk_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Guard rejections carry their policy reason verbatim. The hierarchy
/// failure is an authorization problem (403); the self-action and
/// last-owner rules describe a state the mutation conflicts with (409).
impl From<GuardError> for AppError {
    fn from(err: GuardError) -> Self {
        match &err {
            GuardError::NotOwner => Self::Forbidden(err.to_string()),
            GuardError::SelfDemotion
            | GuardError::SelfDeactivation
            | GuardError::LastOwnerDemotion
            | GuardError::LastOwnerDeactivation => Self::Conflict(err.to_string()),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound => Self::NotFound("membership not found".to_string()),
            DirectoryError::ActorNotMember => {
                Self::Forbidden("You are not a member of this organisation.".to_string())
            }
            DirectoryError::Guard(guard) => guard.into(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("database error: {err}"))
    }
}
