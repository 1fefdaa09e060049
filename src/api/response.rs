//! Response types for the HR engine API.
//!
//! This module defines the error response structures and the mapping from
//! engine errors to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response for a body or query that could not be decoded.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, code) = match &error {
            EngineError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            EngineError::InvalidStatus { .. } => (StatusCode::BAD_REQUEST, "INVALID_STATUS"),
            EngineError::InvalidDateRange { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_DATE_RANGE")
            }
            EngineError::StartDateInPast { .. } => {
                (StatusCode::BAD_REQUEST, "START_DATE_IN_PAST")
            }
            EngineError::InsufficientBalance { .. } => {
                (StatusCode::BAD_REQUEST, "INSUFFICIENT_BALANCE")
            }
            EngineError::ForeignKeyViolation { .. } => {
                (StatusCode::BAD_REQUEST, "FOREIGN_KEY_VIOLATION")
            }
            EngineError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            EngineError::VacationOverlap { .. } => (StatusCode::CONFLICT, "VACATION_OVERLAP"),
            EngineError::BlockedPeriod { .. } => (StatusCode::CONFLICT, "BLOCKED_PERIOD"),
            EngineError::Duplicate { .. } => (StatusCode::CONFLICT, "DUPLICATE"),
            EngineError::AccessDenied { .. } => (StatusCode::FORBIDDEN, "ACCESS_DENIED"),
            EngineError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            EngineError::StructureNotFound { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STRUCTURE_NOT_FOUND",
            ),
            EngineError::Store { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR")
            }
        };

        ApiErrorResponse {
            status,
            error: ApiError::new(code, message),
        }
    }
}
