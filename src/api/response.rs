//! Response types for the attendance payroll API.
//!
//! This module defines the error response structure and the mapping from
//! engine errors to HTTP statuses.

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
    /// Whether the caller may retry the same request.
    #[serde(default)]
    pub retryable: bool,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(code, message)
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    fn retryable(mut self) -> Self {
        self.retryable = true;
        self
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
    /// Pairs an error body with a status.
    pub fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
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
        match error {
            EngineError::Validation { field, .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::with_details("VALIDATION_ERROR", message, format!("field: {}", field)),
            ),
            EngineError::NotFound { entity, .. } => ApiErrorResponse::new(
                StatusCode::NOT_FOUND,
                ApiError::with_details("NOT_FOUND", message, format!("entity: {}", entity)),
            ),
            EngineError::InvalidTransition { current, requested } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::with_details(
                    "INVALID_TRANSITION",
                    message,
                    format!("current: {}, requested: {}", current, requested),
                ),
            ),
            EngineError::InvalidState { status, .. } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::with_details("INVALID_STATE", message, format!("status: {}", status)),
            ),
            EngineError::NotEditable { status, field, .. } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::with_details(
                    "NOT_EDITABLE",
                    message,
                    format!("status: {}, field: {}", status, field),
                ),
            ),
            EngineError::NothingStaged { .. } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::with_details(
                    "NOTHING_STAGED",
                    message,
                    "Staged edits may have expired; stage them again",
                ),
            ),
            EngineError::RecordLocked { .. } => ApiErrorResponse::new(
                StatusCode::LOCKED,
                ApiError::new("RECORD_LOCKED", message),
            ),
            EngineError::AlreadyLocked { .. } => ApiErrorResponse::new(
                StatusCode::CONFLICT,
                ApiError::new("ALREADY_LOCKED", message),
            ),
            EngineError::VersionConflict { .. } => ApiErrorResponse::new(
                StatusCode::CONFLICT,
                ApiError::with_details(
                    "VERSION_CONFLICT",
                    message,
                    "Reload the entity and retry; staged edits are kept",
                )
                .retryable(),
            ),
            EngineError::Storage { .. } => ApiErrorResponse::new(
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("STORAGE_ERROR", message).retryable(),
            ),
            EngineError::Timeout { .. } => ApiErrorResponse::new(
                StatusCode::GATEWAY_TIMEOUT,
                ApiError::new("TIMEOUT", message).retryable(),
            ),
            EngineError::Internal { .. } => ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", message),
            ),
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ApiErrorResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, PayrollField};
    use uuid::Uuid;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(json.contains("\"retryable\":false"));
        assert!(!json.contains("details")); // Should be skipped when None
    }

    #[test]
    fn test_api_error_with_details_serialization() {
        let error = ApiError::with_details("TEST_ERROR", "Test message", "Some details");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"details\":\"Some details\""));
    }

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(EngineError, StatusCode, &str, bool)> = vec![
            (
                EngineError::validation("remark", "required"),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                false,
            ),
            (
                EngineError::not_found("attendance record", Uuid::nil()),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                false,
            ),
            (
                EngineError::InvalidTransition {
                    current: AttendanceStatus::Approved,
                    requested: AttendanceStatus::CheckedIn,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_TRANSITION",
                false,
            ),
            (
                EngineError::NotEditable {
                    record_id: Uuid::nil(),
                    status: AttendanceStatus::Rejected,
                    field: PayrollField::Bata,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
                "NOT_EDITABLE",
                false,
            ),
            (
                EngineError::RecordLocked {
                    assignment_id: Uuid::nil(),
                    year: 2026,
                    month: 3,
                },
                StatusCode::LOCKED,
                "RECORD_LOCKED",
                false,
            ),
            (
                EngineError::AlreadyLocked {
                    payroll_id: Uuid::nil(),
                },
                StatusCode::CONFLICT,
                "ALREADY_LOCKED",
                false,
            ),
            (
                EngineError::VersionConflict {
                    entity: "attendance record",
                    id: Uuid::nil(),
                    expected: 1,
                    actual: 2,
                },
                StatusCode::CONFLICT,
                "VERSION_CONFLICT",
                true,
            ),
            (
                EngineError::Storage {
                    message: "down".to_string(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
                "STORAGE_ERROR",
                true,
            ),
            (
                EngineError::Timeout {
                    operation: "commit".to_string(),
                    timeout_ms: 5000,
                },
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
                true,
            ),
            (
                EngineError::NothingStaged {
                    record_id: Uuid::nil(),
                    session_id: "s1".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
                "NOTHING_STAGED",
                false,
            ),
            (
                EngineError::Internal {
                    message: "task panicked".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                false,
            ),
        ];

        for (error, status, code, retryable) in cases {
            let response: ApiErrorResponse = error.into();
            assert_eq!(response.status, status, "{}", code);
            assert_eq!(response.error.code, code);
            assert_eq!(response.error.retryable, retryable, "{}", code);
        }
    }
}
