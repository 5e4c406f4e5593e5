//! Error types for the attendance payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure an engine operation can surface. Callers distinguish
//! "transient, retry" from "not allowed" through [`EngineError::is_retryable`].

use thiserror::Error;
use uuid::Uuid;

use crate::models::{AttendanceStatus, PayrollField};

/// The main error type for the attendance payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use attendance_payroll::error::EngineError;
/// use attendance_payroll::models::AttendanceStatus;
///
/// let error = EngineError::InvalidTransition {
///     current: AttendanceStatus::NotStarted,
///     requested: AttendanceStatus::Approved,
/// };
/// assert_eq!(
///     error.to_string(),
///     "Invalid transition from NOT_STARTED to APPROVED"
/// );
/// assert!(!error.is_retryable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input was negative, malformed or missing a mandatory value.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field or parameter that failed validation.
        field: String,
        /// A description of the problem.
        message: String,
    },

    /// The record's data does not allow the requested operation.
    #[error("Record {record_id} in state {status} cannot proceed: {message}")]
    InvalidState {
        /// The record being operated on.
        record_id: Uuid,
        /// The record's current status.
        status: AttendanceStatus,
        /// What was missing or inconsistent.
        message: String,
    },

    /// The requested status change is not part of the state machine.
    #[error("Invalid transition from {current} to {requested}")]
    InvalidTransition {
        /// The status the record is in.
        current: AttendanceStatus,
        /// The status that was requested.
        requested: AttendanceStatus,
    },

    /// Payroll fields can only be edited on approved or half-day records.
    #[error("Field {field} of record {record_id} is not editable in state {status}")]
    NotEditable {
        /// The record being edited.
        record_id: Uuid,
        /// The record's current status.
        status: AttendanceStatus,
        /// The field the caller tried to edit.
        field: PayrollField,
    },

    /// A commit found no staged edits for the session, either because none
    /// were staged or because they expired.
    #[error("No staged edits for record {record_id} in session {session_id}")]
    NothingStaged {
        /// The record the commit targeted.
        record_id: Uuid,
        /// The reviewer session that committed.
        session_id: String,
    },

    /// The month owning the record or payroll is locked.
    #[error("Payroll period {year}-{month:02} of assignment {assignment_id} is locked")]
    RecordLocked {
        /// The assignment that owns the period.
        assignment_id: Uuid,
        /// The year of the locked period.
        year: i32,
        /// The month of the locked period.
        month: u32,
    },

    /// A monthly payroll was already locked.
    #[error("Monthly payroll {payroll_id} is already locked")]
    AlreadyLocked {
        /// The locked payroll document.
        payroll_id: Uuid,
    },

    /// An entity was not found in the store.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "attendance record").
        entity: &'static str,
        /// The identifier or key that was looked up.
        id: String,
    },

    /// A concurrent writer changed the entity first.
    #[error("Version conflict on {entity} {id}: expected version {expected}, found {actual}")]
    VersionConflict {
        /// The kind of entity.
        entity: &'static str,
        /// The entity identifier.
        id: Uuid,
        /// The version the writer read.
        expected: u64,
        /// The version currently stored.
        actual: u64,
    },

    /// The backing store failed to persist or load data.
    #[error("Storage failure: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },

    /// The operation did not finish within the request timeout.
    #[error("Operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// A service call panicked or was cancelled.
    #[error("Internal failure: {message}")]
    Internal {
        /// A description of the failure.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl EngineError {
    /// Builds a [`EngineError::Validation`] error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Builds a [`EngineError::NotFound`] error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true when the failure is transient and the caller may retry.
    ///
    /// State machine and validation errors are caller logic errors and are
    /// never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::VersionConflict { .. }
                | EngineError::Storage { .. }
                | EngineError::Timeout { .. }
        )
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
