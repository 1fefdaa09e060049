//! Error types for the HR engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every error condition the compensation, leave and access components
//! can report. Callers branch on the variant, never on the rendered message.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the HR engine.
///
/// All engine operations return this error type. The variant identifies the
/// kind of failure; the fields carry the data needed to explain it.
///
/// # Example
///
/// ```
/// use hr_engine::error::EngineError;
///
/// let error = EngineError::NotFound {
///     entity: "salary".to_string(),
///     id: 42,
/// };
/// assert_eq!(error.to_string(), "salary 42 not found");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The kind of record (e.g. "salary", "vacation").
        entity: String,
        /// The identifier that was looked up.
        id: u64,
    },

    /// The record is not in a status that permits the requested transition.
    #[error("cannot {operation} {entity} {id} in status '{status}'")]
    InvalidStatus {
        /// The kind of record.
        entity: String,
        /// The record identifier.
        id: u64,
        /// The status the record was found in.
        status: String,
        /// The operation that was attempted.
        operation: String,
    },

    /// A uniqueness invariant would be violated.
    #[error("duplicate {entity}: {message}")]
    Duplicate {
        /// The kind of record.
        entity: String,
        /// What collided.
        message: String,
    },

    /// A reference points at a record that does not exist.
    #[error("invalid reference '{field}': {id} does not exist")]
    ForeignKeyViolation {
        /// The referencing field.
        field: String,
        /// The dangling identifier.
        id: u64,
    },

    /// No salary structure is active for the employee on the given date.
    #[error("no salary structure active for employee {employee_id} on {date}")]
    StructureNotFound {
        /// The employee whose structure was looked up.
        employee_id: u64,
        /// The calculation date.
        date: NaiveDate,
    },

    /// A vacation would start before today.
    #[error("start date {start_date} is before today ({today})")]
    StartDateInPast {
        /// The requested start date.
        start_date: NaiveDate,
        /// The date considered "today".
        today: NaiveDate,
    },

    /// The end date precedes the start date.
    #[error("end date {end_date} is before start date {start_date}")]
    InvalidDateRange {
        /// The requested start date.
        start_date: NaiveDate,
        /// The requested end date.
        end_date: NaiveDate,
    },

    /// The employee does not have enough remaining leave days.
    #[error(
        "insufficient balance for employee {employee_id} in {year}: requested {requested}, remaining {remaining}"
    )]
    InsufficientBalance {
        /// The employee requesting leave.
        employee_id: u64,
        /// The balance year that ran short.
        year: i32,
        /// Days requested in that year.
        requested: i32,
        /// Days remaining in that year.
        remaining: i32,
    },

    /// The requested range overlaps another live request of the same employee.
    #[error("vacation overlaps request {conflicting_id} of employee {employee_id}")]
    VacationOverlap {
        /// The employee requesting leave.
        employee_id: u64,
        /// The already existing request.
        conflicting_id: u64,
    },

    /// The requested range intersects a department blocked period.
    #[error("department {department_id} blocks vacations from {start_date} to {end_date}")]
    BlockedPeriod {
        /// The department owning the blocked period.
        department_id: u64,
        /// First blocked day.
        start_date: NaiveDate,
        /// Last blocked day.
        end_date: NaiveDate,
    },

    /// The caller is authenticated but may not perform the operation.
    #[error("access denied: {reason}")]
    AccessDenied {
        /// Why access was refused.
        reason: String,
    },

    /// The request carries no usable identity.
    #[error("authentication required")]
    Unauthenticated,

    /// Input was malformed before it reached the engine logic.
    #[error("invalid field '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The persistence or directory collaborator failed.
    #[error("store failure: {message}")]
    Store {
        /// Description of the infrastructure failure.
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
    pub(crate) fn not_found(entity: &str, id: u64) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id,
        }
    }

    pub(crate) fn invalid_status(
        entity: &str,
        id: u64,
        status: impl ToString,
        operation: &str,
    ) -> Self {
        EngineError::InvalidStatus {
            entity: entity.to_string(),
            id,
            status: status.to_string(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn access_denied(reason: impl Into<String>) -> Self {
        EngineError::AccessDenied {
            reason: reason.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
