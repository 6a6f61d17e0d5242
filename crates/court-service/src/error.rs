//! Service error types

use court_domain::{CaseUpdateError, ValidationError};
use thiserror::Error;

/// Errors that can occur during case and vote operations
///
/// Every variant is a recoverable result for the caller; none is retried here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The caller's role does not permit the action
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A required field is missing or malformed
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The action is not allowed in the entity's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A uniqueness rule was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store error
    #[error("Store error: {0}")]
    Storage(String),

    /// Evidence file storage error
    #[error("Blob store error: {0}")]
    Blob(String),
}

/// Stable machine-readable failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`ServiceError::Forbidden`]
    Forbidden,
    /// See [`ServiceError::NotFound`]
    NotFound,
    /// See [`ServiceError::ValidationFailed`]
    ValidationFailed,
    /// See [`ServiceError::InvalidState`]
    InvalidState,
    /// See [`ServiceError::Conflict`]
    Conflict,
    /// Store or blob failure
    Internal,
}

impl ErrorKind {
    /// snake_case name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl ServiceError {
    /// Failure category
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            ServiceError::InvalidState(_) => ErrorKind::InvalidState,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Storage(_) | ServiceError::Blob(_) => ErrorKind::Internal,
        }
    }

    /// The human-readable message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            ServiceError::Forbidden(m)
            | ServiceError::NotFound(m)
            | ServiceError::ValidationFailed(m)
            | ServiceError::InvalidState(m)
            | ServiceError::Conflict(m)
            | ServiceError::Storage(m)
            | ServiceError::Blob(m) => m,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self {
        ServiceError::ValidationFailed(e.message().to_string())
    }
}

impl From<CaseUpdateError> for ServiceError {
    fn from(e: CaseUpdateError) -> Self {
        match e {
            CaseUpdateError::Invalid(invalid) => invalid.into(),
            CaseUpdateError::IllegalTransition { .. } => ServiceError::InvalidState(e.to_string()),
        }
    }
}
