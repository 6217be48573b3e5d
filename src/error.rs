//! Error taxonomy shared by every store backend and the service layer.

use std::fmt;

use thiserror::Error;

use crate::validator::{ValidationErrors, Validator};

/// Error type for schedule store operations.
///
/// `ValidationFailed`, `NotFound` and `EditConflict` are expected outcomes the
/// caller can act on; `Internal` is an unexpected fault.
#[derive(Debug, Error)]
pub enum StoreError {
    /// One or more fields failed validation. Returned to the caller verbatim.
    #[error("failed validation: {0}")]
    ValidationFailed(ValidationErrors),
    /// No row matches the identifier.
    #[error("the requested resource could not be found")]
    NotFound,
    /// A conditional update matched zero rows: the conflict token is stale or
    /// the record is gone. Re-fetch, re-apply and retry.
    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,
    /// The call exceeded its deadline and was aborted.
    #[error("store call exceeded its deadline")]
    Timeout,
    /// The caller cancelled the call before it completed.
    #[error("store call was cancelled")]
    Cancelled,
    /// Connectivity, constraint, or serialization failure.
    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn internal(err: impl fmt::Display) -> Self {
        StoreError::Internal(err.to_string())
    }

    /// A validation failure on a single field.
    pub fn invalid_field(field: &str, message: &str) -> Self {
        let mut v = Validator::new();
        v.add_error(field, message);
        StoreError::ValidationFailed(v.into_errors())
    }

    /// Whether re-running the read-modify-write cycle may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::EditConflict)
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::ValidationFailed(_) => 422,
            StoreError::NotFound => 404,
            StoreError::EditConflict => 409,
            StoreError::Timeout => 504,
            // client closed request
            StoreError::Cancelled => 499,
            StoreError::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Internal(format!("serialization error: {}", err))
    }
}
