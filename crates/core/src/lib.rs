//! Shared primitives for all Rust crates in Tollgate.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across Tollgate crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not allowed to access an operational surface.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Shared counter or monitoring store timed out or refused the operation.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A policy function failed. Indicates a configuration defect.
    #[error("policy configuration error: {0}")]
    PolicyConfiguration(String),

    /// A persisted record could not be decoded.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns true when the error comes from backing store infrastructure.
    #[must_use]
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn only_store_unavailable_counts_as_store_failure() {
        assert!(AppError::StoreUnavailable("timeout".to_owned()).is_store_failure());
        assert!(!AppError::PolicyConfiguration("bad limit".to_owned()).is_store_failure());
    }
}
