//! Error types for task store operations.
//!
//! The priority engine itself cannot fail; everything here comes from the
//! store boundary (lookup, input validation, wire-string parsing).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Missing, soft-deleted, or owned by someone else.
    #[error("task not found: {id}")]
    NotFound { id: String },

    #[error("invalid value for '{field}': {message}")]
    Validation { field: &'static str, message: String },

    #[error("unknown {kind}: '{value}'")]
    InvalidValue { kind: &'static str, value: String },

    /// Lifecycle transition out of a terminal status.
    #[error("task {id} is {status}; cannot {action}")]
    Terminal {
        id: String,
        status: String,
        action: &'static str,
    },
}

impl StoreError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
