//! Store error types.

use thiserror::Error;

/// Errors from the record store and rule catalog.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store query failed during {operation}: {reason}")]
    QueryFailed { operation: String, reason: String },

    #[error("version conflict on instance '{instance_id}': expected {expected}, actual {actual}")]
    VersionConflict {
        instance_id: String,
        expected: u64,
        actual: u64,
    },
}

impl StoreError {
    pub fn query(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::QueryFailed {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Returns an error code suitable for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::QueryFailed { .. } => "STORE_QUERY_FAILED",
            StoreError::VersionConflict { .. } => "CONFLICT",
        }
    }
}
