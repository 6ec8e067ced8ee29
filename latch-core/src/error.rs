//! Core error types.

use thiserror::Error;

/// Errors from the core data model and expression evaluator.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid object definition: {reason}")]
    InvalidDefinition { reason: String },

    #[error("invalid cardinality: '{value}'")]
    InvalidCardinality { value: String },

    #[error("expression compile error: {reason}")]
    CompileError { reason: String },

    #[error("expression type error: {reason}")]
    TypeError { reason: String },

    #[error("expression eval error: {reason}")]
    EvalError { reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Returns an error code suitable for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::InvalidDefinition { .. } => "INVALID_DEFINITION",
            CoreError::InvalidCardinality { .. } => "INVALID_CARDINALITY",
            CoreError::CompileError { .. } => "EXPR_COMPILE_ERROR",
            CoreError::TypeError { .. } => "EXPR_TYPE_ERROR",
            CoreError::EvalError { .. } => "EXPR_EVAL_ERROR",
            CoreError::Json(_) => "BAD_REQUEST",
        }
    }
}
