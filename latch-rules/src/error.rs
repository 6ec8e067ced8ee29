//! Rule engine error types.

use latch_core::CoreError;
use latch_store::StoreError;
use thiserror::Error;

/// Errors from the rule registry and executors.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule executed and the data failed it.
    #[error("{message}")]
    Failed { message: String },

    /// Aggregated failures from a composite rule or a rule list.
    #[error("{} validation failure(s): {}", failures.len(), failures.join("; "))]
    Aggregate { failures: Vec<String> },

    #[error("field '{field}' not found in data")]
    FieldNotFound { field: String },

    #[error("field '{field}' has wrong type: expected {expected}")]
    TypeMismatch { field: String, expected: String },

    #[error("invalid rule config: {reason}")]
    InvalidConfig { reason: String },

    #[error("no executor registered for rule type '{rule_type}'")]
    UnknownRuleType { rule_type: String },

    #[error("validation rule '{reference}' not found")]
    RuleNotFound { reference: String },

    #[error("rule execution timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("external call failed: {reason}")]
    ExternalCallFailed { reason: String },

    #[error("composite rule nesting exceeded depth {depth}")]
    RecursionLimit { depth: usize },

    #[error(transparent)]
    Expr(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RuleError {
    /// Returns an error code suitable for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            RuleError::Failed { .. } => "VALIDATION_FAILED",
            RuleError::Aggregate { .. } => "VALIDATION_FAILED",
            RuleError::FieldNotFound { .. } => "FIELD_NOT_FOUND",
            RuleError::TypeMismatch { .. } => "TYPE_MISMATCH",
            RuleError::InvalidConfig { .. } => "INVALID_RULE_CONFIG",
            RuleError::UnknownRuleType { .. } => "UNKNOWN_RULE_TYPE",
            RuleError::RuleNotFound { .. } => "RULE_NOT_FOUND",
            RuleError::Timeout { .. } => "TIMEOUT",
            RuleError::ExternalCallFailed { .. } => "EXTERNAL_CALL_FAILED",
            RuleError::RecursionLimit { .. } => "RECURSION_LIMIT",
            RuleError::Expr(e) => e.error_code(),
            RuleError::Store(e) => e.error_code(),
        }
    }

    /// Returns true if this is a data failure rather than an
    /// infrastructure or configuration problem.
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            RuleError::Failed { .. }
                | RuleError::Aggregate { .. }
                | RuleError::FieldNotFound { .. }
                | RuleError::TypeMismatch { .. }
        )
    }
}
