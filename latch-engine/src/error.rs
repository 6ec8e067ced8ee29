//! Engine error types.

use latch_core::CoreError;
use latch_rules::RuleError;
use latch_store::StoreError;
use thiserror::Error;

/// Errors from the relationship validator, state machine and data
/// validator.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("instance not found: {instance_id}")]
    InstanceNotFound { instance_id: String },

    #[error("object definition not found: {definition}")]
    DefinitionNotFound { definition: String },

    #[error("relationship not found: {relationship_id}")]
    RelationshipNotFound { relationship_id: String },

    #[error("self-referencing relationship not allowed on instance '{instance_id}'")]
    SelfReferenceNotAllowed { instance_id: String },

    #[error("relationship '{relationship_type}' from '{source_definition}' to '{target_definition}' is not declared")]
    RelationshipNotAllowed {
        relationship_type: String,
        source_definition: String,
        target_definition: String,
    },

    #[error("cardinality {cardinality} violated for '{relationship_type}': {reason}")]
    CardinalityViolation {
        relationship_type: String,
        cardinality: String,
        reason: String,
    },

    #[error("relationship '{relationship_type}' from '{source_instance_id}' to '{target_instance_id}' would create a cycle")]
    CycleDetected {
        relationship_type: String,
        source_instance_id: String,
        target_instance_id: String,
    },

    #[error("cycle traversal exceeded depth {depth}")]
    TraversalDepthExceeded { depth: usize },

    #[error("relationship '{relationship_id}' has {dependent_count} dependent relationship(s); retry with cascade=true")]
    CascadeRequired {
        relationship_id: String,
        dependent_count: usize,
    },

    #[error("state '{state}' is not declared on definition '{definition}'")]
    InvalidState { state: String, definition: String },

    #[error("no declared transition from '{from}' to '{to}'")]
    TransitionNotAllowed { from: String, to: String },

    #[error("transition guard from '{from}' to '{to}' evaluated false")]
    TransitionConditionNotMet { from: String, to: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl EngineError {
    /// Returns an error code suitable for API responses. The taxonomy is
    /// stable so the API layer can map kinds to status semantics.
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::InstanceNotFound { .. } => "INSTANCE_NOT_FOUND",
            EngineError::DefinitionNotFound { .. } => "DEFINITION_NOT_FOUND",
            EngineError::RelationshipNotFound { .. } => "NOT_FOUND",
            EngineError::SelfReferenceNotAllowed { .. } => "SELF_REFERENCE_NOT_ALLOWED",
            EngineError::RelationshipNotAllowed { .. } => "RELATIONSHIP_NOT_ALLOWED",
            EngineError::CardinalityViolation { .. } => "CARDINALITY_VIOLATION",
            EngineError::CycleDetected { .. } => "CYCLE_DETECTED",
            EngineError::TraversalDepthExceeded { .. } => "TRAVERSAL_DEPTH_EXCEEDED",
            EngineError::CascadeRequired { .. } => "CARDINALITY_VIOLATION",
            EngineError::InvalidState { .. } => "INVALID_STATE",
            EngineError::TransitionNotAllowed { .. } => "TRANSITION_NOT_ALLOWED",
            EngineError::TransitionConditionNotMet { .. } => "TRANSITION_CONDITION_NOT_MET",
            EngineError::Core(e) => e.error_code(),
            EngineError::Store(e) => e.error_code(),
            EngineError::Rule(e) => e.error_code(),
        }
    }
}
