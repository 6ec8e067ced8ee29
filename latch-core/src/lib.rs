//! # latch-core
//!
//! Data model and expression evaluation for latch.
//!
//! This crate provides:
//! - Object definition parsing and validation (lifecycle FSM, relationship
//!   contracts, validation rule references)
//! - Instance records with append-only state history
//! - Relationship edge records
//! - Validation rule catalog records
//! - Guard/rule expression compilation and evaluation

pub mod definition;
pub mod error;
pub mod expr;
pub mod instance;
pub mod relationship;
pub mod rule;

pub use definition::{
    AllowedRelationship, Cardinality, Lifecycle, ObjectDefinition, RuleRef, State, TransitionDef,
};
pub use error::CoreError;
pub use expr::{Expr, ExprEvaluator};
pub use instance::{Instance, StateHistoryEntry};
pub use relationship::Relationship;
pub use rule::ValidationRule;
