//! # latch-engine
//!
//! Instance lifecycle and relationship integrity engine.
//!
//! This crate ties the lower layers together:
//! - [`RelationshipValidator`]: cardinality, cycle and cascade enforcement
//!   for typed edges between instances
//! - [`StateMachine`]: explicit, guarded lifecycle transitions with
//!   optimistic version commits
//! - [`DataValidator`]: ordered rule-list execution with failure
//!   aggregation
//! - [`Engine`]: a facade over the three, sharing one store handle
//!
//! Validation here is advisory plus transactional: every check re-reads
//! current state, and the store's version check closes the window between
//! validation and commit.

pub mod config;
pub mod engine;
pub mod error;
pub mod relationship;
pub mod state;
pub mod validate;

pub use config::{ConfigError, EngineConfig};
pub use engine::Engine;
pub use error::EngineError;
pub use relationship::{RelationshipRequest, RelationshipValidator};
pub use state::StateMachine;
pub use validate::DataValidator;
