//! Storage contracts the engine is written against.
//!
//! Persistence is an external collaborator: a relational store exposing
//! point lookups, participation counts for cardinality checks, adjacency
//! queries for cycle traversal, and version-checked instance updates. The
//! engine never caches records across calls; every operation re-reads
//! current state through these traits.

use crate::error::StoreError;
use async_trait::async_trait;
use latch_core::{Instance, ObjectDefinition, Relationship, ValidationRule};
use serde_json::Value;

/// Which role an instance plays in an edge-participation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEndpoint<'a> {
    /// Edges with the given instance as source.
    Source(&'a str),
    /// Edges with the given instance as target.
    Target(&'a str),
    /// Edges touching the given instance in either role.
    Either(&'a str),
}

/// Record store: instances, definitions and relationship edges.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point lookup of an object definition by id.
    async fn get_definition(&self, id: &str) -> Result<Option<ObjectDefinition>, StoreError>;

    /// Point lookup of an object definition by unique name.
    async fn get_definition_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ObjectDefinition>, StoreError>;

    /// Point lookup of an instance by id. Soft-deleted instances are
    /// returned as-is; callers decide how to treat them.
    async fn get_instance(&self, id: &str) -> Result<Option<Instance>, StoreError>;

    /// Persists an updated instance if its stored version still equals
    /// `expected_version`. Fails with [`StoreError::VersionConflict`]
    /// otherwise.
    async fn update_instance(
        &self,
        instance: &Instance,
        expected_version: u64,
    ) -> Result<Instance, StoreError>;

    /// Point lookup of a relationship edge by id.
    async fn get_relationship(&self, id: &str) -> Result<Option<Relationship>, StoreError>;

    /// Counts live edges of the given type touching the given endpoint.
    async fn count_edges(
        &self,
        relationship_type: &str,
        endpoint: EdgeEndpoint<'_>,
    ) -> Result<u64, StoreError>;

    /// Live outgoing edges of the given type from the given instance
    /// (adjacency for cycle traversal).
    async fn outgoing_edges(
        &self,
        relationship_type: &str,
        source_instance_id: &str,
    ) -> Result<Vec<Relationship>, StoreError>;

    /// All live edges with the given instance as source, any type
    /// (cascade-delete closure).
    async fn edges_from(&self, source_instance_id: &str) -> Result<Vec<Relationship>, StoreError>;

    /// Runs a parameterized predicate query with named bind parameters and
    /// reports whether any row matched.
    async fn query_exists(
        &self,
        query: &str,
        params: &[(String, Value)],
    ) -> Result<bool, StoreError>;
}

/// Validation rule catalog, keyed by rule id or unique name.
#[async_trait]
pub trait RuleCatalog: Send + Sync {
    async fn rule_by_id(&self, id: &str) -> Result<Option<ValidationRule>, StoreError>;

    async fn rule_by_name(&self, name: &str) -> Result<Option<ValidationRule>, StoreError>;
}
