//! In-memory store implementation.
//!
//! Reference implementation of [`RecordStore`] and [`RuleCatalog`] used by
//! the test suites and as a template for real backends. Cardinality counts
//! and adjacency queries consider only edges that are live at call time.

use crate::error::StoreError;
use crate::store::{EdgeEndpoint, RecordStore, RuleCatalog};
use async_trait::async_trait;
use chrono::Utc;
use latch_core::{Instance, ObjectDefinition, Relationship, ValidationRule};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// In-memory record store and rule catalog.
#[derive(Default)]
pub struct MemoryStore {
    definitions: RwLock<HashMap<String, ObjectDefinition>>,
    instances: RwLock<HashMap<String, Instance>>,
    relationships: RwLock<HashMap<String, Relationship>>,
    rules: RwLock<HashMap<String, ValidationRule>>,

    /// Canned results for `query_exists`, keyed by query text.
    query_results: RwLock<HashMap<String, bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_definition(&self, definition: ObjectDefinition) {
        self.definitions
            .write()
            .insert(definition.id.clone(), definition);
    }

    pub fn put_instance(&self, instance: Instance) {
        self.instances.write().insert(instance.id.clone(), instance);
    }

    pub fn put_relationship(&self, relationship: Relationship) {
        self.relationships
            .write()
            .insert(relationship.id.clone(), relationship);
    }

    pub fn remove_relationship(&self, id: &str) -> Option<Relationship> {
        self.relationships.write().remove(id)
    }

    pub fn put_rule(&self, rule: ValidationRule) {
        self.rules.write().insert(rule.id.clone(), rule);
    }

    /// Presets the outcome of a predicate query.
    pub fn set_query_result(&self, query: impl Into<String>, exists: bool) {
        self.query_results.write().insert(query.into(), exists);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_definition(&self, id: &str) -> Result<Option<ObjectDefinition>, StoreError> {
        Ok(self.definitions.read().get(id).cloned())
    }

    async fn get_definition_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ObjectDefinition>, StoreError> {
        Ok(self
            .definitions
            .read()
            .values()
            .find(|d| d.name == name)
            .cloned())
    }

    async fn get_instance(&self, id: &str) -> Result<Option<Instance>, StoreError> {
        Ok(self.instances.read().get(id).cloned())
    }

    async fn update_instance(
        &self,
        instance: &Instance,
        expected_version: u64,
    ) -> Result<Instance, StoreError> {
        let mut instances = self.instances.write();
        let stored = instances
            .get(&instance.id)
            .ok_or_else(|| StoreError::query("update_instance", format!("no row for '{}'", instance.id)))?;

        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                instance_id: instance.id.clone(),
                expected: expected_version,
                actual: stored.version,
            });
        }

        instances.insert(instance.id.clone(), instance.clone());
        Ok(instance.clone())
    }

    async fn get_relationship(&self, id: &str) -> Result<Option<Relationship>, StoreError> {
        Ok(self.relationships.read().get(id).cloned())
    }

    async fn count_edges(
        &self,
        relationship_type: &str,
        endpoint: EdgeEndpoint<'_>,
    ) -> Result<u64, StoreError> {
        let now = Utc::now();
        let count = self
            .relationships
            .read()
            .values()
            .filter(|r| r.relationship_type == relationship_type && r.is_live_at(now))
            .filter(|r| match endpoint {
                EdgeEndpoint::Source(id) => r.source_instance_id == id,
                EdgeEndpoint::Target(id) => r.target_instance_id == id,
                EdgeEndpoint::Either(id) => {
                    r.source_instance_id == id || r.target_instance_id == id
                }
            })
            .count();
        Ok(count as u64)
    }

    async fn outgoing_edges(
        &self,
        relationship_type: &str,
        source_instance_id: &str,
    ) -> Result<Vec<Relationship>, StoreError> {
        let now = Utc::now();
        Ok(self
            .relationships
            .read()
            .values()
            .filter(|r| {
                r.relationship_type == relationship_type
                    && r.source_instance_id == source_instance_id
                    && r.is_live_at(now)
            })
            .cloned()
            .collect())
    }

    async fn edges_from(&self, source_instance_id: &str) -> Result<Vec<Relationship>, StoreError> {
        let now = Utc::now();
        Ok(self
            .relationships
            .read()
            .values()
            .filter(|r| r.source_instance_id == source_instance_id && r.is_live_at(now))
            .cloned()
            .collect())
    }

    async fn query_exists(
        &self,
        query: &str,
        _params: &[(String, Value)],
    ) -> Result<bool, StoreError> {
        self.query_results
            .read()
            .get(query)
            .copied()
            .ok_or_else(|| StoreError::query("query_exists", format!("no result preset for '{}'", query)))
    }
}

#[async_trait]
impl RuleCatalog for MemoryStore {
    async fn rule_by_id(&self, id: &str) -> Result<Option<ValidationRule>, StoreError> {
        Ok(self.rules.read().get(id).cloned())
    }

    async fn rule_by_name(&self, name: &str) -> Result<Option<ValidationRule>, StoreError> {
        Ok(self.rules.read().values().find(|r| r.name == name).cloned())
    }
}
