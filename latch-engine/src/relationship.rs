//! Relationship integrity validation.
//!
//! Validates proposed edges against the source definition's declared
//! contracts: the relationship type must be declared for the target's
//! definition, cardinality must hold, and (unless the contract allows
//! cycles) the edge must not close a directed cycle through edges of the
//! same type. Also computes cascade-delete closures and gates deletions.
//!
//! All checks re-read current state from the store; nothing is cached
//! across calls. The check-then-insert race is closed by the store's
//! transactional guarantees, not here.

use crate::config::EngineConfig;
use crate::error::EngineError;
use latch_core::{AllowedRelationship, Cardinality, Instance, ObjectDefinition};
use latch_store::{EdgeEndpoint, RecordStore};
use std::collections::HashSet;
use std::sync::Arc;

/// A proposed relationship to validate before insertion.
#[derive(Debug, Clone)]
pub struct RelationshipRequest {
    pub relationship_type: String,
    pub source_instance_id: String,
    pub target_instance_id: String,
}

pub struct RelationshipValidator {
    store: Arc<dyn RecordStore>,
    config: EngineConfig,
}

impl RelationshipValidator {
    pub fn new(store: Arc<dyn RecordStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Validates a proposed relationship. Checks run in order and
    /// short-circuit on the first failure.
    pub async fn validate(&self, request: &RelationshipRequest) -> Result<(), EngineError> {
        let source = self.load_live_instance(&request.source_instance_id).await?;
        let target = self.load_live_instance(&request.target_instance_id).await?;

        if source.id == target.id {
            return Err(EngineError::SelfReferenceNotAllowed {
                instance_id: source.id,
            });
        }

        let source_def = self.load_definition(&source.definition_id).await?;
        let target_def = self.load_definition(&target.definition_id).await?;

        let declared = source_def
            .allowed_relationship(&request.relationship_type, &target_def.name)
            .ok_or_else(|| EngineError::RelationshipNotAllowed {
                relationship_type: request.relationship_type.clone(),
                source_definition: source_def.name.clone(),
                target_definition: target_def.name.clone(),
            })?;

        self.check_cardinality(request, declared).await?;

        if !declared.allow_cycles {
            self.check_acyclic(request).await?;
        }

        tracing::debug!(
            relationship_type = %request.relationship_type,
            source = %request.source_instance_id,
            target = %request.target_instance_id,
            "relationship validated"
        );
        Ok(())
    }

    /// Returns the ids of relationships that must be deleted along with
    /// the given one (one level; deeper cascades are the caller's
    /// responsibility to invoke recursively).
    pub async fn cascade_delete_ids(
        &self,
        relationship_id: &str,
    ) -> Result<Vec<String>, EngineError> {
        let relationship = self
            .store
            .get_relationship(relationship_id)
            .await?
            .ok_or_else(|| EngineError::RelationshipNotFound {
                relationship_id: relationship_id.to_string(),
            })?;

        let source = self.load_instance(&relationship.source_instance_id).await?;
        let target = self.load_instance(&relationship.target_instance_id).await?;
        let source_def = self.load_definition(&source.definition_id).await?;
        let target_def = self.load_definition(&target.definition_id).await?;

        let declared =
            source_def.allowed_relationship(&relationship.relationship_type, &target_def.name);

        match declared {
            Some(entry) if entry.cascade_delete => {
                let dependents = self.store.edges_from(&target.id).await?;
                Ok(dependents.into_iter().map(|r| r.id).collect())
            }
            Some(_) => Ok(Vec::new()),
            None => {
                // The definition evolved after the edge was created; treat
                // the orphaned declaration as non-cascading.
                tracing::warn!(
                    relationship_id = %relationship_id,
                    relationship_type = %relationship.relationship_type,
                    "no declared contract for existing relationship"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Gates a relationship deletion: if dependents exist and cascade was
    /// not requested, the caller must retry with cascade=true.
    pub async fn validate_deletion(
        &self,
        relationship_id: &str,
        cascade: bool,
    ) -> Result<(), EngineError> {
        let dependents = self.cascade_delete_ids(relationship_id).await?;

        if !cascade && !dependents.is_empty() {
            return Err(EngineError::CascadeRequired {
                relationship_id: relationship_id.to_string(),
                dependent_count: dependents.len(),
            });
        }
        Ok(())
    }

    async fn check_cardinality(
        &self,
        request: &RelationshipRequest,
        declared: &AllowedRelationship,
    ) -> Result<(), EngineError> {
        let rel_type = &request.relationship_type;
        let source = request.source_instance_id.as_str();
        let target = request.target_instance_id.as_str();

        let violation = |reason: String| EngineError::CardinalityViolation {
            relationship_type: rel_type.clone(),
            cardinality: declared.cardinality.to_string(),
            reason,
        };

        match declared.cardinality {
            Cardinality::OneToOne => {
                let source_edges = self
                    .store
                    .count_edges(rel_type, EdgeEndpoint::Either(source))
                    .await?;
                if source_edges > 0 {
                    return Err(violation(format!(
                        "instance '{}' already participates in a '{}' relationship",
                        source, rel_type
                    )));
                }
                let target_edges = self
                    .store
                    .count_edges(rel_type, EdgeEndpoint::Either(target))
                    .await?;
                if target_edges > 0 {
                    return Err(violation(format!(
                        "instance '{}' already participates in a '{}' relationship",
                        target, rel_type
                    )));
                }
            }
            Cardinality::OneToMany => {
                let outgoing = self
                    .store
                    .count_edges(rel_type, EdgeEndpoint::Source(source))
                    .await?;
                if outgoing > 0 {
                    return Err(violation(format!(
                        "instance '{}' is already the source of a '{}' relationship",
                        source, rel_type
                    )));
                }
            }
            Cardinality::ManyToOne => {
                let incoming = self
                    .store
                    .count_edges(rel_type, EdgeEndpoint::Target(target))
                    .await?;
                if incoming > 0 {
                    return Err(violation(format!(
                        "instance '{}' is already the target of a '{}' relationship",
                        target, rel_type
                    )));
                }
            }
            Cardinality::ManyToMany => {}
        }

        if let Some(max) = declared.max_occurrences {
            let outgoing = self
                .store
                .count_edges(rel_type, EdgeEndpoint::Source(source))
                .await?;
            if outgoing >= u64::from(max) {
                return Err(violation(format!(
                    "instance '{}' already has {} of at most {} '{}' relationship(s)",
                    source, outgoing, max, rel_type
                )));
            }
        }

        Ok(())
    }

    /// Iterative depth-first search from the *target*, following edges of
    /// the same type, to determine whether the *source* is reachable. If
    /// it is, inserting the edge would close a cycle.
    async fn check_acyclic(&self, request: &RelationshipRequest) -> Result<(), EngineError> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack = vec![request.target_instance_id.clone()];

        while let Some(node) = stack.pop() {
            if node == request.source_instance_id {
                return Err(EngineError::CycleDetected {
                    relationship_type: request.relationship_type.clone(),
                    source_instance_id: request.source_instance_id.clone(),
                    target_instance_id: request.target_instance_id.clone(),
                });
            }
            if !visited.insert(node.clone()) {
                continue;
            }
            if visited.len() > self.config.max_traversal_depth {
                return Err(EngineError::TraversalDepthExceeded {
                    depth: self.config.max_traversal_depth,
                });
            }

            let edges = self
                .store
                .outgoing_edges(&request.relationship_type, &node)
                .await?;
            for edge in edges {
                if !visited.contains(&edge.target_instance_id) {
                    stack.push(edge.target_instance_id);
                }
            }
        }

        Ok(())
    }

    async fn load_instance(&self, id: &str) -> Result<Instance, EngineError> {
        self.store
            .get_instance(id)
            .await?
            .ok_or_else(|| EngineError::InstanceNotFound {
                instance_id: id.to_string(),
            })
    }

    async fn load_live_instance(&self, id: &str) -> Result<Instance, EngineError> {
        let instance = self.load_instance(id).await?;
        if instance.is_deleted {
            return Err(EngineError::InstanceNotFound {
                instance_id: id.to_string(),
            });
        }
        Ok(instance)
    }

    async fn load_definition(&self, id: &str) -> Result<ObjectDefinition, EngineError> {
        self.store
            .get_definition(id)
            .await?
            .ok_or_else(|| EngineError::DefinitionNotFound {
                definition: id.to_string(),
            })
    }
}
