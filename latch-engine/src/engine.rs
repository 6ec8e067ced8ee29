//! Engine facade wiring the validators together over a shared store.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::relationship::{RelationshipRequest, RelationshipValidator};
use crate::state::StateMachine;
use crate::validate::DataValidator;
use latch_core::{Instance, RuleRef};
use latch_rules::RuleRegistry;
use latch_store::{RecordStore, RuleCatalog};
use serde_json::Value;
use std::sync::Arc;

/// The lifecycle and integrity engine. Cheap to construct; all state lives
/// behind the store and catalog handles.
pub struct Engine {
    relationships: RelationshipValidator,
    state_machine: StateMachine,
    data_validator: DataValidator,
    registry: Arc<RuleRegistry>,
}

impl Engine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        catalog: Arc<dyn RuleCatalog>,
        registry: Arc<RuleRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            relationships: RelationshipValidator::new(store.clone(), config.clone()),
            state_machine: StateMachine::new(store),
            data_validator: DataValidator::new(registry.clone(), catalog, config),
            registry,
        }
    }

    /// Validates a proposed relationship against the source definition's
    /// declared contracts.
    pub async fn validate_relationship(
        &self,
        request: &RelationshipRequest,
    ) -> Result<(), EngineError> {
        self.relationships.validate(request).await
    }

    /// Returns the relationship ids a cascading delete of the given
    /// relationship would remove.
    pub async fn cascade_delete_ids(
        &self,
        relationship_id: &str,
    ) -> Result<Vec<String>, EngineError> {
        self.relationships.cascade_delete_ids(relationship_id).await
    }

    /// Gates a relationship deletion on the cascade flag.
    pub async fn validate_relationship_deletion(
        &self,
        relationship_id: &str,
        cascade: bool,
    ) -> Result<(), EngineError> {
        self.relationships
            .validate_deletion(relationship_id, cascade)
            .await
    }

    /// Transitions an instance, enforcing the declared edge and guard.
    pub async fn transition(
        &self,
        instance_id: &str,
        to_state: &str,
        reason: Option<String>,
    ) -> Result<Instance, EngineError> {
        self.state_machine
            .transition(instance_id, to_state, reason)
            .await
    }

    /// Lists the declared transition targets from an instance's current
    /// state.
    pub async fn allowed_transitions(&self, instance_id: &str) -> Result<Vec<String>, EngineError> {
        self.state_machine.allowed_transitions(instance_id).await
    }

    /// Runs a rule list against instance data, aggregating failures.
    pub async fn validate_data(&self, rules: &[RuleRef], data: &Value) -> Result<(), EngineError> {
        self.data_validator.validate_data(rules, data).await?;
        Ok(())
    }

    /// The rule registry, for registering external executors at startup.
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }
}
