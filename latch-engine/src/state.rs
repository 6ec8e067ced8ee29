//! Lifecycle transition engine.
//!
//! Transitions are explicit: a move from one state to another is permitted
//! only if the definition declares that exact edge and its guard (if any)
//! evaluates true against the instance's current data. Commits use an
//! optimistic version check so two concurrent transitions on the same
//! instance cannot both land.

use crate::error::EngineError;
use latch_core::{Instance, ObjectDefinition, State};
use latch_store::RecordStore;
use std::sync::Arc;

pub struct StateMachine {
    store: Arc<dyn RecordStore>,
}

impl StateMachine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Transitions an instance to `to_state` and persists the result.
    /// Returns the updated instance on success.
    pub async fn transition(
        &self,
        instance_id: &str,
        to_state: &str,
        reason: Option<String>,
    ) -> Result<Instance, EngineError> {
        let mut instance = self.load_live_instance(instance_id).await?;
        let definition = self.load_definition(&instance.definition_id).await?;

        let from = State::from(instance.current_state.as_str());
        let to = State::from(to_state);

        if !definition.lifecycle.has_state(&to) {
            return Err(EngineError::InvalidState {
                state: to_state.to_string(),
                definition: definition.name.clone(),
            });
        }

        let guard = definition.lifecycle.get_transition(&from, &to).ok_or_else(|| {
            EngineError::TransitionNotAllowed {
                from: from.as_str().to_string(),
                to: to_state.to_string(),
            }
        })?;

        if let Some(expr) = guard {
            let permitted = expr.eval(&instance.data, &instance.expr_context())?;
            if !permitted {
                return Err(EngineError::TransitionConditionNotMet {
                    from: from.as_str().to_string(),
                    to: to_state.to_string(),
                });
            }
        }

        let expected = instance.version;
        instance.apply_transition(to_state, reason);
        self.store.update_instance(&instance, expected).await?;

        tracing::debug!(
            instance_id = %instance.id,
            from = %from.as_str(),
            to = %to_state,
            version = instance.version,
            "transition committed"
        );
        Ok(instance)
    }

    /// Returns the declared transition targets from the instance's current
    /// state. Guards are not evaluated; a listed target may still be
    /// rejected at transition time.
    pub async fn allowed_transitions(&self, instance_id: &str) -> Result<Vec<String>, EngineError> {
        let instance = self.load_live_instance(instance_id).await?;
        let definition = self.load_definition(&instance.definition_id).await?;

        let from = State::from(instance.current_state.as_str());
        Ok(definition
            .lifecycle
            .targets_from(&from)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    async fn load_live_instance(&self, id: &str) -> Result<Instance, EngineError> {
        let instance = self
            .store
            .get_instance(id)
            .await?
            .ok_or_else(|| EngineError::InstanceNotFound {
                instance_id: id.to_string(),
            })?;
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
