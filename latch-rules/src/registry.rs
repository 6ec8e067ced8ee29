//! Rule-type registry: name -> executor dispatch table.

use crate::context::RuleContext;
use crate::error::RuleError;
use crate::executor::composite::CompositeExecutor;
use crate::executor::http::{HttpCallExecutor, HttpCaller};
use crate::executor::pattern::PatternExecutor;
use crate::executor::query::QueryExecutor;
use crate::executor::script::{ScriptExecutor, ScriptRuntime};
use async_trait::async_trait;
use dashmap::DashMap;
use latch_store::RecordStore;
use serde_json::Value;
use std::sync::Arc;

/// Built-in rule type names.
pub const RULE_TYPE_PATTERN: &str = "pattern";
pub const RULE_TYPE_SCRIPT: &str = "script";
pub const RULE_TYPE_EXTERNAL_CALL: &str = "external_call";
pub const RULE_TYPE_STORE_QUERY: &str = "store_query";
pub const RULE_TYPE_COMPOSITE: &str = "composite";

/// One validation-rule kind. Implementations return `Ok(())` on pass and a
/// [`RuleError`] describing the failure otherwise.
#[async_trait]
pub trait RuleExecutor: Send + Sync {
    async fn execute(
        &self,
        config: &Value,
        data: &Value,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError>;
}

/// Concurrency-safe rule type -> executor table.
///
/// Built-ins are registered at construction; external executors register at
/// process start, never mid-request. The table is read-mostly afterwards
/// and safe for concurrent use without external locking.
pub struct RuleRegistry {
    executors: DashMap<String, Arc<dyn RuleExecutor>>,
}

impl RuleRegistry {
    /// Creates an empty registry with no executors. Used by tests that
    /// register their own.
    pub fn empty() -> Self {
        Self {
            executors: DashMap::new(),
        }
    }

    /// Creates a registry pre-populated with the five built-in executors.
    pub fn with_builtins(
        script_runtime: Arc<dyn ScriptRuntime>,
        http_caller: Arc<dyn HttpCaller>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        let registry = Self::empty();

        // register() only rejects empty names, which these are not.
        let _ = registry.register(RULE_TYPE_PATTERN, Arc::new(PatternExecutor));
        let _ = registry.register(RULE_TYPE_SCRIPT, Arc::new(ScriptExecutor::new(script_runtime)));
        let _ = registry.register(
            RULE_TYPE_EXTERNAL_CALL,
            Arc::new(HttpCallExecutor::new(http_caller)),
        );
        let _ = registry.register(RULE_TYPE_STORE_QUERY, Arc::new(QueryExecutor::new(store)));
        let _ = registry.register(RULE_TYPE_COMPOSITE, Arc::new(CompositeExecutor));

        registry
    }

    /// Registers an executor under a rule type name. Re-registering a name
    /// replaces the previous executor.
    pub fn register(
        &self,
        rule_type: impl Into<String>,
        executor: Arc<dyn RuleExecutor>,
    ) -> Result<(), RuleError> {
        let rule_type = rule_type.into();
        if rule_type.trim().is_empty() {
            return Err(RuleError::InvalidConfig {
                reason: "rule type name must not be empty".to_string(),
            });
        }
        self.executors.insert(rule_type, executor);
        Ok(())
    }

    /// Looks up the executor for a rule type.
    pub fn get(&self, rule_type: &str) -> Result<Arc<dyn RuleExecutor>, RuleError> {
        self.executors
            .get(rule_type)
            .map(|e| e.clone())
            .ok_or_else(|| RuleError::UnknownRuleType {
                rule_type: rule_type.to_string(),
            })
    }

    /// Returns the registered rule type names.
    pub fn rule_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.executors.iter().map(|e| e.key().clone()).collect();
        types.sort_unstable();
        types
    }
}
