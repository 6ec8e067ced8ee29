//! Per-request execution context for rule dispatch.

use crate::error::RuleError;
use crate::registry::RuleRegistry;
use latch_core::{RuleRef, ValidationRule};
use latch_store::RuleCatalog;
use serde_json::Value;
use std::time::Duration;

/// Carries the catalog, the registry and the recursion budget through a
/// rule-execution call chain. Composite rules derive child contexts so
/// self-referential compositions hit the depth limit instead of recursing
/// forever.
pub struct RuleContext<'a> {
    pub catalog: &'a dyn RuleCatalog,
    pub registry: &'a RuleRegistry,

    /// Current composite nesting depth.
    pub depth: usize,

    /// Maximum composite nesting depth.
    pub max_depth: usize,

    /// Timeout applied to executors that do external work, unless their
    /// config overrides it.
    pub default_timeout: Duration,
}

impl<'a> RuleContext<'a> {
    pub fn new(catalog: &'a dyn RuleCatalog, registry: &'a RuleRegistry) -> Self {
        Self {
            catalog,
            registry,
            depth: 0,
            max_depth: 16,
            default_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Derives a context one nesting level deeper, failing once the
    /// recursion budget is exhausted.
    pub fn child(&self) -> Result<RuleContext<'a>, RuleError> {
        if self.depth + 1 > self.max_depth {
            return Err(RuleError::RecursionLimit { depth: self.depth });
        }
        Ok(RuleContext {
            catalog: self.catalog,
            registry: self.registry,
            depth: self.depth + 1,
            max_depth: self.max_depth,
            default_timeout: self.default_timeout,
        })
    }

    /// Resolves a rule reference through the catalog, by id first, then by
    /// unique name.
    pub async fn resolve(&self, rule_ref: &RuleRef) -> Result<ValidationRule, RuleError> {
        if let Some(id) = &rule_ref.rule_id {
            if let Some(rule) = self.catalog.rule_by_id(id).await? {
                return Ok(rule);
            }
            return Err(RuleError::RuleNotFound {
                reference: id.clone(),
            });
        }

        if let Some(name) = &rule_ref.rule_name {
            if let Some(rule) = self.catalog.rule_by_name(name).await? {
                return Ok(rule);
            }
            return Err(RuleError::RuleNotFound {
                reference: name.clone(),
            });
        }

        Err(RuleError::InvalidConfig {
            reason: "rule reference has neither rule_id nor rule_name".to_string(),
        })
    }

    /// Resolves and executes a single rule reference, applying any inline
    /// config overrides it carries.
    pub async fn execute_ref(&self, rule_ref: &RuleRef, data: &Value) -> Result<(), RuleError> {
        let rule = self.resolve(rule_ref).await?;
        let executor = self.registry.get(&rule.rule_type)?;
        let config = rule.config_with_overrides(rule_ref.config_overrides.as_ref());
        tracing::debug!(rule = %rule.name, rule_type = %rule.rule_type, depth = self.depth, "executing rule");
        executor.execute(&config, data, self).await
    }
}
