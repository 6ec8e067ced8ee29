//! Instance data validation against a definition's rule list.
//!
//! Rules run in declaration order. Data failures are collected so a caller
//! sees every failing rule at once; infrastructure errors (unknown rule
//! type, store failure, timeout) abort immediately and propagate as-is.

use crate::config::EngineConfig;
use latch_core::RuleRef;
use latch_rules::{RuleContext, RuleError, RuleRegistry};
use latch_store::RuleCatalog;
use serde_json::Value;
use std::sync::Arc;

pub struct DataValidator {
    registry: Arc<RuleRegistry>,
    catalog: Arc<dyn RuleCatalog>,
    config: EngineConfig,
}

impl DataValidator {
    pub fn new(
        registry: Arc<RuleRegistry>,
        catalog: Arc<dyn RuleCatalog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            catalog,
            config,
        }
    }

    /// Runs the given rule references against `data` in order.
    pub async fn validate_data(&self, rules: &[RuleRef], data: &Value) -> Result<(), RuleError> {
        let ctx = RuleContext::new(&*self.catalog, &self.registry)
            .with_max_depth(self.config.max_rule_depth)
            .with_default_timeout(self.config.rule_timeout());

        let mut failures = Vec::new();
        for rule_ref in rules {
            match ctx.execute_ref(rule_ref, data).await {
                Ok(()) => {}
                Err(e) if e.is_validation_failure() => failures.push(e.to_string()),
                Err(e) => return Err(e),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            tracing::debug!(count = failures.len(), "data validation failed");
            Err(RuleError::Aggregate { failures })
        }
    }
}
