//! Boolean-combinator executor: AND/OR over other catalog rules.
//!
//! Config:
//!
//! ```json
//! {
//!   "operator": "AND",
//!   "rules": [
//!     {"rule_name": "cpf_format"},
//!     {"rule_id": "rule-7", "config_overrides": {"message": "..."}}
//!   ]
//! }
//! ```
//!
//! Sub-rules are resolved through the catalog and dispatched through the
//! same registry, so compositions nest. Nesting depth is bounded: a
//! composition that references itself fails with a recursion-limit error
//! instead of recursing without end. AND requires every sub-rule to pass
//! and reports all failures at once; OR passes when at least one sub-rule
//! passes.

use crate::context::RuleContext;
use crate::error::RuleError;
use crate::registry::RuleExecutor;
use async_trait::async_trait;
use latch_core::RuleRef;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
}

pub struct CompositeExecutor;

#[async_trait]
impl RuleExecutor for CompositeExecutor {
    async fn execute(
        &self,
        config: &Value,
        data: &Value,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let operator = match config.get("operator").and_then(|o| o.as_str()) {
            Some(op) if op.eq_ignore_ascii_case("and") => Operator::And,
            Some(op) if op.eq_ignore_ascii_case("or") => Operator::Or,
            Some(other) => {
                return Err(RuleError::InvalidConfig {
                    reason: format!("unknown operator '{}', expected AND or OR", other),
                })
            }
            None => {
                return Err(RuleError::InvalidConfig {
                    reason: "missing config key 'operator'".to_string(),
                })
            }
        };

        let refs: Vec<RuleRef> = match config.get("rules") {
            Some(rules) => serde_json::from_value(rules.clone()).map_err(|e| {
                RuleError::InvalidConfig {
                    reason: format!("malformed 'rules' list: {}", e),
                }
            })?,
            None => {
                return Err(RuleError::InvalidConfig {
                    reason: "missing config key 'rules'".to_string(),
                })
            }
        };
        if refs.is_empty() {
            return Err(RuleError::InvalidConfig {
                reason: "'rules' list must not be empty".to_string(),
            });
        }

        let child = ctx.child()?;
        let mut failures = Vec::new();

        for rule_ref in &refs {
            match child.execute_ref(rule_ref, data).await {
                Ok(()) => {
                    if operator == Operator::Or {
                        return Ok(());
                    }
                }
                Err(e) if e.is_validation_failure() => failures.push(e.to_string()),
                // Infrastructure and configuration problems are not
                // combinable outcomes; surface them unchanged.
                Err(e) => return Err(e),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(RuleError::Aggregate { failures })
        }
    }
}
