//! Store-backed predicate executor: a parameterized query against the
//! relational store decides the outcome.
//!
//! Config:
//!
//! ```json
//! {
//!   "query": "SELECT 1 FROM contas WHERE numero = :numero",
//!   "params": ["numero"],
//!   "expect_exists": true,
//!   "message": "conta não encontrada"
//! }
//! ```
//!
//! `params` names data fields whose values bind into the query;
//! `expect_exists` decides whether matching rows constitute success.

use crate::context::RuleContext;
use crate::error::RuleError;
use crate::executor::{config_str, require_field};
use crate::registry::RuleExecutor;
use async_trait::async_trait;
use latch_store::RecordStore;
use serde_json::Value;
use std::sync::Arc;

pub struct QueryExecutor {
    store: Arc<dyn RecordStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RuleExecutor for QueryExecutor {
    async fn execute(
        &self,
        config: &Value,
        data: &Value,
        _ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let query = config_str(config, "query")?;

        let mut params = Vec::new();
        if let Some(names) = config.get("params") {
            let names = names.as_array().ok_or_else(|| RuleError::InvalidConfig {
                reason: "'params' must be an array of field names".to_string(),
            })?;
            for name in names {
                let name = name.as_str().ok_or_else(|| RuleError::InvalidConfig {
                    reason: "'params' entries must be strings".to_string(),
                })?;
                let value = require_field(data, name)?.clone();
                params.push((name.to_string(), value));
            }
        }

        let expect_exists = config
            .get("expect_exists")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        let exists = self.store.query_exists(query, &params).await?;

        if exists == expect_exists {
            return Ok(());
        }

        let message = config
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
            .unwrap_or_else(|| {
                if expect_exists {
                    "expected matching rows, found none".to_string()
                } else {
                    "expected no matching rows, found some".to_string()
                }
            });
        Err(RuleError::Failed { message })
    }
}
