//! Pattern-match executor: a field must match a regular expression.
//!
//! Config:
//!
//! ```json
//! {"field": "cpf", "pattern": "^\\d{11}$", "message": "CPF inválido"}
//! ```

use crate::context::RuleContext;
use crate::error::RuleError;
use crate::executor::{config_str, require_field};
use crate::registry::RuleExecutor;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

pub struct PatternExecutor;

#[async_trait]
impl RuleExecutor for PatternExecutor {
    async fn execute(
        &self,
        config: &Value,
        data: &Value,
        _ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let field = config_str(config, "field")?;
        let pattern = config_str(config, "pattern")?;

        let value = require_field(data, field)?;
        let text = value.as_str().ok_or_else(|| RuleError::TypeMismatch {
            field: field.to_string(),
            expected: "string".to_string(),
        })?;

        let regex = Regex::new(pattern).map_err(|e| RuleError::InvalidConfig {
            reason: format!("invalid pattern '{}': {}", pattern, e),
        })?;

        if regex.is_match(text) {
            return Ok(());
        }

        let message = config
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("field '{}' does not match pattern '{}'", field, pattern));
        Err(RuleError::Failed { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RuleRegistry;
    use latch_store::MemoryStore;
    use serde_json::json;

    async fn run(config: Value, data: Value) -> Result<(), RuleError> {
        let catalog = MemoryStore::new();
        let registry = RuleRegistry::empty();
        let ctx = RuleContext::new(&catalog, &registry);
        PatternExecutor.execute(&config, &data, &ctx).await
    }

    #[tokio::test]
    async fn test_cpf_pattern() {
        let config = json!({"field": "cpf", "pattern": "^\\d{11}$"});

        assert!(run(config.clone(), json!({"cpf": "12345678901"})).await.is_ok());

        let err = run(config, json!({"cpf": "123"})).await.unwrap_err();
        assert!(matches!(err, RuleError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_missing_field() {
        let config = json!({"field": "cpf", "pattern": "^\\d{11}$"});
        let err = run(config, json!({})).await.unwrap_err();
        assert!(matches!(err, RuleError::FieldNotFound { .. }));
    }

    #[tokio::test]
    async fn test_non_string_field() {
        let config = json!({"field": "cpf", "pattern": "^\\d{11}$"});
        let err = run(config, json!({"cpf": 12345678901u64})).await.unwrap_err();
        assert!(matches!(err, RuleError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_configured_message() {
        let config = json!({"field": "cpf", "pattern": "^\\d{11}$", "message": "CPF inválido"});
        let err = run(config, json!({"cpf": "abc"})).await.unwrap_err();
        assert_eq!(err.to_string(), "CPF inválido");
    }

    #[tokio::test]
    async fn test_nested_field_path() {
        let config = json!({"field": "documentos.cpf", "pattern": "^\\d{11}$"});
        assert!(run(config, json!({"documentos": {"cpf": "12345678901"}}))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_config_error() {
        let config = json!({"field": "cpf", "pattern": "["});
        let err = run(config, json!({"cpf": "x"})).await.unwrap_err();
        assert!(matches!(err, RuleError::InvalidConfig { .. }));
    }
}
