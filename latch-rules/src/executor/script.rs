//! Sandboxed-script executor.
//!
//! The script interpreter is an injected capability, not part of this
//! crate: implementations of [`ScriptRuntime`] bind the record's `data`
//! and whatever helper predicates they expose (see [`crate::helpers`]),
//! run the script, and return its final value. The executor maps the
//! returned value to a pass/fail outcome and enforces a hard timeout so a
//! runaway script cannot block the calling worker.
//!
//! Config:
//!
//! ```json
//! {"script": "data.idade >= 18 ? true : 'menor de idade'", "timeout_ms": 2000}
//! ```

use crate::context::RuleContext;
use crate::error::RuleError;
use crate::executor::config_str;
use crate::registry::RuleExecutor;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A bounded script interpreter. `run` must evaluate the script with the
/// data payload bound and return the script's final value.
#[async_trait]
pub trait ScriptRuntime: Send + Sync {
    async fn run(&self, script: &str, data: &Value) -> Result<Value, RuleError>;
}

pub struct ScriptExecutor {
    runtime: Arc<dyn ScriptRuntime>,
}

impl ScriptExecutor {
    pub fn new(runtime: Arc<dyn ScriptRuntime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl RuleExecutor for ScriptExecutor {
    async fn execute(
        &self,
        config: &Value,
        data: &Value,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let script = config_str(config, "script")?;

        let timeout = config
            .get("timeout_ms")
            .and_then(|v| v.as_u64())
            .map(Duration::from_millis)
            .unwrap_or(ctx.default_timeout);

        let result = tokio::time::timeout(timeout, self.runtime.run(script, data))
            .await
            .map_err(|_| RuleError::Timeout {
                millis: timeout.as_millis() as u64,
            })??;

        // A boolean false or a non-empty string is a failure (the string
        // becomes the message); null and everything truthy passes.
        match result {
            Value::Bool(false) => Err(RuleError::Failed {
                message: "script returned false".to_string(),
            }),
            Value::String(message) if !message.is_empty() => Err(RuleError::Failed { message }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RuleRegistry;
    use latch_store::MemoryStore;
    use serde_json::json;

    /// Returns a preset value regardless of the script.
    struct StubRuntime(Value);

    #[async_trait]
    impl ScriptRuntime for StubRuntime {
        async fn run(&self, _script: &str, _data: &Value) -> Result<Value, RuleError> {
            Ok(self.0.clone())
        }
    }

    /// Never finishes.
    struct HangingRuntime;

    #[async_trait]
    impl ScriptRuntime for HangingRuntime {
        async fn run(&self, _script: &str, _data: &Value) -> Result<Value, RuleError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Value::Null)
        }
    }

    async fn run_with(runtime: impl ScriptRuntime + 'static, config: Value) -> Result<(), RuleError> {
        let catalog = MemoryStore::new();
        let registry = RuleRegistry::empty();
        let ctx = RuleContext::new(&catalog, &registry);
        ScriptExecutor::new(Arc::new(runtime))
            .execute(&config, &json!({}), &ctx)
            .await
    }

    #[tokio::test]
    async fn test_true_passes() {
        let result = run_with(StubRuntime(json!(true)), json!({"script": "true"})).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_null_passes() {
        let result = run_with(StubRuntime(Value::Null), json!({"script": "null"})).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_empty_string_passes() {
        let result = run_with(StubRuntime(json!("")), json!({"script": "''"})).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_false_fails() {
        let err = run_with(StubRuntime(json!(false)), json!({"script": "false"}))
            .await
            .unwrap_err();
        assert!(matches!(err, RuleError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_string_becomes_message() {
        let err = run_with(
            StubRuntime(json!("menor de idade")),
            json!({"script": "..."}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "menor de idade");
    }

    #[tokio::test(start_paused = true)]
    async fn test_runaway_script_times_out() {
        let err = run_with(HangingRuntime, json!({"script": "while(true){}", "timeout_ms": 100}))
            .await
            .unwrap_err();
        assert!(matches!(err, RuleError::Timeout { millis: 100 }));
    }

    #[tokio::test]
    async fn test_missing_script_config() {
        let err = run_with(StubRuntime(json!(true)), json!({})).await.unwrap_err();
        assert!(matches!(err, RuleError::InvalidConfig { .. }));
    }
}
