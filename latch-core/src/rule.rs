//! Validation rule catalog records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named, reusable predicate definition stored in the rule catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Unique id.
    pub id: String,

    /// Unique name.
    pub name: String,

    /// Executor kind this rule dispatches to, e.g. `pattern` or
    /// `composite`.
    pub rule_type: String,

    /// Executor-specific configuration.
    #[serde(default)]
    pub config: Value,

    /// System rules are immutable and undeletable.
    #[serde(default)]
    pub is_system: bool,

    /// Human-readable name for API consumers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ValidationRule {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        rule_type: impl Into<String>,
        config: Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rule_type: rule_type.into(),
            config,
            is_system: false,
            display_name: None,
            created_at: Utc::now(),
        }
    }

    /// Returns the rule config with an optional override object
    /// shallow-merged on top.
    pub fn config_with_overrides(&self, overrides: Option<&Value>) -> Value {
        match (self.config.clone(), overrides) {
            (Value::Object(mut base), Some(Value::Object(over))) => {
                for (k, v) in over {
                    base.insert(k.clone(), v.clone());
                }
                Value::Object(base)
            }
            (base, _) => base,
        }
    }
}
