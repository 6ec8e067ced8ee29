//! Built-in rule executors.

pub mod composite;
pub mod http;
pub mod pattern;
pub mod query;
pub mod script;

use crate::error::RuleError;
use serde_json::Value;

/// Resolves a dotted path within a data payload.
pub(crate) fn lookup_field<'v>(data: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = data;
    for part in path.split('.') {
        match current {
            Value::Object(map) => current = map.get(part)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Like [`lookup_field`], but missing fields are an error.
pub(crate) fn require_field<'v>(data: &'v Value, path: &str) -> Result<&'v Value, RuleError> {
    lookup_field(data, path).ok_or_else(|| RuleError::FieldNotFound {
        field: path.to_string(),
    })
}

/// Reads a required string key from an executor config object.
pub(crate) fn config_str<'c>(config: &'c Value, key: &str) -> Result<&'c str, RuleError> {
    match config.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) | None => Err(RuleError::InvalidConfig {
            reason: format!("missing config key '{}'", key),
        }),
        Some(other) => Err(RuleError::InvalidConfig {
            reason: format!("config key '{}' must be a string, got {}", key, other),
        }),
    }
}
