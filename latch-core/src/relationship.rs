//! Relationship records: directed, typed edges between instances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A directed, typed edge between two instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique edge id.
    pub id: String,

    /// Relationship type name, matched against the source definition's
    /// declared contracts.
    pub relationship_type: String,

    pub source_instance_id: String,
    pub target_instance_id: String,

    /// Opaque edge payload.
    #[serde(default)]
    pub properties: Value,

    /// Optional validity window. An edge outside its window no longer
    /// counts toward cardinality or cycle constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Relationship {
    pub fn new(
        id: impl Into<String>,
        relationship_type: impl Into<String>,
        source_instance_id: impl Into<String>,
        target_instance_id: impl Into<String>,
        properties: Value,
    ) -> Self {
        Self {
            id: id.into(),
            relationship_type: relationship_type.into(),
            source_instance_id: source_instance_id.into(),
            target_instance_id: target_instance_id.into(),
            properties,
            valid_from: None,
            valid_until: None,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the edge is live at the given time.
    pub fn is_live_at(&self, at: DateTime<Utc>) -> bool {
        if let Some(from) = self.valid_from {
            if at < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if at > until {
                return false;
            }
        }
        true
    }
}
