//! Instance records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One entry in an instance's append-only state history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateHistoryEntry {
    /// State entered.
    pub state: String,

    /// When the transition committed.
    pub timestamp: DateTime<Utc>,

    /// Optional caller-supplied reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A live record created from an object definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Unique instance id.
    pub id: String,

    /// Id of the object definition this instance was created from.
    pub definition_id: String,

    /// Opaque structured payload.
    pub data: Value,

    /// Current lifecycle state; always a member of the definition's
    /// declared state set.
    pub current_state: String,

    /// Append-only transition log; never rewritten.
    #[serde(default)]
    pub state_history: Vec<StateHistoryEntry>,

    /// Monotonic version, incremented on every state or data mutation.
    pub version: u64,

    /// Soft-delete flag.
    #[serde(default)]
    pub is_deleted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Instance {
    /// Creates a new instance in the given initial state.
    pub fn new(
        id: impl Into<String>,
        definition_id: impl Into<String>,
        initial_state: impl Into<String>,
        data: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            definition_id: definition_id.into(),
            data,
            current_state: initial_state.into(),
            state_history: Vec::new(),
            version: 1,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Commits a transition: appends to the history, moves the current
    /// state and bumps the version. The caller persists the result with a
    /// version check against the pre-transition value.
    pub fn apply_transition(&mut self, to_state: impl Into<String>, reason: Option<String>) {
        let to_state = to_state.into();
        let now = Utc::now();
        self.state_history.push(StateHistoryEntry {
            state: to_state.clone(),
            timestamp: now,
            reason,
        });
        self.current_state = to_state;
        self.version += 1;
        self.updated_at = now;
    }

    /// Marks the instance as soft-deleted.
    pub fn soft_delete(&mut self) {
        let now = Utc::now();
        self.is_deleted = true;
        self.deleted_at = Some(now);
        self.version += 1;
        self.updated_at = now;
    }

    /// Builds the context map exposed to guard and rule expressions.
    pub fn expr_context(&self) -> Value {
        json!({
            "current_state": self.current_state,
            "version": self.version,
            "is_deleted": self.is_deleted,
            "created_at": self.created_at.to_rfc3339(),
            "updated_at": self.updated_at.to_rfc3339(),
        })
    }
}
