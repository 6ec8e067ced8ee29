//! Object definition types.
//!
//! An object definition is the blueprint instances are created from. Its
//! lifecycle block uses a JSON DSL:
//!
//! ```json
//! {
//!   "states": ["CADASTRO_PENDENTE", "DOCUMENTOS_ENVIADOS", "ATIVO"],
//!   "initial": "CADASTRO_PENDENTE",
//!   "transitions": [
//!     {"from": "CADASTRO_PENDENTE", "to": "DOCUMENTOS_ENVIADOS",
//!      "guard": "data.cpf != '' && data.rg != ''"},
//!     {"from": "DOCUMENTOS_ENVIADOS", "to": "ATIVO"}
//!   ]
//! }
//! ```
//!
//! Relationship contracts and validation rule references are declared
//! alongside; instances and relationships refer to definitions by id only,
//! so definitions can evolve independently.

use crate::error::CoreError;
use crate::expr::Expr;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// A lifecycle state name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(pub String);

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for State {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for State {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Multiplicity constraint on a relationship type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:1")]
    ManyToOne,
    #[serde(rename = "N:M")]
    ManyToMany,
}

impl FromStr for Cardinality {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1:1" => Ok(Cardinality::OneToOne),
            "1:N" => Ok(Cardinality::OneToMany),
            "N:1" => Ok(Cardinality::ManyToOne),
            "N:M" => Ok(Cardinality::ManyToMany),
            other => Err(CoreError::InvalidCardinality {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cardinality::OneToOne => "1:1",
            Cardinality::OneToMany => "1:N",
            Cardinality::ManyToOne => "N:1",
            Cardinality::ManyToMany => "N:M",
        };
        f.write_str(s)
    }
}

/// A declared relationship contract on the source definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowedRelationship {
    /// Relationship type name, e.g. `TEM_CONTA`.
    #[serde(rename = "type")]
    pub relationship_type: String,

    /// Name of the target object definition.
    pub target_definition: String,

    /// Multiplicity constraint.
    pub cardinality: Cardinality,

    /// Whether directed cycles through edges of this type are permitted.
    #[serde(default)]
    pub allow_cycles: bool,

    /// Whether deleting an edge of this type cascades to the target's
    /// outgoing edges.
    #[serde(default)]
    pub cascade_delete: bool,

    /// Declarative lower bound on edge count (not enforceable at insert).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_occurrences: Option<u32>,

    /// Upper bound on the source's outgoing edges of this type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occurrences: Option<u32>,
}

/// An ordered reference to a validation rule, by id or unique name, with
/// optional inline config overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,

    /// Shallow-merged over the stored rule config at execution time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_overrides: Option<serde_json::Value>,
}

/// A declared transition edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionDef {
    pub from: State,
    pub to: State,

    /// Optional guard expression; absent means the transition is
    /// unconditional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
}

/// Raw lifecycle declaration as stored/transmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleRaw {
    /// All valid states.
    pub states: Vec<String>,

    /// Initial state for new instances.
    pub initial: String,

    /// Declared transitions.
    pub transitions: Vec<TransitionDef>,
}

/// Validated and indexed lifecycle declaration.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    /// All valid states.
    pub states: HashSet<State>,

    /// Initial state for new instances.
    pub initial: State,

    /// Transitions indexed by (from, to) -> compiled guard.
    transitions: HashMap<(State, State), Option<Expr>>,

    /// Original raw declaration for storage.
    pub raw: LifecycleRaw,
}

impl Lifecycle {
    /// Parses and validates a lifecycle declaration from JSON.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CoreError> {
        let raw: LifecycleRaw = serde_json::from_value(json.clone())?;
        Self::from_raw(raw)
    }

    /// Validates a raw lifecycle declaration, compiling guards.
    pub fn from_raw(raw: LifecycleRaw) -> Result<Self, CoreError> {
        let states: HashSet<State> = raw.states.iter().map(|s| State(s.clone())).collect();

        let initial = State(raw.initial.clone());
        if !states.contains(&initial) {
            return Err(CoreError::InvalidDefinition {
                reason: format!("initial state '{}' not in states list", initial.as_str()),
            });
        }

        let mut transitions = HashMap::new();
        for t in &raw.transitions {
            if !states.contains(&t.from) {
                return Err(CoreError::InvalidDefinition {
                    reason: format!("transition source '{}' not in states list", t.from.as_str()),
                });
            }
            if !states.contains(&t.to) {
                return Err(CoreError::InvalidDefinition {
                    reason: format!("transition target '{}' not in states list", t.to.as_str()),
                });
            }

            // Compile the guard at declaration time so malformed expressions
            // are rejected before any instance exists.
            let guard = match &t.guard {
                Some(src) if !src.trim().is_empty() => Some(Expr::parse(src)?),
                _ => None,
            };

            let key = (t.from.clone(), t.to.clone());
            if transitions.contains_key(&key) {
                return Err(CoreError::InvalidDefinition {
                    reason: format!(
                        "duplicate transition '{}' -> '{}'",
                        t.from.as_str(),
                        t.to.as_str()
                    ),
                });
            }
            transitions.insert(key, guard);
        }

        Ok(Self {
            states,
            initial,
            transitions,
            raw,
        })
    }

    /// Looks up the declared transition from one state to another.
    pub fn get_transition(&self, from: &State, to: &State) -> Option<Option<&Expr>> {
        self.transitions
            .get(&(from.clone(), to.clone()))
            .map(|guard| guard.as_ref())
    }

    /// Returns true if the given state is declared.
    pub fn has_state(&self, state: &State) -> bool {
        self.states.contains(state)
    }

    /// Returns the targets of all declared transitions out of the given
    /// state, independent of guards.
    pub fn targets_from(&self, from: &State) -> Vec<&str> {
        let mut targets: Vec<&str> = self
            .transitions
            .keys()
            .filter(|(f, _)| f == from)
            .map(|(_, t)| t.as_str())
            .collect();
        targets.sort_unstable();
        targets
    }
}

/// An object definition: the blueprint instances are created from.
#[derive(Debug, Clone)]
pub struct ObjectDefinition {
    /// Unique id.
    pub id: String,

    /// Unique name, e.g. `pessoa_fisica`.
    pub name: String,

    /// Structural version, bumped on every structural edit.
    pub version: u32,

    /// Structural contract for instance data (delegated to an external
    /// schema validator; opaque here).
    pub schema: serde_json::Value,

    /// Lifecycle declaration.
    pub lifecycle: Lifecycle,

    /// Declared relationship contracts (this definition as source).
    pub allowed_relationships: Vec<AllowedRelationship>,

    /// Ordered validation rule references.
    pub validation_rules: Vec<RuleRef>,

    /// Soft-deactivation flag; inactive definitions accept no new writes.
    pub is_active: bool,

    /// Checksum of the structural blocks, for change detection.
    pub checksum: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Raw definition as stored/transmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDefinitionRaw {
    pub id: String,
    pub name: String,

    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub schema: serde_json::Value,

    pub states: LifecycleRaw,

    #[serde(default)]
    pub allowed_relationships: Vec<AllowedRelationship>,

    #[serde(default)]
    pub validation_rules: Vec<RuleRef>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default = "chrono::Utc::now")]
    pub created_at: chrono::DateTime<chrono::Utc>,

    #[serde(default = "chrono::Utc::now")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

fn default_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl ObjectDefinition {
    /// Parses and validates a definition from its stored JSON shape.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CoreError> {
        let raw: ObjectDefinitionRaw = serde_json::from_value(json.clone())?;
        Self::from_raw(raw)
    }

    /// Validates a raw definition.
    pub fn from_raw(raw: ObjectDefinitionRaw) -> Result<Self, CoreError> {
        let lifecycle = Lifecycle::from_raw(raw.states.clone())?;

        // Checksum over the structural blocks only, so data-independent
        // edits (timestamps) do not register as structural changes.
        let structural = serde_json::to_vec(&(
            &raw.name,
            &raw.schema,
            &raw.states,
            &raw.allowed_relationships,
            &raw.validation_rules,
        ))?;
        let checksum = format!("{:08x}", crc32c::crc32c(&structural));

        Ok(Self {
            id: raw.id,
            name: raw.name,
            version: raw.version,
            schema: raw.schema,
            lifecycle,
            allowed_relationships: raw.allowed_relationships,
            validation_rules: raw.validation_rules,
            is_active: raw.is_active,
            checksum,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }

    /// Finds the declared relationship contract for the given type and
    /// target definition name.
    pub fn allowed_relationship(
        &self,
        relationship_type: &str,
        target_definition: &str,
    ) -> Option<&AllowedRelationship> {
        self.allowed_relationships.iter().find(|r| {
            r.relationship_type == relationship_type && r.target_definition == target_definition
        })
    }
}
