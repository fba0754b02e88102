/// Taxonomy Engine — Change Events
///
/// Events are pure data describing what changed in the source of truth.
/// They carry no graph logic; `transitions` maps them to mutations.
///
/// Schema version is locked at 1.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{CharacteristicType, ConceptId, EdgeId};

/// Schema version for v1 change events.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "payload", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A concept was created, activated or inactivated.
    ConceptChanged { concept_id: ConceptId, active: bool },
    /// A concept was deleted outright.
    ConceptRemoved { concept_id: ConceptId },
    /// A relationship record was created or changed.
    RelationshipChanged {
        relationship_id: EdgeId,
        source_id: ConceptId,
        destination_id: ConceptId,
        type_id: ConceptId,
        characteristic_type: CharacteristicType,
        active: bool,
    },
    /// An axiom member was created or changed. `destination_ids` holds
    /// every IS-A target extracted from the axiom expression.
    AxiomMemberChanged {
        member_id: EdgeId,
        source_id: ConceptId,
        destination_ids: Vec<ConceptId>,
        active: bool,
    },
    /// A relationship or axiom member was deleted.
    ComponentRemoved { component_id: EdgeId },
}

impl ChangeEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ChangeEvent::ConceptChanged { .. } => "concept_changed",
            ChangeEvent::ConceptRemoved { .. } => "concept_removed",
            ChangeEvent::RelationshipChanged { .. } => "relationship_changed",
            ChangeEvent::AxiomMemberChanged { .. } => "axiom_member_changed",
            ChangeEvent::ComponentRemoved { .. } => "component_removed",
        }
    }

    /// Convenience constructor for an active IS-A relationship.
    pub fn is_a(
        relationship_id: impl Into<EdgeId>,
        source_id: ConceptId,
        destination_id: ConceptId,
        characteristic_type: CharacteristicType,
    ) -> Self {
        ChangeEvent::RelationshipChanged {
            relationship_id: relationship_id.into(),
            source_id,
            destination_id,
            type_id: crate::domain::IS_A,
            characteristic_type,
            active: true,
        }
    }

    /// The concept a relationship or axiom event is about, if any.
    pub fn source_concept(&self) -> Option<ConceptId> {
        match self {
            ChangeEvent::RelationshipChanged { source_id, .. }
            | ChangeEvent::AxiomMemberChanged { source_id, .. } => Some(*source_id),
            _ => None,
        }
    }
}

/// Sequenced event envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub sequence: u64,
    pub logical_time: u64,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub event: ChangeEvent,
}

impl EventEnvelope {
    pub fn new(sequence: u64, logical_time: u64, event: ChangeEvent) -> Self {
        Self {
            sequence,
            logical_time,
            schema_version: SCHEMA_VERSION,
            event,
        }
    }

    /// Parse an envelope from a JSON value (fixtures, debugging dumps).
    pub fn from_value(v: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(v)
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "sequence": self.sequence,
            "logical_time": self.logical_time,
            "schema_version": self.schema_version,
            "event": self.event,
        })
    }
}
