//! Hand-written protobuf types for the change-event log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Field numbers are part of the on-disk format: never renumber.

use prost::Message;

// ── Event Envelope ─────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoEventEnvelope {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(uint64, tag = "2")]
    pub logical_time: u64,
    #[prost(message, optional, tag = "3")]
    pub event: Option<ProtoEvent>,
    #[prost(uint32, tag = "4")]
    pub schema_version: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoEvent {
    #[prost(oneof = "EventKind", tags = "1, 2, 3, 4, 5")]
    pub kind: Option<EventKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum EventKind {
    #[prost(message, tag = "1")]
    ConceptChanged(ConceptChanged),
    #[prost(message, tag = "2")]
    ConceptRemoved(ConceptRemoved),
    #[prost(message, tag = "3")]
    RelationshipChanged(RelationshipChanged),
    #[prost(message, tag = "4")]
    AxiomMemberChanged(AxiomMemberChanged),
    #[prost(message, tag = "5")]
    ComponentRemoved(ComponentRemoved),
}

// ── Characteristic ─────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ProtoCharacteristicType {
    Stated = 0,
    Inferred = 1,
    Additional = 2,
}

// ── Event Types ────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ConceptChanged {
    #[prost(uint64, tag = "1")]
    pub concept_id: u64,
    #[prost(bool, tag = "2")]
    pub active: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct ConceptRemoved {
    #[prost(uint64, tag = "1")]
    pub concept_id: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct RelationshipChanged {
    #[prost(string, tag = "1")]
    pub relationship_id: String,
    #[prost(uint64, tag = "2")]
    pub source_id: u64,
    #[prost(uint64, tag = "3")]
    pub destination_id: u64,
    #[prost(uint64, tag = "4")]
    pub type_id: u64,
    #[prost(enumeration = "ProtoCharacteristicType", tag = "5")]
    pub characteristic_type: i32,
    #[prost(bool, tag = "6")]
    pub active: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct AxiomMemberChanged {
    #[prost(string, tag = "1")]
    pub member_id: String,
    #[prost(uint64, tag = "2")]
    pub source_id: u64,
    #[prost(uint64, repeated, tag = "3")]
    pub destination_ids: Vec<u64>,
    #[prost(bool, tag = "4")]
    pub active: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct ComponentRemoved {
    #[prost(string, tag = "1")]
    pub component_id: String,
}
