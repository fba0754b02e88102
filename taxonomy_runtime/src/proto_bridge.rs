//! Proto ↔ engine conversion bridge.
//!
//! Converts between the protobuf wire types (proto_types.rs) and the
//! engine's typed `EventEnvelope`. Decoding is strict: an envelope without
//! an event, or with an unknown characteristic, is a decode error rather
//! than a silently dropped change.

use taxonomy_engine::{ChangeEvent, CharacteristicType, EdgeId, EventEnvelope};

use crate::error::{Result, RuntimeError};
use crate::proto_types::*;

/// Convert a protobuf envelope to the engine's envelope.
pub fn proto_to_event(proto: &ProtoEventEnvelope) -> Result<EventEnvelope> {
    let kind = proto
        .event
        .as_ref()
        .and_then(|e| e.kind.as_ref())
        .ok_or_else(|| {
            RuntimeError::Decode(format!("envelope {} carries no event", proto.sequence))
        })?;

    let event = match kind {
        EventKind::ConceptChanged(c) => ChangeEvent::ConceptChanged {
            concept_id: c.concept_id,
            active: c.active,
        },
        EventKind::ConceptRemoved(c) => ChangeEvent::ConceptRemoved {
            concept_id: c.concept_id,
        },
        EventKind::RelationshipChanged(r) => ChangeEvent::RelationshipChanged {
            relationship_id: EdgeId::new(r.relationship_id.clone()),
            source_id: r.source_id,
            destination_id: r.destination_id,
            type_id: r.type_id,
            characteristic_type: characteristic_from_proto(r.characteristic_type)?,
            active: r.active,
        },
        EventKind::AxiomMemberChanged(a) => ChangeEvent::AxiomMemberChanged {
            member_id: EdgeId::new(a.member_id.clone()),
            source_id: a.source_id,
            destination_ids: a.destination_ids.clone(),
            active: a.active,
        },
        EventKind::ComponentRemoved(c) => ChangeEvent::ComponentRemoved {
            component_id: EdgeId::new(c.component_id.clone()),
        },
    };

    Ok(EventEnvelope {
        sequence: proto.sequence,
        logical_time: proto.logical_time,
        schema_version: proto.schema_version,
        event,
    })
}

/// Convert an engine envelope to its protobuf form for the binary log.
pub fn event_to_proto(envelope: &EventEnvelope) -> ProtoEventEnvelope {
    let kind = match &envelope.event {
        ChangeEvent::ConceptChanged { concept_id, active } => {
            EventKind::ConceptChanged(ConceptChanged {
                concept_id: *concept_id,
                active: *active,
            })
        }
        ChangeEvent::ConceptRemoved { concept_id } => EventKind::ConceptRemoved(ConceptRemoved {
            concept_id: *concept_id,
        }),
        ChangeEvent::RelationshipChanged {
            relationship_id,
            source_id,
            destination_id,
            type_id,
            characteristic_type,
            active,
        } => EventKind::RelationshipChanged(RelationshipChanged {
            relationship_id: relationship_id.as_str().to_string(),
            source_id: *source_id,
            destination_id: *destination_id,
            type_id: *type_id,
            characteristic_type: characteristic_to_proto(*characteristic_type) as i32,
            active: *active,
        }),
        ChangeEvent::AxiomMemberChanged {
            member_id,
            source_id,
            destination_ids,
            active,
        } => EventKind::AxiomMemberChanged(AxiomMemberChanged {
            member_id: member_id.as_str().to_string(),
            source_id: *source_id,
            destination_ids: destination_ids.clone(),
            active: *active,
        }),
        ChangeEvent::ComponentRemoved { component_id } => {
            EventKind::ComponentRemoved(ComponentRemoved {
                component_id: component_id.as_str().to_string(),
            })
        }
    };

    ProtoEventEnvelope {
        sequence: envelope.sequence,
        logical_time: envelope.logical_time,
        event: Some(ProtoEvent { kind: Some(kind) }),
        schema_version: envelope.schema_version,
    }
}

fn characteristic_from_proto(value: i32) -> Result<CharacteristicType> {
    match ProtoCharacteristicType::try_from(value) {
        Ok(ProtoCharacteristicType::Stated) => Ok(CharacteristicType::Stated),
        Ok(ProtoCharacteristicType::Inferred) => Ok(CharacteristicType::Inferred),
        Ok(ProtoCharacteristicType::Additional) => Ok(CharacteristicType::Additional),
        Err(_) => Err(RuntimeError::Decode(format!(
            "unknown characteristic type {}",
            value
        ))),
    }
}

fn characteristic_to_proto(value: CharacteristicType) -> ProtoCharacteristicType {
    match value {
        CharacteristicType::Stated => ProtoCharacteristicType::Stated,
        CharacteristicType::Inferred => ProtoCharacteristicType::Inferred,
        CharacteristicType::Additional => ProtoCharacteristicType::Additional,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn relationship_survives_the_wire() {
        let env = EventEnvelope::new(
            4,
            2,
            ChangeEvent::is_a("rel-1", 10, 20, CharacteristicType::Additional),
        );
        let bytes = event_to_proto(&env).encode_to_vec();
        let decoded = ProtoEventEnvelope::decode(bytes.as_slice()).unwrap();
        assert_eq!(proto_to_event(&decoded).unwrap(), env);
    }

    #[test]
    fn empty_envelope_is_a_decode_error() {
        let proto = ProtoEventEnvelope {
            sequence: 9,
            ..Default::default()
        };
        let err = proto_to_event(&proto).unwrap_err();
        assert!(matches!(err, RuntimeError::Decode(ref m) if m.contains("9")));
    }

    #[test]
    fn unknown_characteristic_is_rejected() {
        let mut proto = event_to_proto(&EventEnvelope::new(
            1,
            1,
            ChangeEvent::is_a(5u64, 1, 2, CharacteristicType::Inferred),
        ));
        if let Some(ProtoEvent {
            kind: Some(EventKind::RelationshipChanged(r)),
        }) = proto.event.as_mut()
        {
            r.characteristic_type = 42;
        }
        assert!(proto_to_event(&proto).is_err());
    }
}
