/// Taxonomy Engine — Event → Mutation Mapping
///
/// Pure mapping from one change event to at most one graph mutation,
/// filtered by the kind of taxonomy the graph maintains.
///
///   concept active            → add_node
///   concept inactive/removed  → remove_node
///   IS-A relationship, active, matching characteristic → add_edge(id, s, [d])
///   axiom member, active (stated only)                 → add_edge(id, s, ds)
///   anything else touching an existing edge id          → remove_edge

use tracing::trace;

use crate::domain::{ConceptId, EdgeId, TaxonomyKind, IS_A};
use crate::events::ChangeEvent;
use crate::graph::TaxonomyGraph;

/// What an event did to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    NodeAdded(ConceptId),
    NodeRemoved(ConceptId),
    EdgeAdded(EdgeId),
    EdgeRemoved(EdgeId),
    /// Not relevant to this taxonomy, or nothing to remove.
    Ignored,
}

/// Apply `event` to `graph` as seen by a taxonomy of `kind`.
pub fn apply_change(graph: &mut TaxonomyGraph, kind: TaxonomyKind, event: &ChangeEvent) -> Mutation {
    let mutation = match event {
        ChangeEvent::ConceptChanged {
            concept_id,
            active: true,
        } => {
            graph.add_node(*concept_id);
            Mutation::NodeAdded(*concept_id)
        }
        ChangeEvent::ConceptChanged {
            concept_id,
            active: false,
        }
        | ChangeEvent::ConceptRemoved { concept_id } => {
            if graph.remove_node(*concept_id) {
                Mutation::NodeRemoved(*concept_id)
            } else {
                Mutation::Ignored
            }
        }
        ChangeEvent::RelationshipChanged {
            relationship_id,
            source_id,
            destination_id,
            type_id,
            characteristic_type,
            active,
        } => {
            if *active && *type_id == IS_A && kind.accepts(*characteristic_type) {
                graph.add_edge(relationship_id.clone(), *source_id, [*destination_id]);
                Mutation::EdgeAdded(relationship_id.clone())
            } else {
                // Inactivated, retyped or moved to another characteristic.
                remove_if_present(graph, relationship_id)
            }
        }
        ChangeEvent::AxiomMemberChanged {
            member_id,
            source_id,
            destination_ids,
            active,
        } => {
            if !kind.accepts_axioms() {
                Mutation::Ignored
            } else if *active && !destination_ids.is_empty() {
                graph.add_edge(member_id.clone(), *source_id, destination_ids.iter().copied());
                Mutation::EdgeAdded(member_id.clone())
            } else {
                remove_if_present(graph, member_id)
            }
        }
        ChangeEvent::ComponentRemoved { component_id } => remove_if_present(graph, component_id),
    };

    trace!(event = event.event_type(), ?mutation, "change applied");
    mutation
}

fn remove_if_present(graph: &mut TaxonomyGraph, edge_id: &EdgeId) -> Mutation {
    if graph.contains_edge(edge_id) {
        graph.remove_edge(edge_id);
        Mutation::EdgeRemoved(edge_id.clone())
    } else {
        Mutation::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CharacteristicType;

    fn graph_with(ids: &[ConceptId]) -> TaxonomyGraph {
        let mut g = TaxonomyGraph::new();
        for &id in ids {
            g.add_node(id);
        }
        g.update();
        g
    }

    #[test]
    fn concept_activation_and_inactivation() {
        let mut g = TaxonomyGraph::new();
        let on = ChangeEvent::ConceptChanged { concept_id: 1, active: true };
        let off = ChangeEvent::ConceptChanged { concept_id: 1, active: false };
        assert_eq!(apply_change(&mut g, TaxonomyKind::Inferred, &on), Mutation::NodeAdded(1));
        assert!(g.contains_node(1));
        assert_eq!(apply_change(&mut g, TaxonomyKind::Inferred, &off), Mutation::NodeRemoved(1));
        assert_eq!(apply_change(&mut g, TaxonomyKind::Inferred, &off), Mutation::Ignored);
    }

    #[test]
    fn characteristic_type_selects_taxonomy() {
        let stated = ChangeEvent::is_a("r1", 1, 2, CharacteristicType::Stated);
        let mut inferred = graph_with(&[1, 2]);
        assert_eq!(apply_change(&mut inferred, TaxonomyKind::Inferred, &stated), Mutation::Ignored);
        assert_eq!(inferred.edge_count(), 0);

        let mut g = graph_with(&[1, 2]);
        assert_eq!(
            apply_change(&mut g, TaxonomyKind::Stated, &stated),
            Mutation::EdgeAdded(EdgeId::from("r1"))
        );
    }

    #[test]
    fn retyped_relationship_drops_the_edge() {
        let mut g = graph_with(&[1, 2]);
        apply_change(&mut g, TaxonomyKind::Inferred, &ChangeEvent::is_a("r1", 1, 2, CharacteristicType::Inferred));
        let retyped = ChangeEvent::RelationshipChanged {
            relationship_id: EdgeId::from("r1"),
            source_id: 1,
            destination_id: 2,
            type_id: 363_698_007,
            characteristic_type: CharacteristicType::Inferred,
            active: true,
        };
        assert_eq!(
            apply_change(&mut g, TaxonomyKind::Inferred, &retyped),
            Mutation::EdgeRemoved(EdgeId::from("r1"))
        );
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn axiom_members_only_feed_the_stated_taxonomy() {
        let axiom = ChangeEvent::AxiomMemberChanged {
            member_id: EdgeId::from("m1"),
            source_id: 1,
            destination_ids: vec![3, 2],
            active: true,
        };
        let mut inferred = graph_with(&[1, 2, 3]);
        assert_eq!(apply_change(&mut inferred, TaxonomyKind::Inferred, &axiom), Mutation::Ignored);

        let mut stated = graph_with(&[1, 2, 3]);
        apply_change(&mut stated, TaxonomyKind::Stated, &axiom);
        assert_eq!(stated.destinations_of(&EdgeId::from("m1")).unwrap(), &[2, 3]);

        let emptied = ChangeEvent::AxiomMemberChanged {
            member_id: EdgeId::from("m1"),
            source_id: 1,
            destination_ids: Vec::new(),
            active: true,
        };
        assert_eq!(
            apply_change(&mut stated, TaxonomyKind::Stated, &emptied),
            Mutation::EdgeRemoved(EdgeId::from("m1"))
        );
    }

    #[test]
    fn component_removal() {
        let mut g = graph_with(&[1, 2]);
        apply_change(&mut g, TaxonomyKind::Inferred, &ChangeEvent::is_a(9u64, 1, 2, CharacteristicType::Inferred));
        let removed = ChangeEvent::ComponentRemoved { component_id: EdgeId::from(9u64) };
        assert_eq!(
            apply_change(&mut g, TaxonomyKind::Inferred, &removed),
            Mutation::EdgeRemoved(EdgeId::from("9"))
        );
        assert_eq!(apply_change(&mut g, TaxonomyKind::Inferred, &removed), Mutation::Ignored);
    }
}
