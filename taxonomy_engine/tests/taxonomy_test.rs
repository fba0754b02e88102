/// Behavioural properties of the taxonomy graph, exercised through the
/// public API only.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use taxonomy_engine::hashing::canonical_hash;
use taxonomy_engine::invariants::validate_invariants;
use taxonomy_engine::{
    diff, ConceptId, EdgeId, MissingConcept, Severity, TaxonomyDelta, TaxonomyError, TaxonomyGraph,
};

fn set(ids: &[ConceptId]) -> BTreeSet<ConceptId> {
    ids.iter().copied().collect()
}

fn graph(nodes: &[ConceptId], edges: &[(&str, ConceptId, &[ConceptId])]) -> TaxonomyGraph {
    let mut g = TaxonomyGraph::new();
    for &id in nodes {
        g.add_node(id);
    }
    for &(id, source, destinations) in edges {
        g.add_edge(id, source, destinations.iter().copied());
    }
    g.update();
    g
}

// ─── Registries ──────────────────────────────────────────────────

#[test]
fn idempotent_node_insertion() {
    let mut g = TaxonomyGraph::new();
    g.add_node(7);
    g.add_node(7);
    g.update();
    assert_eq!(g.node_count(), 1);
    g.add_node(7);
    assert!(g.is_dirty(), "identical add still marks the graph dirty");
}

#[test]
fn idempotent_edge_insertion() {
    let build = |times: usize| {
        let mut g = TaxonomyGraph::new();
        for id in [1, 2, 3] {
            g.add_node(id);
        }
        for _ in 0..times {
            g.add_edge("a", 1, [2, 3]);
            g.add_edge("d", 2, [404]);
        }
        let status = g.update();
        (g, status)
    };
    let (once, once_status) = build(1);
    let (twice, twice_status) = build(2);

    assert_eq!(twice.edge_count(), 2);
    assert_eq!(twice_status, once_status);
    assert_eq!(twice_status.invalid_relationships.len(), 1);
    for id in [1, 2, 3] {
        let index = twice.internal_index_of(id).unwrap();
        assert_eq!(index, once.internal_index_of(id).unwrap());
        assert_eq!(
            twice.adjacency().ancestors_of(index),
            once.adjacency().ancestors_of(index)
        );
        assert_eq!(
            twice.adjacency().descendants_of(index),
            once.adjacency().descendants_of(index)
        );
    }
    assert_eq!(canonical_hash(&twice), canonical_hash(&once));
}

#[test]
fn removal_compacts_and_keeps_the_bijection() {
    let mut g = graph(&[10, 20, 30, 40], &[("a", 40, &[10])]);
    assert!(g.remove_node(20));
    assert!(!g.remove_node(20));
    g.update();
    assert_eq!(g.node_count(), 3);
    for id in [10, 30, 40] {
        let index = g.internal_index_of(id).unwrap();
        assert!((index as usize) < 3);
        assert_eq!(g.id_of(index).unwrap(), id);
    }
    assert_eq!(g.all_ancestors(40).unwrap(), set(&[10]));
    validate_invariants(&g).unwrap();
}

#[test]
fn multi_destination_edges_compare_as_sets() {
    let a = graph(&[1, 2, 3], &[("m", 1, &[3, 2, 2])]);
    let b = graph(&[1, 2, 3], &[("m", 1, &[2, 3])]);
    assert_eq!(a.edge(&EdgeId::from("m")), b.edge(&EdgeId::from("m")));
    assert!(diff(&a, &b).is_empty());
    assert_eq!(a.destinations_of(&EdgeId::from("m")).unwrap(), &[2, 3]);
}

// ─── Build ───────────────────────────────────────────────────────

#[test]
fn dangling_edges_are_isolated() {
    let mut g = TaxonomyGraph::new();
    g.add_node(1);
    g.add_node(2);
    g.add_edge("ok", 1, [2]);
    g.add_edge("dangling", 1, [404]);
    let status = g.update();

    assert_eq!(status.severity, Severity::Warning);
    assert_eq!(status.invalid_relationships.len(), 1);
    let bad = &status.invalid_relationships[0];
    assert_eq!(bad.edge_id, EdgeId::from("dangling"));
    assert_eq!(bad.missing, MissingConcept::Destination);

    // Still usable: the valid edge is there, the dangling one is not.
    assert_eq!(g.all_ancestors(1).unwrap(), set(&[2]));
    assert!(!g.is_dirty());
}

#[test]
fn node_removal_turns_edges_dangling() {
    let mut g = graph(&[1, 2], &[("a", 1, &[2])]);
    g.remove_node(1);
    let status = g.update();
    assert_eq!(status.invalid_relationships.len(), 1);
    assert_eq!(status.invalid_relationships[0].missing, MissingConcept::Source);
    assert!(g.contains_edge(&EdgeId::from("a")));
    assert!(g.direct_descendants(2).unwrap().is_empty());
}

// ─── Closure ─────────────────────────────────────────────────────

#[test]
fn chain_closure_both_directions() {
    let g = graph(&[1, 2, 3, 4], &[("a", 1, &[2]), ("b", 2, &[3]), ("c", 3, &[4])]);
    assert_eq!(g.all_ancestors(1).unwrap(), set(&[2, 3, 4]));
    assert_eq!(g.all_descendants(4).unwrap(), set(&[1, 2, 3]));
    assert_eq!(g.all_indirect_ancestors(1).unwrap(), set(&[3, 4]));
    assert!(g.is_leaf(1).unwrap());
    assert!(!g.is_leaf(2).unwrap());
}

#[test]
fn diamond_visits_shared_ancestor_once() {
    let g = graph(
        &[1, 2, 3, 4],
        &[("a", 1, &[2, 3]), ("b", 2, &[4]), ("c", 3, &[4])],
    );
    assert_eq!(g.all_ancestors(1).unwrap(), set(&[2, 3, 4]));
    assert_eq!(g.all_descendants(4).unwrap(), set(&[1, 2, 3]));
    assert_eq!(g.depth(1).unwrap(), 2);
}

#[test]
fn cycle_detection_on_and_off() {
    let mut g = graph(&[1, 2, 3], &[("a", 1, &[2]), ("b", 2, &[3]), ("c", 3, &[1])]);
    assert_eq!(g.all_ancestors(1), Err(TaxonomyError::CycleDetected(1)));
    assert_eq!(g.all_descendants(2), Err(TaxonomyError::CycleDetected(2)));
    assert!(g.depth(3).unwrap_err().is_cycle());

    g.set_check_cycles(false);
    assert_eq!(g.all_ancestors(1).unwrap(), set(&[1, 2, 3]));
    assert_eq!(g.all_descendants(2).unwrap(), set(&[1, 2, 3]));
}

#[test]
fn cycle_elsewhere_does_not_poison_unrelated_queries() {
    let g = graph(
        &[1, 2, 3, 10],
        &[("a", 1, &[2]), ("b", 2, &[1]), ("c", 3, &[10])],
    );
    assert_eq!(g.all_ancestors(3).unwrap(), set(&[10]));
    assert!(g.all_ancestors(1).is_err());
}

#[test]
fn dirty_guard_blocks_every_query() {
    let mut g = graph(&[1, 2], &[("a", 1, &[2])]);
    g.remove_edge(&EdgeId::from("a"));
    assert_eq!(g.all_ancestors(1), Err(TaxonomyError::Dirty));
    assert_eq!(g.all_descendants(2), Err(TaxonomyError::Dirty));
    assert_eq!(g.direct_ancestors(1), Err(TaxonomyError::Dirty));
    assert_eq!(g.parentage(1), Err(TaxonomyError::Dirty));
    assert_eq!(g.depth(1), Err(TaxonomyError::Dirty));
    // Registry lookups stay available.
    assert!(g.contains_node(1));
    assert_eq!(g.internal_index_of(2).map(|_| ()), Ok(()));
}

// ─── Diff ────────────────────────────────────────────────────────

#[test]
fn diff_classifies_every_edge() {
    let old = graph(&[1, 2, 3], &[("keep", 1, &[2]), ("move", 2, &[3]), ("drop", 3, &[1])]);
    let new = graph(&[1, 2, 3], &[("keep", 1, &[2]), ("move", 2, &[1]), ("add", 3, &[2])]);
    let d = diff(&old, &new);
    assert_eq!(d.added, [EdgeId::from("add")].into_iter().collect());
    assert_eq!(d.changed, [EdgeId::from("move")].into_iter().collect());
    assert_eq!(d.removed, [EdgeId::from("drop")].into_iter().collect());
    assert_eq!(d.len(), 3);
    assert!(diff(&new, &new).is_empty());
}

#[test]
fn affected_concepts_span_both_graphs() {
    // old: 3 is-a 1, 4 is-a 3.   new: 3 is-a 2, 4 is-a 3, 5 is-a 4.
    let old = graph(&[1, 2, 3, 4], &[("x", 3, &[1]), ("y", 4, &[3])]);
    let new = graph(
        &[1, 2, 3, 4, 5],
        &[("x", 3, &[2]), ("y", 4, &[3]), ("z", 5, &[4])],
    );
    let delta = TaxonomyDelta::new(old, new);
    assert_eq!(delta.changed_edges().len(), 1);
    assert_eq!(delta.added_edges().len(), 1);
    assert_eq!(delta.affected_concepts().unwrap(), set(&[3, 4, 5]));
}

// ─── Properties ──────────────────────────────────────────────────

type GraphShape = (Vec<ConceptId>, BTreeMap<u8, (ConceptId, Vec<ConceptId>)>);

fn graph_shape() -> impl Strategy<Value = GraphShape> {
    (
        prop::collection::vec(0u64..24, 0..24),
        prop::collection::btree_map(
            any::<u8>(),
            (0u64..32, prop::collection::vec(0u64..32, 0..4)),
            0..32,
        ),
    )
}

fn build(nodes: &[ConceptId], edges: &[(u8, ConceptId, Vec<ConceptId>)]) -> TaxonomyGraph {
    let mut g = TaxonomyGraph::new();
    g.set_check_cycles(false);
    for &id in nodes {
        g.add_node(id);
    }
    for (id, source, destinations) in edges {
        g.add_edge(EdgeId::from(u64::from(*id)), *source, destinations.iter().copied());
    }
    g.update();
    g
}

proptest! {
    #[test]
    fn adjacency_rows_match_valid_degrees((nodes, edges) in graph_shape()) {
        let edges: Vec<_> = edges.into_iter().map(|(k, (s, d))| (k, s, d)).collect();
        let g = build(&nodes, &edges);
        prop_assert!(validate_invariants(&g).is_ok());

        let mut out: BTreeMap<ConceptId, usize> = BTreeMap::new();
        let mut inn: BTreeMap<ConceptId, usize> = BTreeMap::new();
        for (_, edge) in g.edges().iter() {
            for (s, d) in edge.pairs() {
                if g.contains_node(s) && g.contains_node(d) {
                    *out.entry(s).or_default() += 1;
                    *inn.entry(d).or_default() += 1;
                }
            }
        }
        for id in g.node_ids() {
            let index = g.internal_index_of(id).unwrap();
            prop_assert_eq!(g.adjacency().ancestors_of(index).len(), out.get(&id).copied().unwrap_or(0));
            prop_assert_eq!(g.adjacency().descendants_of(index).len(), inn.get(&id).copied().unwrap_or(0));
        }
    }

    #[test]
    fn canonical_hash_ignores_insertion_order((nodes, edges) in graph_shape()) {
        let forward: Vec<_> = edges.into_iter().map(|(k, (s, d))| (k, s, d)).collect();
        let mut backward = forward.clone();
        backward.reverse();
        let mut nodes_rev = nodes.clone();
        nodes_rev.reverse();

        let a = build(&nodes, &forward);
        let b = build(&nodes_rev, &backward);
        prop_assert_eq!(canonical_hash(&a), canonical_hash(&b));
        prop_assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn invalid_records_count_missing_sides((nodes, edges) in graph_shape()) {
        let edges: Vec<_> = edges.into_iter().map(|(k, (s, d))| (k, s, d)).collect();
        let mut g = build(&nodes, &edges);
        let status = g.update();
        let expected: usize = g
            .edges()
            .iter()
            .flat_map(|(_, e)| e.pairs())
            .map(|(s, d)| usize::from(!g.contains_node(s)) + usize::from(!g.contains_node(d)))
            .sum();
        prop_assert_eq!(status.invalid_relationships.len(), expected);
        prop_assert_eq!(status.is_ok(), expected == 0);
    }
}
