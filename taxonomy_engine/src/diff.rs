/// Taxonomy Engine — Snapshot Diff
///
/// Compares the edge registries of an old (last committed) and a new
/// (post-mutation) graph. Pure set/map comparison; adjacency is not read.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::{ConceptId, EdgeId};
use crate::error::Result;
use crate::graph::TaxonomyGraph;

/// Edge ids partitioned by how they changed between two graphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdgeDiff {
    /// Present only in the new graph.
    pub added: BTreeSet<EdgeId>,
    /// Present in both, with a different source or destination set.
    pub changed: BTreeSet<EdgeId>,
    /// Present only in the old graph.
    pub removed: BTreeSet<EdgeId>,
}

impl EdgeDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.changed.len() + self.removed.len()
    }
}

pub fn diff(old: &TaxonomyGraph, new: &TaxonomyGraph) -> EdgeDiff {
    let mut result = EdgeDiff::default();

    for (id, edge) in new.edges().iter() {
        match old.edge(id) {
            None => {
                result.added.insert(id.clone());
            }
            Some(previous) if previous != edge => {
                result.changed.insert(id.clone());
            }
            Some(_) => {}
        }
    }
    for id in old.edge_ids() {
        if !new.contains_edge(id) {
            result.removed.insert(id.clone());
        }
    }

    result
}

/// An old/new graph pair plus their edge diff.
#[derive(Debug, Clone)]
pub struct TaxonomyDelta {
    old: TaxonomyGraph,
    new: TaxonomyGraph,
    diff: EdgeDiff,
}

impl TaxonomyDelta {
    pub fn new(old: TaxonomyGraph, new: TaxonomyGraph) -> Self {
        let diff = diff(&old, &new);
        Self { old, new, diff }
    }

    pub fn old(&self) -> &TaxonomyGraph {
        &self.old
    }

    pub fn new_graph(&self) -> &TaxonomyGraph {
        &self.new
    }

    pub fn diff(&self) -> &EdgeDiff {
        &self.diff
    }

    pub fn added_edges(&self) -> &BTreeSet<EdgeId> {
        &self.diff.added
    }

    pub fn changed_edges(&self) -> &BTreeSet<EdgeId> {
        &self.diff.changed
    }

    pub fn removed_edges(&self) -> &BTreeSet<EdgeId> {
        &self.diff.removed
    }

    /// Release both graphs, e.g. to retain the new one as the next "old".
    pub fn into_parts(self) -> (TaxonomyGraph, TaxonomyGraph, EdgeDiff) {
        (self.old, self.new, self.diff)
    }

    /// Concepts whose hierarchy-derived data must be recomputed.
    ///
    /// Sources of added and changed edges with their descendants in the new
    /// graph, sources of removed and changed edges with their descendants in
    /// the old graph. Both graphs must be built.
    pub fn affected_concepts(&self) -> Result<BTreeSet<ConceptId>> {
        let mut affected = BTreeSet::new();

        let in_new = self.diff.added.iter().chain(self.diff.changed.iter());
        collect_with_descendants(&self.new, in_new, &mut affected)?;

        let in_old = self.diff.removed.iter().chain(self.diff.changed.iter());
        collect_with_descendants(&self.old, in_old, &mut affected)?;

        Ok(affected)
    }
}

fn collect_with_descendants<'a>(
    graph: &TaxonomyGraph,
    edge_ids: impl Iterator<Item = &'a EdgeId>,
    into: &mut BTreeSet<ConceptId>,
) -> Result<()> {
    let mut expanded = BTreeSet::new();
    for edge_id in edge_ids {
        let source = graph.source_of(edge_id)?;
        if !graph.contains_node(source) || !expanded.insert(source) {
            continue;
        }
        into.insert(source);
        into.extend(graph.all_descendants(source)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> BTreeSet<EdgeId> {
        raw.iter().map(|&s| EdgeId::from(s)).collect()
    }

    fn base() -> TaxonomyGraph {
        let mut g = TaxonomyGraph::new();
        for id in 1..=5 {
            g.add_node(id);
        }
        g.add_edge("e1", 1, [2]);
        g.update();
        g
    }

    #[test]
    fn added_and_removed() {
        let g1 = base();
        let mut g2 = g1.clone();
        g2.add_edge("e2", 3, [4]);
        g2.remove_edge(&EdgeId::from("e1"));
        g2.update();

        let d = diff(&g1, &g2);
        assert_eq!(d.added, ids(&["e2"]));
        assert_eq!(d.removed, ids(&["e1"]));
        assert!(d.changed.is_empty());
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn changed_destination_set() {
        let g1 = base();
        let mut g2 = g1.clone();
        g2.add_edge("e1", 1, [2, 3]);
        let d = diff(&g1, &g2);
        assert_eq!(d.changed, ids(&["e1"]));
        assert!(d.added.is_empty() && d.removed.is_empty());
    }

    #[test]
    fn reordered_destinations_are_unchanged() {
        let mut g1 = base();
        g1.add_edge("ax", 5, [3, 4]);
        let mut g2 = base();
        g2.add_edge("ax", 5, [4, 3]);
        assert!(diff(&g1, &g2).is_empty());
    }

    #[test]
    fn affected_concepts_cover_descendants_on_both_sides() {
        // old: 2 is-a 3, 1 is-a 2 ; new: 2 is-a 4 (edge "up" changed)
        let mut old = TaxonomyGraph::new();
        for id in 1..=4 {
            old.add_node(id);
        }
        old.add_edge("low", 1, [2]);
        old.add_edge("up", 2, [3]);
        old.update();

        let mut new = old.clone();
        new.add_edge("up", 2, [4]);
        new.add_edge("extra", 4, [3]);
        new.update();

        let delta = TaxonomyDelta::new(old, new);
        assert_eq!(delta.changed_edges(), &ids(&["up"]));
        assert_eq!(delta.added_edges(), &ids(&["extra"]));
        let affected = delta.affected_concepts().unwrap();
        assert_eq!(affected, [1, 2, 4].into_iter().collect());
    }

    #[test]
    fn removed_source_absent_from_new_graph_is_read_from_old() {
        let old = base();
        let mut new = old.clone();
        new.remove_node(1);
        new.remove_edge(&EdgeId::from("e1"));
        new.update();
        let delta = TaxonomyDelta::new(old, new);
        assert_eq!(delta.affected_concepts().unwrap(), [1].into_iter().collect());
    }
}
