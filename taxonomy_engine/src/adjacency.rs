/// Taxonomy Engine — Adjacency Builder
///
/// Turns the edge registry into two parallel arrays indexed by internal id:
/// `ancestors[i]` (direct super-types) and `descendants[i]` (direct sub-types).
///
/// Two passes over the expanded (source, destination) pairs:
///   1. resolve endpoints, count out/in degrees, record dangling pairs
///   2. fill exact-size slices through per-node cursors
///
/// O(V + E) where E counts expanded pairs.

use crate::domain::{InvalidRelationship, MissingConcept};
use crate::edges::EdgeRegistry;
use crate::nodes::NodeRegistry;

/// Derived adjacency state. Only `build` writes it.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    ancestors: Vec<Box<[u32]>>,
    descendants: Vec<Box<[u32]>>,
}

impl Adjacency {
    /// Build adjacency for the current registries.
    ///
    /// Pairs whose source or destination is not registered are left out and
    /// returned as invalid relationships, one record per missing side.
    pub fn build(
        nodes: &NodeRegistry,
        edges: &EdgeRegistry,
    ) -> (Self, Vec<InvalidRelationship>) {
        let node_count = nodes.len();
        let mut out_degree = vec![0u32; node_count];
        let mut in_degree = vec![0u32; node_count];
        let mut invalid = Vec::new();
        let mut resolved: Vec<(u32, u32)> = Vec::with_capacity(edges.pair_count());

        // -- pass 1: resolve + histogram --
        for (edge_id, edge) in edges.iter() {
            for (source_id, destination_id) in edge.pairs() {
                let source = nodes.index_of(source_id);
                let destination = nodes.index_of(destination_id);

                if source.is_none() {
                    invalid.push(InvalidRelationship {
                        edge_id: edge_id.clone(),
                        source_id,
                        destination_id,
                        missing: MissingConcept::Source,
                    });
                }
                if destination.is_none() {
                    invalid.push(InvalidRelationship {
                        edge_id: edge_id.clone(),
                        source_id,
                        destination_id,
                        missing: MissingConcept::Destination,
                    });
                }

                if let (Some(s), Some(d)) = (source, destination) {
                    out_degree[s as usize] += 1;
                    in_degree[d as usize] += 1;
                    resolved.push((s, d));
                }
            }
        }

        // -- exact-size allocation --
        let mut ancestors: Vec<Box<[u32]>> = out_degree
            .iter()
            .map(|&n| vec![0u32; n as usize].into_boxed_slice())
            .collect();
        let mut descendants: Vec<Box<[u32]>> = in_degree
            .iter()
            .map(|&n| vec![0u32; n as usize].into_boxed_slice())
            .collect();

        // -- pass 2: fill through cursors --
        let mut up_cursor = vec![0usize; node_count];
        let mut down_cursor = vec![0usize; node_count];
        for &(s, d) in &resolved {
            let (s, d) = (s as usize, d as usize);
            ancestors[s][up_cursor[s]] = d as u32;
            up_cursor[s] += 1;
            descendants[d][down_cursor[d]] = s as u32;
            down_cursor[d] += 1;
        }

        (
            Self {
                ancestors,
                descendants,
            },
            invalid,
        )
    }

    /// Number of nodes the arrays were built for.
    pub fn node_count(&self) -> usize {
        self.ancestors.len()
    }

    pub fn ancestors_of(&self, index: u32) -> &[u32] {
        self.ancestors
            .get(index as usize)
            .map(|s| &s[..])
            .unwrap_or(&[])
    }

    pub fn descendants_of(&self, index: u32) -> &[u32] {
        self.descendants
            .get(index as usize)
            .map(|s| &s[..])
            .unwrap_or(&[])
    }

    pub(crate) fn ancestors(&self) -> &[Box<[u32]>] {
        &self.ancestors
    }

    pub(crate) fn descendants(&self) -> &[Box<[u32]>] {
        &self.descendants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EdgeId;
    use crate::edges::Edge;

    fn registries(ids: &[u64], edges: &[(&str, u64, &[u64])]) -> (NodeRegistry, EdgeRegistry) {
        let mut nodes = NodeRegistry::new();
        for &id in ids {
            nodes.insert(id);
        }
        let mut registry = EdgeRegistry::new();
        for &(id, source, destinations) in edges {
            registry.insert(
                EdgeId::from(id),
                Edge::new(source, destinations.iter().copied()).unwrap(),
            );
        }
        (nodes, registry)
    }

    #[test]
    fn arrays_are_sized_by_degree() {
        let (nodes, edges) = registries(
            &[1, 2, 3, 4],
            &[("a", 1, &[2, 3]), ("b", 4, &[2]), ("c", 2, &[3])],
        );
        let (adj, invalid) = Adjacency::build(&nodes, &edges);
        assert!(invalid.is_empty());
        assert_eq!(adj.node_count(), 4);

        let idx = |id| nodes.index_of(id).unwrap();
        assert_eq!(adj.ancestors_of(idx(1)).len(), 2);
        assert_eq!(adj.ancestors_of(idx(3)).len(), 0);
        assert_eq!(adj.descendants_of(idx(2)).len(), 2);
        assert_eq!(adj.descendants_of(idx(3)).len(), 2);
        assert!(adj.descendants_of(idx(2)).contains(&idx(4)));
        assert!(adj.ancestors_of(idx(2)).contains(&idx(3)));
    }

    #[test]
    fn dangling_destination_is_reported_and_skipped() {
        let (nodes, edges) = registries(&[1], &[("r", 1, &[99])]);
        let (adj, invalid) = Adjacency::build(&nodes, &edges);
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].missing, MissingConcept::Destination);
        assert_eq!(invalid[0].destination_id, 99);
        assert!(adj.ancestors_of(0).is_empty());
    }

    #[test]
    fn both_sides_missing_yields_two_records() {
        let (nodes, edges) = registries(&[1], &[("r", 5, &[6])]);
        let (_, invalid) = Adjacency::build(&nodes, &edges);
        let sides: Vec<_> = invalid.iter().map(|r| r.missing).collect();
        assert_eq!(sides, vec![MissingConcept::Source, MissingConcept::Destination]);
    }

    #[test]
    fn one_bad_destination_keeps_the_good_ones() {
        let (nodes, edges) = registries(&[1, 2], &[("ax", 1, &[2, 77])]);
        let (adj, invalid) = Adjacency::build(&nodes, &edges);
        assert_eq!(invalid.len(), 1);
        assert_eq!(adj.ancestors_of(0), &[1]);
        assert_eq!(adj.descendants_of(1), &[0]);
    }

    #[test]
    fn out_of_range_lookup_is_empty() {
        let adj = Adjacency::default();
        assert!(adj.ancestors_of(3).is_empty());
        assert!(adj.descendants_of(3).is_empty());
    }
}
