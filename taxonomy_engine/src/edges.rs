/// Taxonomy Engine — Edge Registry
///
/// Edge id -> (source, canonical destination set).
/// Destinations are sorted and deduplicated on construction, so two edges
/// with the same source and destination set compare equal regardless of
/// insertion order.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{ConceptId, EdgeId};

/// A subsumption assertion: `source` IS-A every concept in `destinations`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    source: ConceptId,
    destinations: Vec<ConceptId>,
}

impl Edge {
    /// Returns `None` when `destinations` is empty: such an edge is
    /// equivalent to no edge at all.
    pub fn new(
        source: ConceptId,
        destinations: impl IntoIterator<Item = ConceptId>,
    ) -> Option<Self> {
        let mut destinations: Vec<ConceptId> = destinations.into_iter().collect();
        if destinations.is_empty() {
            return None;
        }
        destinations.sort_unstable();
        destinations.dedup();
        Some(Self {
            source,
            destinations,
        })
    }

    /// The common single-destination case (a plain relationship record).
    pub fn single(source: ConceptId, destination: ConceptId) -> Self {
        Self {
            source,
            destinations: vec![destination],
        }
    }

    pub fn source(&self) -> ConceptId {
        self.source
    }

    /// Sorted, unique, never empty.
    pub fn destinations(&self) -> &[ConceptId] {
        &self.destinations
    }

    /// Expanded (source, destination) pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (ConceptId, ConceptId)> + '_ {
        self.destinations.iter().map(move |&d| (self.source, d))
    }
}

/// Edges keyed by id. Iteration is in id order.
#[derive(Debug, Clone, Default)]
pub struct EdgeRegistry {
    edges: BTreeMap<EdgeId, Edge>,
}

impl EdgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. Returns the previous value for `id`, if any.
    pub fn insert(&mut self, id: EdgeId, edge: Edge) -> Option<Edge> {
        self.edges.insert(id, edge)
    }

    pub fn remove(&mut self, id: &EdgeId) -> Option<Edge> {
        self.edges.remove(id)
    }

    pub fn get(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn contains(&self, id: &EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &EdgeId> + '_ {
        self.edges.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EdgeId, &Edge)> + '_ {
        self.edges.iter()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of expanded (source, destination) pairs.
    pub fn pair_count(&self) -> usize {
        self.edges.values().map(|e| e.destinations.len()).sum()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }
}
