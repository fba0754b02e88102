/// Taxonomy Engine — Taxonomy Graph
///
/// Node + edge registries, derived adjacency, dirty flag.
///
/// Lifecycle per commit: mutate → `update()` → query. Every mutation marks
/// the graph dirty; every closure query fails with `TaxonomyError::Dirty`
/// until the next `update()`.

use std::collections::BTreeSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::adjacency::Adjacency;
use crate::closure::{longest_path, Direction, Traversal, Walk};
use crate::domain::{BuildStatus, ConceptId, EdgeId};
use crate::edges::{Edge, EdgeRegistry};
use crate::error::{Result, TaxonomyError};
use crate::nodes::NodeRegistry;

/// Graph-level settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Raise `CycleDetected` when a closure query reaches its own origin.
    /// Disabled only for intentionally relaxed or partial imports.
    pub check_cycles: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { check_cycles: true }
    }
}

/// Direct parents and indirect ancestors of one concept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Parentage {
    pub parents: BTreeSet<ConceptId>,
    pub ancestors: BTreeSet<ConceptId>,
}

#[derive(Debug, Clone)]
pub struct TaxonomyGraph {
    nodes: NodeRegistry,
    edges: EdgeRegistry,
    adjacency: Adjacency,
    dirty: bool,
    check_cycles: bool,
}

impl Default for TaxonomyGraph {
    fn default() -> Self {
        Self::with_config(GraphConfig::default())
    }
}

impl TaxonomyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            nodes: NodeRegistry::new(),
            edges: EdgeRegistry::new(),
            adjacency: Adjacency::default(),
            dirty: false,
            check_cycles: config.check_cycles,
        }
    }

    pub fn with_capacity(config: GraphConfig, nodes: usize) -> Self {
        Self {
            nodes: NodeRegistry::with_capacity(nodes),
            ..Self::with_config(config)
        }
    }

    pub fn config(&self) -> GraphConfig {
        GraphConfig {
            check_cycles: self.check_cycles,
        }
    }

    pub fn check_cycles(&self) -> bool {
        self.check_cycles
    }

    pub fn set_check_cycles(&mut self, check_cycles: bool) {
        self.check_cycles = check_cycles;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ── Mutations ──────────────────────────────────────────────────

    pub fn add_node(&mut self, id: ConceptId) {
        if self.nodes.insert(id) {
            trace!(concept = id, "node added");
        }
        self.dirty = true;
    }

    /// Returns false if the concept was not registered.
    pub fn remove_node(&mut self, id: ConceptId) -> bool {
        self.dirty = true;
        let removed = self.nodes.remove(id);
        if removed {
            trace!(concept = id, "node removed");
        }
        removed
    }

    /// Insert or replace an edge.
    ///
    /// An empty destination list means "no edge": any existing edge with
    /// this id is removed instead.
    pub fn add_edge(
        &mut self,
        edge_id: impl Into<EdgeId>,
        source: ConceptId,
        destinations: impl IntoIterator<Item = ConceptId>,
    ) {
        let edge_id = edge_id.into();
        self.dirty = true;
        match Edge::new(source, destinations) {
            Some(edge) => {
                trace!(edge = %edge_id, source, "edge added");
                self.edges.insert(edge_id, edge);
            }
            None => {
                trace!(edge = %edge_id, source, "edge without destinations, removing");
                self.edges.remove(&edge_id);
            }
        }
    }

    /// Returns false if no edge with this id existed.
    pub fn remove_edge(&mut self, edge_id: &EdgeId) -> bool {
        self.dirty = true;
        self.edges.remove(edge_id).is_some()
    }

    /// Drop all nodes, edges and derived state.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.adjacency = Adjacency::default();
        self.dirty = true;
    }

    // ── Registry lookups (valid in any state) ──────────────────────

    pub fn contains_node(&self, id: ConceptId) -> bool {
        self.nodes.contains(id)
    }

    pub fn contains_edge(&self, edge_id: &EdgeId) -> bool {
        self.edges.contains(edge_id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.nodes.iter()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = &EdgeId> + '_ {
        self.edges.ids()
    }

    pub fn edge(&self, edge_id: &EdgeId) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    pub fn edges(&self) -> &EdgeRegistry {
        &self.edges
    }

    pub fn source_of(&self, edge_id: &EdgeId) -> Result<ConceptId> {
        self.edges
            .get(edge_id)
            .map(Edge::source)
            .ok_or_else(|| TaxonomyError::EdgeNotFound(edge_id.clone()))
    }

    pub fn destinations_of(&self, edge_id: &EdgeId) -> Result<&[ConceptId]> {
        self.edges
            .get(edge_id)
            .map(Edge::destinations)
            .ok_or_else(|| TaxonomyError::EdgeNotFound(edge_id.clone()))
    }

    /// Internal index of a concept. Callers that expect absence should
    /// check `contains_node` first.
    pub fn internal_index_of(&self, id: ConceptId) -> Result<u32> {
        self.nodes
            .index_of(id)
            .ok_or(TaxonomyError::ConceptNotFound(id))
    }

    pub fn id_of(&self, index: u32) -> Result<ConceptId> {
        self.nodes.id_at(index).ok_or(TaxonomyError::IndexOutOfRange {
            index,
            count: self.nodes.len(),
        })
    }

    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    // ── Build ──────────────────────────────────────────────────────

    /// Rebuild the adjacency arrays from the registries and clear the
    /// dirty flag. Dangling edges are omitted and reported.
    pub fn update(&mut self) -> BuildStatus {
        let started = Instant::now();
        let (adjacency, invalid) = Adjacency::build(&self.nodes, &self.edges);
        self.adjacency = adjacency;
        self.dirty = false;

        if !invalid.is_empty() {
            warn!(
                invalid = invalid.len(),
                "Missing concepts from relationships"
            );
        }
        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "taxonomy adjacency rebuilt"
        );
        BuildStatus::from_invalid(invalid)
    }

    // ── Closure queries ────────────────────────────────────────────

    fn check_state(&self) -> Result<()> {
        if self.dirty {
            return Err(TaxonomyError::Dirty);
        }
        Ok(())
    }

    /// Resolve a query origin against a clean graph.
    fn origin(&self, id: ConceptId) -> Result<u32> {
        self.check_state()?;
        self.internal_index_of(id)
    }

    /// Map internal indices back to ids, rejecting the origin itself when
    /// cycle checking is on.
    fn to_ids(&self, origin: ConceptId, indices: &[u32]) -> Result<BTreeSet<ConceptId>> {
        let mut ids = BTreeSet::new();
        for &index in indices {
            let id = self.id_of(index)?;
            if id == origin && self.check_cycles {
                return Err(TaxonomyError::CycleDetected(origin));
            }
            ids.insert(id);
        }
        Ok(ids)
    }

    fn traversal(&self, index: u32, direction: Direction) -> Traversal<'_> {
        let traversal = Traversal::new(&self.adjacency, direction);
        if self.check_cycles {
            traversal.guard(index)
        } else {
            traversal
        }
    }

    fn closure(&self, id: ConceptId, direction: Direction) -> Result<BTreeSet<ConceptId>> {
        let index = self.origin(id)?;
        let mut traversal = self.traversal(index, direction);
        if traversal.walk_from(index) == Walk::ReachedOrigin {
            return Err(TaxonomyError::CycleDetected(id));
        }
        self.to_ids(id, &traversal.into_indices())
    }

    pub fn direct_ancestors(&self, id: ConceptId) -> Result<BTreeSet<ConceptId>> {
        let index = self.origin(id)?;
        self.to_ids(id, self.adjacency.ancestors_of(index))
    }

    pub fn direct_descendants(&self, id: ConceptId) -> Result<BTreeSet<ConceptId>> {
        let index = self.origin(id)?;
        self.to_ids(id, self.adjacency.descendants_of(index))
    }

    pub fn all_ancestors(&self, id: ConceptId) -> Result<BTreeSet<ConceptId>> {
        self.closure(id, Direction::Ancestors)
    }

    pub fn all_descendants(&self, id: ConceptId) -> Result<BTreeSet<ConceptId>> {
        self.closure(id, Direction::Descendants)
    }

    /// Ancestors of the direct parents, excluding the direct parents
    /// themselves unless they are also reachable indirectly.
    pub fn all_indirect_ancestors(&self, id: ConceptId) -> Result<BTreeSet<ConceptId>> {
        let index = self.origin(id)?;
        let mut traversal = self.traversal(index, Direction::Ancestors);
        for &parent in self.adjacency.ancestors_of(index) {
            if parent == index && self.check_cycles {
                return Err(TaxonomyError::CycleDetected(id));
            }
            if traversal.walk_from(parent) == Walk::ReachedOrigin {
                return Err(TaxonomyError::CycleDetected(id));
            }
        }
        self.to_ids(id, &traversal.into_indices())
    }

    pub fn self_and_all_ancestors(&self, id: ConceptId) -> Result<BTreeSet<ConceptId>> {
        let mut ids = self.all_ancestors(id)?;
        ids.insert(id);
        Ok(ids)
    }

    pub fn is_leaf(&self, id: ConceptId) -> Result<bool> {
        let index = self.origin(id)?;
        Ok(self.adjacency.descendants_of(index).is_empty())
    }

    pub fn parentage(&self, id: ConceptId) -> Result<Parentage> {
        Ok(Parentage {
            parents: self.direct_ancestors(id)?,
            ancestors: self.all_indirect_ancestors(id)?,
        })
    }

    /// Longest IS-A path (in edges) up to a top-level concept.
    pub fn depth(&self, id: ConceptId) -> Result<usize> {
        if self.check_cycles {
            self.all_ancestors(id)?;
        }
        let index = self.origin(id)?;
        Ok(longest_path(&self.adjacency, index, Direction::Ancestors))
    }

    /// Longest IS-A path (in edges) down to a leaf.
    pub fn height(&self, id: ConceptId) -> Result<usize> {
        if self.check_cycles {
            self.all_descendants(id)?;
        }
        let index = self.origin(id)?;
        Ok(longest_path(&self.adjacency, index, Direction::Descendants))
    }
}
