//! Drift detection — determinism verification and graph comparison.

use std::collections::BTreeSet;

use serde::Serialize;

use taxonomy_engine::{diff, ConceptId, EdgeDiff, EventEnvelope, GraphConfig, TaxonomyGraph, TaxonomyKind};

use crate::error::{Result, RuntimeError};
use crate::replay;

/// Replay the same events twice and require identical hashes.
/// Returns the agreed hash.
pub fn verify_determinism(
    kind: TaxonomyKind,
    config: GraphConfig,
    events: &[EventEnvelope],
) -> Result<String> {
    let first = replay::rebuild_hash(kind, config, events)?;
    let second = replay::rebuild_hash(kind, config, events)?;

    if first != second {
        return Err(RuntimeError::DeterminismFailure { first, second });
    }
    Ok(first)
}

/// Structured comparison of two graphs (`a` is the baseline).
pub fn compare_graphs(a: &TaxonomyGraph, b: &TaxonomyGraph) -> DriftReport {
    let nodes_a: BTreeSet<ConceptId> = a.node_ids().collect();
    let nodes_b: BTreeSet<ConceptId> = b.node_ids().collect();

    DriftReport {
        node_count_a: nodes_a.len() as i64,
        node_count_b: nodes_b.len() as i64,
        node_count_delta: nodes_b.len() as i64 - nodes_a.len() as i64,
        edge_count_a: a.edge_count() as i64,
        edge_count_b: b.edge_count() as i64,
        edge_count_delta: b.edge_count() as i64 - a.edge_count() as i64,
        added_concepts: nodes_b.difference(&nodes_a).copied().collect(),
        removed_concepts: nodes_a.difference(&nodes_b).copied().collect(),
        edges: diff(a, b),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub node_count_a: i64,
    pub node_count_b: i64,
    pub node_count_delta: i64,
    pub edge_count_a: i64,
    pub edge_count_b: i64,
    pub edge_count_delta: i64,
    pub added_concepts: Vec<ConceptId>,
    pub removed_concepts: Vec<ConceptId>,
    pub edges: EdgeDiff,
}

impl DriftReport {
    /// No node or edge differences at all.
    pub fn is_clean(&self) -> bool {
        self.added_concepts.is_empty() && self.removed_concepts.is_empty() && self.edges.is_empty()
    }
}
