//! Replay orchestrator — rebuild a taxonomy from its event log.
//!
//! Delegates all graph logic to the engine. No shortcuts, no cached state.

use taxonomy_engine::hashing::canonical_hash;
use taxonomy_engine::{
    BuildStatus, EventEnvelope, GraphConfig, TaxonomyEngine, TaxonomyGraph, TaxonomyKind,
};
use tracing::debug;

use crate::error::Result;

/// Rebuild a graph from a full event sequence.
///
/// 1. Create a fresh engine
/// 2. Apply every envelope in order (strict sequence)
/// 3. Run `update()` once
/// 4. Return (graph, build status, canonical hash)
pub fn rebuild_graph(
    kind: TaxonomyKind,
    config: GraphConfig,
    events: &[EventEnvelope],
) -> Result<(TaxonomyGraph, BuildStatus, String)> {
    let mut engine = TaxonomyEngine::new(kind, config);
    let status = engine.replay(events)?;
    let graph = engine.into_graph();
    let hash = canonical_hash(&graph);
    debug!(
        %kind,
        events = events.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "replay complete"
    );
    Ok((graph, status, hash))
}

/// Continue from a restored graph: apply the envelopes after `last_sequence`.
pub fn replay_tail(
    kind: TaxonomyKind,
    graph: TaxonomyGraph,
    last_sequence: u64,
    events: &[EventEnvelope],
) -> Result<(TaxonomyGraph, BuildStatus)> {
    let mut engine = TaxonomyEngine::from_graph(kind, graph, last_sequence);
    let tail: Vec<&EventEnvelope> = events
        .iter()
        .filter(|e| e.sequence > last_sequence)
        .collect();
    for envelope in &tail {
        engine.apply_event(envelope)?;
    }
    let status = engine.update();
    debug!(%kind, from = last_sequence, events = tail.len(), "tail replay complete");
    Ok((engine.into_graph(), status))
}

/// Rebuild and return only the canonical hash.
pub fn rebuild_hash(kind: TaxonomyKind, config: GraphConfig, events: &[EventEnvelope]) -> Result<String> {
    let (_, _, hash) = rebuild_graph(kind, config, events)?;
    Ok(hash)
}
