/// Taxonomy Engine — Engine
///
/// A taxonomy graph plus strict envelope sequencing. Delegates mutation to
/// transitions; `update()` stays an explicit, once-per-commit step.
///
/// Strict sequence enforcement, schema-version validation.

use crate::domain::{BuildStatus, TaxonomyKind};
use crate::error::{Result, TaxonomyError};
use crate::events::{EventEnvelope, SCHEMA_VERSION};
use crate::graph::{GraphConfig, TaxonomyGraph};
use crate::transitions::{apply_change, Mutation};

/// Stateful engine wrapping the pure event → mutation mapping.
#[derive(Debug, Clone)]
pub struct TaxonomyEngine {
    kind: TaxonomyKind,
    graph: TaxonomyGraph,
    last_sequence: u64,
}

impl TaxonomyEngine {
    /// Create an engine over an empty graph.
    pub fn new(kind: TaxonomyKind, config: GraphConfig) -> Self {
        Self::from_graph(kind, TaxonomyGraph::with_config(config), 0)
    }

    /// Resume from an existing graph whose last applied envelope was
    /// `last_sequence`.
    pub fn from_graph(kind: TaxonomyKind, graph: TaxonomyGraph, last_sequence: u64) -> Self {
        Self {
            kind,
            graph,
            last_sequence,
        }
    }

    pub fn kind(&self) -> TaxonomyKind {
        self.kind
    }

    pub fn graph(&self) -> &TaxonomyGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut TaxonomyGraph {
        &mut self.graph
    }

    pub fn into_graph(self) -> TaxonomyGraph {
        self.graph
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Apply a single envelope:
    ///   1. Validate schema version (must be 1)
    ///   2. Validate sequence (strictly increasing, no gaps)
    ///   3. Delegate to transitions::apply_change
    pub fn apply_event(&mut self, envelope: &EventEnvelope) -> Result<Mutation> {
        if envelope.schema_version != SCHEMA_VERSION {
            return Err(TaxonomyError::SchemaVersion {
                expected: SCHEMA_VERSION,
                actual: envelope.schema_version,
            });
        }

        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(TaxonomyError::SequenceViolation {
                expected,
                actual: envelope.sequence,
            });
        }

        let mutation = apply_change(&mut self.graph, self.kind, &envelope.event);
        self.last_sequence = envelope.sequence;
        Ok(mutation)
    }

    /// Apply an ordered batch, stopping at the first rejected envelope.
    pub fn apply_sequence(&mut self, envelopes: &[EventEnvelope]) -> Result<Vec<Mutation>> {
        envelopes.iter().map(|e| self.apply_event(e)).collect()
    }

    /// Rebuild adjacency for everything applied so far.
    pub fn update(&mut self) -> BuildStatus {
        self.graph.update()
    }

    /// Event-sourced reconstruction: reset, replay, update.
    pub fn replay(&mut self, envelopes: &[EventEnvelope]) -> Result<BuildStatus> {
        self.graph = TaxonomyGraph::with_config(self.graph.config());
        self.last_sequence = 0;
        self.apply_sequence(envelopes)?;
        Ok(self.update())
    }
}
