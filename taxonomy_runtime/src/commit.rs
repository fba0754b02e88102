//! Commit pipeline — batched change events in, validated taxonomy out.
//!
//! Each pipeline gets its own directory with an event log and snapshots:
//!   <data_dir>/<name>/events.log
//!   <data_dir>/<name>/snapshots/
//!
//! Apply-before-persist order per commit:
//!   1. apply the batch to a clone of the committed graph
//!   2. re-scan relationships of concepts activated by the batch
//!   3. `update()` once, reject cycles introduced by the batch
//!   4. diff against the committed graph, collect affected concepts
//!   5. append the batch to the log (only if 1–4 succeeded)
//!   6. snapshot if an interval boundary was crossed, promote the graph
//!
//! Concurrency: `SharedPipeline` serialises commits behind a Mutex.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use taxonomy_engine::hashing::canonical_hash;
use taxonomy_engine::{
    BuildStatus, ChangeEvent, ConceptId, EdgeDiff, EventEnvelope, GraphConfig, TaxonomyDelta,
    TaxonomyEngine, TaxonomyError, TaxonomyGraph, TaxonomyKind,
};

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::event_store::EventStore;
use crate::replay;
use crate::snapshot;

// ---------------------------------------------------------------------------
// Relationship source
// ---------------------------------------------------------------------------

/// Lookup of the current relationship state of a concept.
///
/// When a concept comes back into the taxonomy its relationships may have
/// been dropped while it was inactive. The pipeline asks the source for
/// them and commits whatever it returns alongside the batch.
pub trait RelationshipSource {
    /// Relationship and axiom-member events whose source is `concept_id`.
    fn relationships_of(&self, concept_id: ConceptId) -> Vec<ChangeEvent>;
}

/// Disables the reactivation re-scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelationshipSource;

impl RelationshipSource for NoRelationshipSource {
    fn relationships_of(&self, _concept_id: ConceptId) -> Vec<ChangeEvent> {
        Vec::new()
    }
}

impl<F> RelationshipSource for F
where
    F: Fn(ConceptId) -> Vec<ChangeEvent>,
{
    fn relationships_of(&self, concept_id: ConceptId) -> Vec<ChangeEvent> {
        self(concept_id)
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What a successful commit did.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// Sequence range written, `None` for an empty batch.
    pub sequences: Option<(u64, u64)>,
    pub status: BuildStatus,
    pub diff: EdgeDiff,
    pub affected: BTreeSet<ConceptId>,
    /// Events added by the reactivation re-scan.
    pub rescanned: usize,
    pub hash: String,
    pub snapshot: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct CommitPipeline<S = NoRelationshipSource> {
    name: String,
    dir: PathBuf,
    kind: TaxonomyKind,
    config: GraphConfig,
    committed: TaxonomyGraph,
    store: EventStore,
    source: S,
    snapshot_interval: u64,
    logical_time: u64,
}

impl<S: RelationshipSource> CommitPipeline<S> {
    /// Open (or create) the pipeline `name` under `config.data_dir` and
    /// rebuild its committed graph from the latest verified snapshot plus
    /// the log tail, or from the full log.
    pub fn open(config: &RuntimeConfig, name: &str, source: S) -> Result<Self> {
        let dir = config.data_dir.join(name);
        let store = EventStore::open(&dir.join("events.log"))?;
        let events = store.load_all()?;
        let graph_config = config.graph_config();

        let committed = match Self::restore_latest(&dir, config.taxonomy, graph_config, &events)? {
            Some(graph) => graph,
            None => replay::rebuild_graph(config.taxonomy, graph_config, &events)?.0,
        };

        info!(
            pipeline = name,
            kind = %config.taxonomy,
            events = events.len(),
            nodes = committed.node_count(),
            edges = committed.edge_count(),
            "pipeline opened"
        );

        Ok(Self {
            name: name.to_string(),
            dir,
            kind: config.taxonomy,
            config: graph_config,
            committed,
            store,
            source,
            snapshot_interval: config.snapshot_interval,
            logical_time: events.last().map(|e| e.logical_time).unwrap_or(0),
        })
    }

    /// Latest snapshot whose hash verifies, plus the log tail after it.
    /// `None` means full replay.
    fn restore_latest(
        dir: &Path,
        kind: TaxonomyKind,
        config: GraphConfig,
        events: &[EventEnvelope],
    ) -> Result<Option<TaxonomyGraph>> {
        let snap = match snapshot::load_latest_snapshot(&dir.join("snapshots")) {
            Ok(Some(snap)) => snap,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(error = %e, "unreadable snapshot, replaying in full");
                return Ok(None);
            }
        };
        let log_end = events.last().map(|e| e.sequence).unwrap_or(0);
        if snap.sequence > log_end || !snapshot::verify_snapshot_hash(&snap) {
            warn!(sequence = snap.sequence, "snapshot does not match log, replaying in full");
            return Ok(None);
        }
        let graph = match snap.restore(config) {
            Ok(graph) => graph,
            Err(e) => {
                warn!(sequence = snap.sequence, error = %e, "snapshot restore failed, replaying in full");
                return Ok(None);
            }
        };
        let (graph, _) = replay::replay_tail(kind, graph, snap.sequence, events)?;
        debug!(from = snap.sequence, "restored from snapshot");
        Ok(Some(graph))
    }

    /// Commit one batch of changes.
    ///
    /// On any error the committed graph, the log and the sequence are left
    /// exactly as they were.
    pub fn commit(&mut self, changes: Vec<ChangeEvent>) -> Result<CommitOutcome> {
        let first_sequence = self.store.last_sequence() + 1;
        let logical_time = self.logical_time + 1;
        let mut engine =
            TaxonomyEngine::from_graph(self.kind, self.committed.clone(), self.store.last_sequence());
        let mut envelopes = Vec::with_capacity(changes.len());

        let mut activated = BTreeSet::new();
        for change in changes {
            if let ChangeEvent::ConceptChanged {
                concept_id,
                active: true,
            } = change
            {
                if !self.committed.contains_node(concept_id) {
                    activated.insert(concept_id);
                }
            }
            Self::apply(&mut engine, &mut envelopes, logical_time, change)?;
        }

        let mut rescanned = 0;
        for &concept in &activated {
            if !engine.graph().contains_node(concept) {
                continue;
            }
            for change in self.source.relationships_of(concept) {
                if change.source_concept() != Some(concept) {
                    continue;
                }
                Self::apply(&mut engine, &mut envelopes, logical_time, change)?;
                rescanned += 1;
            }
        }

        let status = engine.update();
        let old = std::mem::take(&mut self.committed);
        let delta = TaxonomyDelta::new(old, engine.into_graph());

        let affected = match Self::evaluate(&delta, &activated) {
            Ok(affected) => affected,
            Err(e) => {
                self.committed = delta.into_parts().0;
                return Err(e);
            }
        };
        if let Err(e) = self.store.append(&envelopes) {
            self.committed = delta.into_parts().0;
            return Err(e);
        }

        let (_, new, diff) = delta.into_parts();
        self.committed = new;

        let sequences = envelopes
            .last()
            .map(|last| (first_sequence, last.sequence));
        let snapshot = match sequences {
            Some((first, last)) => {
                self.logical_time = logical_time;
                self.snapshot_if_due(first, last)
            }
            None => None,
        };

        let hash = canonical_hash(&self.committed);
        debug!(
            pipeline = %self.name,
            events = envelopes.len(),
            rescanned,
            added = diff.added.len(),
            changed = diff.changed.len(),
            removed = diff.removed.len(),
            affected = affected.len(),
            "commit applied"
        );

        Ok(CommitOutcome {
            sequences,
            status,
            diff,
            affected,
            rescanned,
            hash,
            snapshot,
        })
    }

    fn apply(
        engine: &mut TaxonomyEngine,
        envelopes: &mut Vec<EventEnvelope>,
        logical_time: u64,
        change: ChangeEvent,
    ) -> Result<()> {
        let envelope = EventEnvelope::new(engine.last_sequence() + 1, logical_time, change);
        engine.apply_event(&envelope)?;
        envelopes.push(envelope);
        Ok(())
    }

    /// Reject cycles reachable from anything the batch touched, then
    /// collect the affected concepts.
    fn evaluate(
        delta: &TaxonomyDelta,
        activated: &BTreeSet<ConceptId>,
    ) -> Result<BTreeSet<ConceptId>> {
        let candidate = delta.new_graph();
        if candidate.check_cycles() {
            let mut touched: BTreeSet<ConceptId> = activated.clone();
            for edge_id in delta.added_edges().iter().chain(delta.changed_edges()) {
                touched.insert(candidate.source_of(edge_id)?);
            }
            for concept in touched {
                if !candidate.contains_node(concept) {
                    continue;
                }
                match candidate.all_ancestors(concept) {
                    Ok(_) => {}
                    Err(e @ TaxonomyError::CycleDetected(_)) => {
                        warn!(concept, "commit rejected: IS-A cycle");
                        return Err(RuntimeError::CommitRejected(e));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(delta.affected_concepts()?)
    }

    fn snapshot_if_due(&self, first: u64, last: u64) -> Option<PathBuf> {
        let interval = self.snapshot_interval;
        if interval == 0 || (first - 1) / interval == last / interval {
            return None;
        }
        match snapshot::save_snapshot(&self.dir.join("snapshots"), last, &self.committed) {
            Ok(path) => Some(path),
            Err(e) => {
                // The log already holds the batch; a missing snapshot only
                // costs replay time.
                warn!(sequence = last, error = %e, "snapshot save failed");
                None
            }
        }
    }

    /// Rebuild from the full log, ignoring snapshots.
    pub fn replay_full(&self) -> Result<(TaxonomyGraph, String)> {
        let events = self.store.load_all()?;
        let (graph, _, hash) = replay::rebuild_graph(self.kind, self.config, &events)?;
        Ok((graph, hash))
    }

    pub fn graph(&self) -> &TaxonomyGraph {
        &self.committed
    }

    pub fn current_hash(&self) -> String {
        canonical_hash(&self.committed)
    }

    pub fn last_sequence(&self) -> u64 {
        self.store.last_sequence()
    }

    pub fn kind(&self) -> TaxonomyKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// ---------------------------------------------------------------------------
// Shared handle
// ---------------------------------------------------------------------------

/// Thread-safe pipeline handle.
pub struct SharedPipeline<S = NoRelationshipSource> {
    inner: Mutex<CommitPipeline<S>>,
}

impl<S: RelationshipSource> SharedPipeline<S> {
    pub fn new(pipeline: CommitPipeline<S>) -> Self {
        Self {
            inner: Mutex::new(pipeline),
        }
    }

    pub fn commit(&self, changes: Vec<ChangeEvent>) -> Result<CommitOutcome> {
        let mut pipeline = self.inner.lock().map_err(|_| RuntimeError::LockPoisoned)?;
        pipeline.commit(changes)
    }

    /// Run a read-only query against the committed graph under the lock.
    pub fn with_graph<R>(&self, f: impl FnOnce(&TaxonomyGraph) -> R) -> Result<R> {
        let pipeline = self.inner.lock().map_err(|_| RuntimeError::LockPoisoned)?;
        Ok(f(pipeline.graph()))
    }

    pub fn current_hash(&self) -> Result<String> {
        self.with_graph(canonical_hash)
    }

    pub fn last_sequence(&self) -> Result<u64> {
        let pipeline = self.inner.lock().map_err(|_| RuntimeError::LockPoisoned)?;
        Ok(pipeline.last_sequence())
    }

    pub fn into_inner(self) -> Result<CommitPipeline<S>> {
        self.inner.into_inner().map_err(|_| RuntimeError::LockPoisoned)
    }
}
