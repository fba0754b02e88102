//! Snapshot Codec — deterministic graph encoder/decoder.
//!
//! Pure codec layer. No side-effects, no timestamps, no envelope.
//!
//! - `encode_snapshot`:  graph → canonical JSON string
//! - `decode_snapshot`:  JSON string → `GraphSnapshot` (strict, no defaults)
//! - `restore_snapshot`: decode + rebuild + invariant validation
//! - `export_snapshot_to_file` / `import_snapshot_from_file`: file I/O
//! - `snapshot_hash`:    SHA-256 of canonical JSON (lowercase hex)
//!
//! The encoded form is byte-identical to `hashing::canonical_serialize`,
//! so a snapshot hash and a replay hash of the same graph agree.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

use taxonomy_engine::invariants::validate_invariants;
use taxonomy_engine::{ConceptId, EdgeId, GraphConfig, TaxonomyGraph, ENGINE_VERSION};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// All possible snapshot codec failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("SerializationError: {0}")]
    SerializationError(String),
    /// Malformed JSON, missing or unknown fields, unsupported version.
    #[error("DeserializationError: {0}")]
    DeserializationError(String),
    /// Restored graph violates structural invariants.
    #[error("InvariantViolation: {0}")]
    InvariantViolation(String),
    #[error("IoError: {0}")]
    IoError(String),
}

impl From<io::Error> for SnapshotError {
    fn from(err: io::Error) -> Self {
        SnapshotError::IoError(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphSnapshot {
    pub engine_version: u32,
    pub nodes: Vec<ConceptId>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub source: ConceptId,
    pub destinations: Vec<ConceptId>,
}

impl GraphSnapshot {
    /// Capture registries in canonical order.
    pub fn from_graph(graph: &TaxonomyGraph) -> Self {
        let mut nodes: Vec<ConceptId> = graph.node_ids().collect();
        nodes.sort_unstable();
        let edges = graph
            .edges()
            .iter()
            .map(|(id, edge)| EdgeRecord {
                id: id.clone(),
                source: edge.source(),
                destinations: edge.destinations().to_vec(),
            })
            .collect();
        Self {
            engine_version: ENGINE_VERSION,
            nodes,
            edges,
        }
    }

    /// Rebuild a graph from the registries and run `update()`.
    pub fn into_graph(self, config: GraphConfig) -> TaxonomyGraph {
        let mut graph = TaxonomyGraph::with_capacity(config, self.nodes.len());
        for id in self.nodes {
            graph.add_node(id);
        }
        for record in self.edges {
            graph.add_edge(record.id, record.source, record.destinations);
        }
        let status = graph.update();
        if !status.is_ok() {
            warn!(
                invalid = status.invalid_relationships.len(),
                "restored snapshot carries dangling relationships"
            );
        }
        graph
    }
}

// ---------------------------------------------------------------------------
// Encoder / decoder
// ---------------------------------------------------------------------------

pub fn encode_snapshot(graph: &TaxonomyGraph) -> Result<String, SnapshotError> {
    serde_json::to_string(&GraphSnapshot::from_graph(graph))
        .map_err(|e| SnapshotError::SerializationError(e.to_string()))
}

/// Strict decode. No invariant validation; use `restore_snapshot`
/// for validated loading.
pub fn decode_snapshot(json: &str) -> Result<GraphSnapshot, SnapshotError> {
    let snapshot = serde_json::from_str::<GraphSnapshot>(json)
        .map_err(|e| SnapshotError::DeserializationError(e.to_string()))?;
    if snapshot.engine_version != ENGINE_VERSION {
        return Err(SnapshotError::DeserializationError(format!(
            "unsupported engine_version {} (expected {})",
            snapshot.engine_version, ENGINE_VERSION
        )));
    }
    if let Some(record) = snapshot.edges.iter().find(|r| r.destinations.is_empty()) {
        return Err(SnapshotError::DeserializationError(format!(
            "edge {} has no destinations",
            record.id
        )));
    }
    Ok(snapshot)
}

// ---------------------------------------------------------------------------
// Restore (decode + build + validate)
// ---------------------------------------------------------------------------

/// The safe entry point for loading a graph from untrusted JSON.
pub fn restore_snapshot(json: &str, config: GraphConfig) -> Result<TaxonomyGraph, SnapshotError> {
    let graph = decode_snapshot(json)?.into_graph(config);
    validate_invariants(&graph).map_err(SnapshotError::InvariantViolation)?;
    Ok(graph)
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Creates parent directories if needed. Byte-for-byte identical across
/// identical graphs.
pub fn export_snapshot_to_file(graph: &TaxonomyGraph, path: &Path) -> Result<(), SnapshotError> {
    let json = encode_snapshot(graph)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json.as_bytes())?;
    Ok(())
}

pub fn import_snapshot_from_file(
    path: &Path,
    config: GraphConfig,
) -> Result<TaxonomyGraph, SnapshotError> {
    let content = fs::read_to_string(path)?;
    restore_snapshot(&content, config)
}

// ---------------------------------------------------------------------------
// Hash
// ---------------------------------------------------------------------------

/// SHA-256 of the encoded snapshot, lowercase hex.
pub fn snapshot_hash(graph: &TaxonomyGraph) -> Result<String, SnapshotError> {
    let json = encode_snapshot(graph)?;
    let digest = Sha256::digest(json.as_bytes());
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
