//! Snapshot layer — deterministic graph snapshots on disk.
//!
//! Snapshots contain canonical JSON + hash for verification.
//! No timestamps in snapshot content (determinism).
//!
//! If a snapshot's hash does not verify, callers fall back to full replay.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use taxonomy_engine::hashing::{canonical_hash, canonical_serialize, sha256_hex};
use taxonomy_engine::{GraphConfig, TaxonomyGraph, ENGINE_VERSION};

use crate::snapshot_codec::{restore_snapshot, SnapshotError};

/// Snapshot on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Sequence number of the last event folded into this snapshot.
    pub sequence: u64,
    /// Canonical JSON of the graph registries (UTF-8).
    pub canonical_json: String,
    /// SHA-256 of the canonical JSON.
    pub hash: String,
    pub engine_version: u32,
}

impl Snapshot {
    pub fn capture(sequence: u64, graph: &TaxonomyGraph) -> Self {
        Self {
            sequence,
            canonical_json: canonical_serialize(graph),
            hash: canonical_hash(graph),
            engine_version: ENGINE_VERSION,
        }
    }

    /// Rebuild the graph held by this snapshot.
    pub fn restore(&self, config: GraphConfig) -> Result<TaxonomyGraph, SnapshotError> {
        restore_snapshot(&self.canonical_json, config)
    }
}

fn snapshot_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("snapshot_{:06}.json", sequence))
}

/// Save a deterministic snapshot of the graph.
pub fn save_snapshot(dir: &Path, sequence: u64, graph: &TaxonomyGraph) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let snap = Snapshot::capture(sequence, graph);
    let content = serde_json::to_string(&snap)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let path = snapshot_path(dir, sequence);
    let mut file = File::create(&path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    Ok(path)
}

/// Load a snapshot at a specific sequence number.
/// Returns None if no snapshot exists at that sequence.
pub fn load_snapshot(dir: &Path, sequence: u64) -> io::Result<Option<Snapshot>> {
    let path = snapshot_path(dir, sequence);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let snap: Snapshot = serde_json::from_str(&content).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("Bad snapshot: {}", e))
    })?;

    Ok(Some(snap))
}

/// Sequences of all snapshot files in `dir`, ascending.
pub fn list_snapshots(dir: &Path) -> io::Result<Vec<u64>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut sequences = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let seq = name
            .to_str()
            .and_then(|s| s.strip_prefix("snapshot_"))
            .and_then(|s| s.strip_suffix(".json"))
            .and_then(|s| s.parse::<u64>().ok());
        if let Some(seq) = seq {
            sequences.push(seq);
        }
    }
    sequences.sort_unstable();
    Ok(sequences)
}

/// Load the snapshot with the highest sequence.
pub fn load_latest_snapshot(dir: &Path) -> io::Result<Option<Snapshot>> {
    match list_snapshots(dir)?.last() {
        Some(&seq) => load_snapshot(dir, seq),
        None => Ok(None),
    }
}

/// True if the stored hash matches the canonical JSON content.
pub fn verify_snapshot_hash(snap: &Snapshot) -> bool {
    sha256_hex(snap.canonical_json.as_bytes()) == snap.hash
}
