//! Runtime error type.
//!
//! Wraps engine, snapshot and I/O failures behind one enum so the commit
//! pipeline and the CLI can propagate with `?`.

use std::io;

use taxonomy_engine::TaxonomyError;
use thiserror::Error;

use crate::snapshot_codec::SnapshotError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// An event log frame decoded but does not describe a valid event.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The batch would have left the committed taxonomy invalid.
    #[error("Commit rejected: {0}")]
    CommitRejected(#[source] TaxonomyError),

    #[error("Determinism failure: replay produced {first} then {second}")]
    DeterminismFailure { first: String, second: String },

    #[error("Pipeline lock poisoned")]
    LockPoisoned,
}
