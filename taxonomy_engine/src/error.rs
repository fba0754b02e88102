//! Error types for the taxonomy engine.

use crate::domain::{ConceptId, EdgeId};

/// Result type alias for taxonomy operations.
pub type Result<T> = std::result::Result<T, TaxonomyError>;

/// State, lookup and integrity failures raised by the engine.
///
/// Dangling edges are not errors; they are reported through `BuildStatus`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaxonomyError {
    /// A query was issued between a mutation and the next `update()`.
    #[error("Taxonomy graph is in dirty state; call update() before querying")]
    Dirty,

    #[error("Concept does not exist with ID: {0}")]
    ConceptNotFound(ConceptId),

    #[error("Internal index {index} is out of range for {count} concepts")]
    IndexOutOfRange { index: u32, count: usize },

    #[error("Edge does not exist with ID: {0}")]
    EdgeNotFound(EdgeId),

    /// The queried concept was reached from itself.
    #[error("Concept {0} would introduce a cycle in the IS-A graph (loop)")]
    CycleDetected(ConceptId),

    #[error("Sequence violation: expected {expected}, got {actual}")]
    SequenceViolation { expected: u64, actual: u64 },

    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    SchemaVersion { expected: u32, actual: u32 },
}

impl TaxonomyError {
    pub fn is_cycle(&self) -> bool {
        matches!(self, TaxonomyError::CycleDetected(_))
    }
}
