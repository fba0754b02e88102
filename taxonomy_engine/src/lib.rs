#![forbid(unsafe_code)]

/// Engine v1. Bumping this changes every canonical hash.
pub const ENGINE_VERSION: u32 = 1;

pub mod domain;
pub mod error;
pub mod nodes;
pub mod edges;
pub mod adjacency;
pub mod closure;
pub mod graph;
pub mod diff;
pub mod events;
pub mod transitions;
pub mod invariants;
pub mod hashing;
pub mod engine;

pub use domain::{
    BuildStatus, CharacteristicType, ConceptId, EdgeId, InvalidRelationship, MissingConcept,
    Severity, TaxonomyKind, IS_A,
};
pub use diff::{diff, EdgeDiff, TaxonomyDelta};
pub use engine::TaxonomyEngine;
pub use error::{Result, TaxonomyError};
pub use events::{ChangeEvent, EventEnvelope, SCHEMA_VERSION};
pub use graph::{GraphConfig, Parentage, TaxonomyGraph};
pub use transitions::Mutation;
