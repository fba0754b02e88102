#![forbid(unsafe_code)]

//! Taxonomy runtime.
//!
//! Wraps the taxonomy engine with persistence, replay, snapshots,
//! a commit pipeline and drift detection.
//!
//! No graph logic lives here. Mutation, adjacency and closure are
//! delegated to the engine.

pub mod error;
pub mod config;
pub mod telemetry;
pub mod proto_types;
pub mod proto_bridge;
pub mod event_store;
pub mod replay;
pub mod snapshot;
pub mod snapshot_codec;
pub mod commit;
pub mod drift;

pub use commit::{CommitOutcome, CommitPipeline, NoRelationshipSource, RelationshipSource, SharedPipeline};
pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
