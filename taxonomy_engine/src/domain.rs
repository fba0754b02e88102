/// Taxonomy Engine — Core Domain Types
///
/// Pure data. No graph logic.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Identifiers ────────────────────────────────────────────────────

/// Stable 64-bit concept identifier.
pub type ConceptId = u64;

/// Type id of the subsumption (IS-A) relationship.
pub const IS_A: ConceptId = 116_680_003;

/// Stable edge identifier: the originating relationship id or axiom member id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for EdgeId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

// ── Relationship classification ────────────────────────────────────

/// Characteristic type carried by a relationship record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacteristicType {
    Stated,
    Inferred,
    Additional,
}

/// Which hierarchy a graph instance maintains.
///
/// The stated taxonomy is fed by stated relationships and axiom members,
/// the inferred taxonomy by classifier output only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    Stated,
    #[default]
    Inferred,
}

impl TaxonomyKind {
    /// True if relationships of `characteristic` contribute edges to this kind.
    pub fn accepts(self, characteristic: CharacteristicType) -> bool {
        matches!(
            (self, characteristic),
            (TaxonomyKind::Stated, CharacteristicType::Stated)
                | (TaxonomyKind::Inferred, CharacteristicType::Inferred)
        )
    }

    /// Axiom-derived edges only ever belong to the stated hierarchy.
    pub fn accepts_axioms(self) -> bool {
        self == TaxonomyKind::Stated
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonomyKind::Stated => f.write_str("stated"),
            TaxonomyKind::Inferred => f.write_str("inferred"),
        }
    }
}

impl std::str::FromStr for TaxonomyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stated" => Ok(TaxonomyKind::Stated),
            "inferred" => Ok(TaxonomyKind::Inferred),
            other => Err(format!("unknown taxonomy kind {:?}", other)),
        }
    }
}

// ── Build status ───────────────────────────────────────────────────

/// Side of an edge that references a concept absent from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingConcept {
    Source,
    Destination,
}

/// A dangling (source, destination) pair found while building adjacency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidRelationship {
    pub edge_id: EdgeId,
    pub source_id: ConceptId,
    pub destination_id: ConceptId,
    pub missing: MissingConcept,
}

impl fmt::Display for InvalidRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let missing = match self.missing {
            MissingConcept::Source => self.source_id,
            MissingConcept::Destination => self.destination_id,
        };
        write!(
            f,
            "edge {} ({} -> {}) references missing {:?} concept {}",
            self.edge_id, self.source_id, self.destination_id, self.missing, missing
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warning,
}

/// Outcome of `TaxonomyGraph::update`.
///
/// A warning is not fatal: the graph is usable with the dangling pairs omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatus {
    pub severity: Severity,
    pub invalid_relationships: Vec<InvalidRelationship>,
}

impl BuildStatus {
    pub fn ok() -> Self {
        Self {
            severity: Severity::Ok,
            invalid_relationships: Vec::new(),
        }
    }

    pub fn warning(invalid_relationships: Vec<InvalidRelationship>) -> Self {
        Self {
            severity: Severity::Warning,
            invalid_relationships,
        }
    }

    /// `Ok` when `invalid` is empty, `Warning` otherwise.
    pub fn from_invalid(invalid: Vec<InvalidRelationship>) -> Self {
        if invalid.is_empty() {
            Self::ok()
        } else {
            Self::warning(invalid)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.severity == Severity::Ok
    }
}
