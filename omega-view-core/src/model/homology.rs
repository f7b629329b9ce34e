//! Homology evidence attached to logical edges.
//!
//! The topology engine owns the semantics of this data; the view engine only
//! needs enough structure to export it: per-direction homology parameters
//! (low-query and high-query alignments) and the raw interaction-database
//! records backing the edge. Everything round-trips through serde untouched.

use serde::{Deserialize, Serialize};

/// One homology alignment parameter set for an edge direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomologyParameter {
    /// Whether the alignment survived the last trim pass.
    pub valid: bool,
    /// Identity percentage (0-100).
    pub identity: f64,
    /// Similarity percentage (0-100).
    pub similarity: f64,
    /// Coverage percentage (0-100).
    pub coverage: f64,
    /// Alignment e-value.
    pub e_value: f64,
}

/// A raw interaction record (one tab-separated line of the underlying
/// interaction database), kept as opaque field columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub fields: Vec<String>,
}

impl InteractionRecord {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// The record re-joined into its tab-separated line form.
    pub fn line(&self) -> String {
        self.fields.join("\t")
    }
}

/// All homology evidence carried by one logical edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomologyEvidence {
    /// Alignments where the query was the lower-id endpoint.
    pub low_query: Vec<HomologyParameter>,
    /// Alignments where the query was the higher-id endpoint.
    pub high_query: Vec<HomologyParameter>,
    /// Raw interaction records backing this edge.
    pub records: Vec<InteractionRecord>,
}

impl HomologyEvidence {
    /// Highest identity percentage across every valid low- and high-query
    /// parameter. Returns 0.0 when no valid parameter exists.
    pub fn best_identity(&self) -> f64 {
        self.low_query
            .iter()
            .chain(self.high_query.iter())
            .filter(|p| p.valid)
            .map(|p| p.identity)
            .fold(0.0, f64::max)
    }
}
