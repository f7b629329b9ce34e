//! Logical Graph Model
//!
//! This module holds the data the external topology engine hands to the view
//! engine: the logical node and edge lists produced by the latest trim/prune
//! computation, the adjacency view over those edges, and the parameter types
//! describing how that computation was configured.
//!
//! The logical graph is independent of what the renderer currently shows.
//! The renderer removes objects lazily, so the scene can hold links that the
//! logical edge set no longer contains; consumers treat the logical side as
//! the source of truth and silently skip stale rendered objects.

mod homology;

pub use homology::{HomologyEvidence, HomologyParameter, InteractionRecord};

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// A node of the logical graph: durable string identity, group (0 or 1,
/// drives the default color) and a numeric weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalNode {
    pub id: String,
    pub group: u8,
    pub value: f64,
}

/// An edge of the logical graph. Identity is the unordered endpoint pair;
/// the homology evidence is owned by the topology engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalEdge {
    pub source: String,
    pub target: String,
    pub evidence: HomologyEvidence,
}

/// The node/edge lists as currently computed by the topology engine,
/// post trim and prune.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogicalGraph {
    pub nodes: Vec<LogicalNode>,
    pub edges: Vec<LogicalEdge>,
}

impl LogicalGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// The set of node ids present in this graph.
    pub fn node_ids(&self) -> HashSet<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    /// Build the adjacency view over this graph's edges.
    pub fn edge_set(&self) -> LogicalEdgeSet {
        let mut set = LogicalEdgeSet::default();
        for edge in &self.edges {
            set.insert(&edge.source, &edge.target);
        }
        set
    }
}

/// Adjacency over the logical edges. Lookup succeeds regardless of which
/// endpoint is queried first.
#[derive(Debug, Clone, Default)]
pub struct LogicalEdgeSet {
    adjacency: HashMap<String, HashSet<String>>,
}

impl LogicalEdgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edge under both endpoints.
    pub fn insert(&mut self, a: &str, b: &str) {
        self.adjacency
            .entry(a.to_owned())
            .or_default()
            .insert(b.to_owned());
        self.adjacency
            .entry(b.to_owned())
            .or_default()
            .insert(a.to_owned());
    }

    /// Whether the pair is a logical edge, checked in both directions.
    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.adjacency.get(a).is_some_and(|p| p.contains(b))
            || self.adjacency.get(b).is_some_and(|p| p.contains(a))
    }

    /// Partners of a node, if it has any.
    pub fn partners(&self, id: &str) -> Option<&HashSet<String>> {
        self.adjacency.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}

/// Thresholds for the topology engine's trim pass. Defaults are the
/// engine's baseline fixes: identity 25%, coverage 30%, similarity 32%,
/// no e-value cutoff, no taxon or detection-method filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimParameters {
    pub identity: f64,
    pub similarity: f64,
    pub coverage: f64,
    /// Maximum e-value; `None` means no cutoff.
    pub e_value: Option<f64>,
    pub taxons: Vec<String>,
    pub detection_methods: Vec<String>,
}

impl Default for TrimParameters {
    fn default() -> Self {
        Self {
            identity: 25.0,
            similarity: 32.0,
            coverage: 30.0,
            e_value: None,
            taxons: Vec::new(),
            detection_methods: Vec::new(),
        }
    }
}

/// Seed set and distance bound for the topology engine's prune pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneParameters {
    pub seeds: Vec<String>,
    /// Maximum distance from the seed set; `None` means unbounded.
    pub distance: Option<u32>,
}

/// The parameter state embedded in graph exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub trim: TrimParameters,
    pub prune: PruneParameters,
    pub specie: String,
}
