//! Omega View Core
//!
//! This crate is the view-synchronization engine of the Omega
//! interaction-network viewer. It keeps an interactive 3D force-directed
//! scene consistent with the constantly-changing logical subgraph an
//! external topology/homology engine produces (trim by homology
//! thresholds, prune by seed distance), and it owns every piece of the
//! viewer with real state-machine complexity:
//!
//! - A reversible pair-to-link index, built asynchronously as the renderer
//!   binds link endpoints
//! - Visibility selection ("clip"/"unclip") of rendered nodes and links
//!   against an arbitrary logical subset
//! - A layered highlight/hover/selection state machine resolved into a
//!   deterministic visual state per object
//! - A cancelable per-node pulse-animation overlay synchronized with the
//!   repaint cycle
//! - A generic serialization fold over the visible subgraph, with JSON and
//!   tabular encodings
//!
//! The renderer itself, the homology computation and all UI widgets are
//! external collaborators: they reach the engine through the typed event
//! and notification surface of [`controller::GraphViewController`] and the
//! shared [`scene::Scene`] handle.
//!
//! # Architecture
//!
//! - `model`: logical graph data as the topology engine computes it
//! - `scene`: the rendered node arena and link list, with endpoint binding
//! - `index`: reversible pair lookup and the async registration pass
//! - `visibility`: clip/unclip against a logical subset
//! - `highlight`: selection/hover/history-hover state and resolution
//! - `animation`: interval-driven per-node animations and the scale pulse
//! - `serialize`: exportable encodings of the visible subgraph
//! - `controller`: the glue object collaborators talk to

pub mod animation;
pub mod controller;
pub mod error;
pub mod highlight;
pub mod index;
pub mod model;
pub mod scene;
pub mod serialize;
pub mod visibility;

pub use controller::{
    GraphViewController, ImageCapture, Notification, RepaintStats, SelectionEvent, TopologyEvent,
    TopologySource,
};
pub use error::ViewError;
pub use highlight::HighlightStateMachine;
pub use index::{LinkIndex, ReversibleKeyMap};
pub use model::{
    HomologyEvidence, HomologyParameter, InteractionRecord, LogicalEdge, LogicalEdgeSet,
    LogicalGraph, LogicalNode, ParameterSnapshot, PruneParameters, TrimParameters,
};
pub use scene::{Endpoint, LinkKey, LinkVisual, NodeVisual, Scene, SceneLink, SceneNode};
pub use serialize::{Artifact, ExportKind, GraphExport, GraphSerializer};
