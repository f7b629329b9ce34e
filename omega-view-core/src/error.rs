//! Error types for the view engine.
//!
//! Failures are local to the operation that raised them; there is no global
//! fatal-error channel. Two situations that look like errors are deliberately
//! not represented here: link endpoints that the renderer has not bound yet
//! (a retry condition for the index registration pass) and rendered links
//! missing from the logical edge set (an expected consequence of the
//! renderer's removal lag, silently skipped by visibility and serialization).

use thiserror::Error;

/// Errors surfaced by the graph view engine.
#[derive(Debug, Error)]
pub enum ViewError {
    /// An install was attempted with a graph carrying no nodes and no edges.
    /// Fatal to that call only; the engine keeps its previous state.
    #[error("cannot install a graph with no logical data")]
    EmptyGraph,

    /// An export was requested with an unrecognized kind string.
    #[error("unknown export kind `{0}`")]
    UnknownExport(String),

    /// The renderer-side image capture hook failed (or none is registered).
    /// Logged and returned to the caller; never retried automatically.
    #[error("image capture failed: {0}")]
    ImageCapture(String),

    /// A graph document could not be parsed or encoded.
    #[error("malformed graph document: {0}")]
    MalformedDocument(#[from] serde_json::Error),
}
