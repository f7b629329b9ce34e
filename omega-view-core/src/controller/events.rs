//! Typed events and notifications.
//!
//! The original viewer coordinated its components over a stringly-typed
//! global event bus. Here collaborators talk to the controller through two
//! typed event enums and subscribe to a typed notification stream instead;
//! payloads stay plain data.

use crate::model::{LogicalGraph, TrimParameters};
use crate::scene::LinkKey;

/// Lifecycle events from the external topology engine and its widgets.
#[derive(Debug, Clone)]
pub enum TopologyEvent {
    /// Trim thresholds changed; the logical subgraph must be recomputed.
    TrimChanged(TrimParameters),
    /// Prune seeds or distance changed.
    PruneChanged {
        seeds: Vec<String>,
        distance: Option<u32>,
    },
    /// Tear the whole view down.
    FullReset,
    /// Merge new data into the rendered graph, disabling clipping first.
    /// Without an explicit graph the current trim parameters are replayed.
    Reheat { graph: Option<LogicalGraph> },
    /// The modelled specie changed; equivalent to a full reset plus a new
    /// specie label.
    SpecieChanged(String),
}

/// Selection and programmatic-hover events from card/table/chart widgets.
#[derive(Debug, Clone)]
pub enum SelectionEvent {
    EnterSelectionMode,
    ExitSelectionMode,
    UnselectAll,
    /// Hover driven by a sibling component, over node ids.
    HistoryHoverNodes(Vec<String>),
    /// Hover driven by a sibling component, over one link.
    HistoryHoverLink(LinkKey),
    HistoryHoverClear,
}

/// Notifications emitted by the controller.
///
/// Card requests carry the id/key as a pending handle; resolving the card's
/// data is the consumer's concern.
#[derive(Debug, Clone)]
pub enum Notification {
    /// Ids newly added to the selection. May be empty when a highlight call
    /// changed nothing.
    SelectionAdded(Vec<String>),
    /// One id removed from the selection.
    SelectionRemoved(String),
    SelectionReset,
    /// A graph was installed or merged.
    GraphRebuilt { nodes: usize, links: usize },
    /// Visible counts changed after a clip or a structural change.
    CountsChanged {
        visible_nodes: usize,
        visible_links: usize,
    },
    NodeCardRequested(String),
    LinkCardRequested(LinkKey),
}
