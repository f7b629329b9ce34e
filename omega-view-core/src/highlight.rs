//! Highlight State Machine
//!
//! Six independent membership sets — selected, hovered and history-hover,
//! each over nodes and links — resolved into a deterministic visual state
//! per object. Pointer hover and history hover (hover driven by sibling
//! cards/tables/charts) live in separate sets so neither clobbers the
//! other, but they share the same precedence tier.
//!
//! Resolution is a pure function from (object, sets) to a closed visual
//! enum; nothing here touches the renderer, which keeps the machine
//! unit-testable on its own. Precedence, highest first:
//!
//! - node: history-hover > hover > selected > group-1 > group-0
//! - link: history-hover > (selected or hovered) > default
//!
//! Every mutation is idempotent and reports its delta, so the controller
//! can emit add/remove notifications carrying exactly what changed.

use std::collections::HashSet;

use tracing::warn;

use crate::index::LinkIndex;
use crate::scene::{LinkKey, NodeVisual, LinkVisual, Scene};

#[derive(Debug, Default)]
pub struct HighlightStateMachine {
    selected_nodes: HashSet<String>,
    hovered_nodes: HashSet<String>,
    history_hover_nodes: HashSet<String>,
    selected_links: HashSet<LinkKey>,
    hovered_links: HashSet<LinkKey>,
    history_hover_links: HashSet<LinkKey>,
}

impl HighlightStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the given ids to the selection.
    ///
    /// Only ids present in the rendered node list are considered; unknown
    /// ids are reported with a warning, as the original viewer did. After
    /// the mutation the selection is pruned to `live_nodes` (the active
    /// logical node set) so a selection can never leak removed nodes.
    /// Returns the ids that were newly added and survived the prune.
    pub fn highlight<I, S>(
        &mut self,
        ids: I,
        scene: &Scene,
        live_nodes: &HashSet<String>,
    ) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = Vec::new();
        let mut missing = Vec::new();

        for id in ids {
            let id = id.as_ref();
            if scene.node(id).is_none() {
                missing.push(id.to_owned());
                continue;
            }
            if self.selected_nodes.insert(id.to_owned()) {
                added.push(id.to_owned());
            }
        }

        if !missing.is_empty() {
            warn!("node(s) {} not found", missing.join(", "));
        }

        self.selected_nodes.retain(|id| live_nodes.contains(id));
        added.retain(|id| live_nodes.contains(id));
        added
    }

    /// `highlight` over every rendered node id matching the predicate.
    pub fn highlight_where<F>(
        &mut self,
        matcher: F,
        scene: &Scene,
        live_nodes: &HashSet<String>,
    ) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let matching: Vec<String> = scene
            .nodes()
            .filter(|n| matcher(&n.id))
            .map(|n| n.id.clone())
            .collect();
        self.highlight(matching, scene, live_nodes)
    }

    /// Remove ids from the selection; returns the ids actually removed.
    pub fn unhighlight<I, S>(&mut self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = Vec::new();
        for id in ids {
            let id = id.as_ref();
            if self.selected_nodes.remove(id) {
                removed.push(id.to_owned());
            }
        }
        removed
    }

    /// Remove every selected id matching the predicate.
    pub fn unhighlight_where<F>(&mut self, matcher: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let matching: Vec<String> = self
            .selected_nodes
            .iter()
            .filter(|id| matcher(id))
            .cloned()
            .collect();
        self.unhighlight(matching)
    }

    /// Clear the node and link selections.
    pub fn reset(&mut self) {
        self.selected_nodes.clear();
        self.selected_links.clear();
    }

    /// Replace the pointer hover with a single node (or nothing) and the
    /// hovered-link set with the node's incident links. O(degree) per call.
    /// Returns `false` without touching anything when the new state equals
    /// the current one, so the caller can skip the repaint.
    pub fn hover(&mut self, target: Option<&str>, index: &LinkIndex) -> bool {
        match target {
            None if self.hovered_nodes.is_empty() => return false,
            Some(id) if self.hovered_nodes.contains(id) => return false,
            _ => {}
        }

        match target {
            Some(id) => {
                self.hovered_nodes = HashSet::from([id.to_owned()]);
                self.hovered_links = index
                    .all_from(id)
                    .map(|(partner, _)| LinkKey::new(id, partner))
                    .collect();
            }
            None => {
                self.hovered_nodes.clear();
                self.hovered_links.clear();
            }
        }
        true
    }

    /// Symmetric to `hover` for links: the hovered-node set is replaced by
    /// the link's two endpoints.
    pub fn hover_link(&mut self, target: Option<&LinkKey>) -> bool {
        match target {
            None if self.hovered_links.is_empty() && self.hovered_nodes.is_empty() => return false,
            Some(key) if self.hovered_links.contains(key) => return false,
            _ => {}
        }

        match target {
            Some(key) => {
                self.hovered_links = HashSet::from([key.clone()]);
                self.hovered_nodes =
                    HashSet::from([key.first().to_owned(), key.second().to_owned()]);
            }
            None => {
                self.hovered_links.clear();
                self.hovered_nodes.clear();
            }
        }
        true
    }

    /// Replace the history hover with the given node ids.
    pub fn history_hover_nodes<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.history_hover_nodes = ids.into_iter().map(Into::into).collect();
        self.history_hover_links.clear();
    }

    /// Replace the history hover with a link and its two endpoints.
    pub fn history_hover_link(&mut self, key: LinkKey) {
        self.history_hover_nodes =
            HashSet::from([key.first().to_owned(), key.second().to_owned()]);
        self.history_hover_links = HashSet::from([key]);
    }

    pub fn history_hover_clear(&mut self) {
        self.history_hover_nodes.clear();
        self.history_hover_links.clear();
    }

    /// Drop every set. Used during graph teardown.
    pub fn clear_all(&mut self) {
        self.reset();
        self.hovered_nodes.clear();
        self.hovered_links.clear();
        self.history_hover_clear();
    }

    /// Prune the selection to the active logical node set.
    pub fn prune_selection(&mut self, live_nodes: &HashSet<String>) {
        self.selected_nodes.retain(|id| live_nodes.contains(id));
    }

    /// Resolve a node to its visual state.
    pub fn resolve_node(&self, id: &str, group: u8) -> NodeVisual {
        if self.history_hover_nodes.contains(id) {
            NodeVisual::HistoryHover
        } else if self.hovered_nodes.contains(id) {
            NodeVisual::Hover
        } else if self.selected_nodes.contains(id) {
            NodeVisual::Selected
        } else {
            NodeVisual::for_group(group)
        }
    }

    /// Resolve a link to its visual state.
    pub fn resolve_link(&self, key: &LinkKey) -> LinkVisual {
        if self.history_hover_links.contains(key) {
            LinkVisual::HistoryHover
        } else if self.selected_links.contains(key) || self.hovered_links.contains(key) {
            LinkVisual::Active
        } else {
            LinkVisual::Default
        }
    }

    pub fn selected_node_ids(&self) -> impl Iterator<Item = &str> {
        self.selected_nodes.iter().map(String::as_str)
    }

    pub fn history_hover_node_ids(&self) -> impl Iterator<Item = &str> {
        self.history_hover_nodes.iter().map(String::as_str)
    }

    pub fn selection_len(&self) -> usize {
        self.selected_nodes.len()
    }
}
