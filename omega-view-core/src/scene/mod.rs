//! Scene Graph
//!
//! This module models the state the renderer holds: an arena of nodes
//! indexed by id (iteration order is the renderer's iteration order) and a
//! flat list of links whose endpoints are ids, resolved through the arena at
//! read time. Storing ids instead of node references removes the node/link
//! reference cycles of a naive scene graph and keeps serialization and
//! testing straightforward.
//!
//! # Endpoint resolution gate
//!
//! After a graph is installed the renderer binds each link endpoint to its
//! node object during its own tick. The scene exposes that progress through
//! a watch channel: `bind_endpoints` (called by the renderer driver) marks
//! endpoints bound and flips the gate once every link is complete. The link
//! index registration pass awaits the gate instead of polling on a timer.
//!
//! # Shared mutation
//!
//! The scene is shared between the engine and the renderer's physics tick.
//! The engine only writes `visible`, `visual`, `scale` and `group` in place;
//! node and link identities are never replaced outside a wholesale install,
//! so references held by the index and the highlight machine stay valid.

mod link;
mod node;

pub use link::{Endpoint, LinkKey, LinkVisual, SceneLink};
pub use node::{NodeVisual, SceneNode};

use std::collections::HashSet;

use indexmap::IndexMap;
use tokio::sync::watch;

use crate::model::LogicalGraph;

/// The rendered node/link collection.
pub struct Scene {
    nodes: IndexMap<String, SceneNode>,
    links: Vec<SceneLink>,
    /// Flips to `true` once the renderer has bound every link endpoint.
    gate: watch::Sender<bool>,
}

impl Scene {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            nodes: IndexMap::new(),
            links: Vec::new(),
            gate,
        }
    }

    /// Replace the whole scene with the given logical graph.
    ///
    /// Every node and link object is recreated; endpoints start `Pending`
    /// and the resolution gate drops back to unresolved.
    pub fn install(&mut self, graph: &LogicalGraph) {
        self.nodes = graph
            .nodes
            .iter()
            .map(|n| (n.id.clone(), SceneNode::new(n.id.clone(), n.group, n.value)))
            .collect();
        self.links = graph
            .edges
            .iter()
            .map(|e| SceneLink::new(e.source.clone(), e.target.clone(), e.evidence.clone()))
            .collect();
        self.gate.send_replace(false);
    }

    /// Merge a logical graph into the existing scene ("reheat"): nodes and
    /// links already present are kept as-is, new ones are appended pending.
    pub fn merge(&mut self, graph: &LogicalGraph) {
        for n in &graph.nodes {
            if !self.nodes.contains_key(&n.id) {
                self.nodes
                    .insert(n.id.clone(), SceneNode::new(n.id.clone(), n.group, n.value));
            }
        }

        let existing: HashSet<LinkKey> = self.links.iter().map(|l| l.key()).collect();
        for e in &graph.edges {
            if !existing.contains(&LinkKey::new(e.source.as_str(), e.target.as_str())) {
                self.links
                    .push(SceneLink::new(e.source.clone(), e.target.clone(), e.evidence.clone()));
            }
        }
        self.gate.send_replace(false);
    }

    /// Drop every node and link.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.gate.send_replace(false);
    }

    /// Renderer callback: bind every endpoint whose node exists in the
    /// arena. Flips the resolution gate when no pending endpoint remains.
    /// Returns whether the scene is fully bound.
    pub fn bind_endpoints(&mut self) -> bool {
        let mut complete = true;
        for link in &mut self.links {
            for endpoint in [&mut link.source, &mut link.target] {
                if endpoint.bound().is_none() {
                    if self.nodes.contains_key(endpoint.id()) {
                        endpoint.bind();
                    } else {
                        complete = false;
                    }
                }
            }
        }
        if complete {
            self.gate.send_replace(true);
        }
        complete
    }

    /// A receiver on the endpoint-resolution gate.
    pub fn resolution_gate(&self) -> watch::Receiver<bool> {
        self.gate.subscribe()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Visible node and link counts, in that order.
    pub fn visible_counts(&self) -> (usize, usize) {
        (
            self.nodes.values().filter(|n| n.visible).count(),
            self.links.iter().filter(|l| l.visible).count(),
        )
    }

    pub fn node(&self, id: &str) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut SceneNode> {
        self.nodes.values_mut()
    }

    pub fn links(&self) -> &[SceneLink] {
        &self.links
    }

    pub fn links_mut(&mut self) -> impl Iterator<Item = &mut SceneLink> {
        self.links.iter_mut()
    }

    pub fn link(&self, slot: usize) -> Option<&SceneLink> {
        self.links.get(slot)
    }

    pub fn link_mut(&mut self, slot: usize) -> Option<&mut SceneLink> {
        self.links.get_mut(slot)
    }

    /// Group reassignment; the visual catches up on the next repaint.
    pub fn set_group(&mut self, id: &str, group: u8) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.group = group;
        }
    }

    pub fn set_scale(&mut self, id: &str, scale: f32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.scale = scale;
        }
    }

    /// Remove the given nodes and every link touching them. Remaining nodes
    /// keep their relative order.
    pub fn remove_nodes(&mut self, ids: &HashSet<String>) {
        if ids.is_empty() {
            return;
        }
        self.links
            .retain(|l| !ids.contains(l.source.id()) && !ids.contains(l.target.id()));
        self.nodes.retain(|id, _| !ids.contains(id));
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
