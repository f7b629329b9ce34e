//! Graph View Controller
//!
//! Thin glue that owns the scene and wires the other components together:
//! typed topology/selection events in, typed notifications out, plus the
//! imperative surface (install, highlight, hover, remove, serialize,
//! export) the host application calls directly.
//!
//! # Ordering
//!
//! A graph install first tears down highlight, animation and link-index
//! state synchronously, then rebuilds the scene and spawns the asynchronous
//! index registration pass. Callers must not rely on the index being
//! populated when `install_graph` returns. Two concurrent installs are not
//! interlocked; the UI is assumed to serialize topology actions (one at a
//! time). An install generation counter makes a superseded registration
//! pass abandon instead of writing a stale index.

mod events;

pub use events::{Notification, SelectionEvent, TopologyEvent};

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::animation::AnimationOverlay;
use crate::error::ViewError;
use crate::highlight::HighlightStateMachine;
use crate::index::{register_links, LinkIndex};
use crate::model::{
    LogicalEdgeSet, LogicalGraph, ParameterSnapshot, PruneParameters, TrimParameters,
};
use crate::scene::{LinkKey, Scene, SceneNode};
use crate::serialize::{Artifact, ExportKind, GraphSerializer};
use crate::visibility::{clip, unclip};

/// The external topology/homology engine, as the view engine consumes it.
pub trait TopologySource: Send + Sync {
    /// Recompute the logical subgraph for the given trim thresholds.
    fn trim(&self, parameters: &TrimParameters) -> LogicalGraph;
    /// Restrict the logical subgraph to nodes within `distance` of the
    /// seed set.
    fn prune(&self, seeds: &[String], distance: Option<u32>) -> LogicalGraph;
    /// The trim parameters currently in effect.
    fn trim_parameters(&self) -> TrimParameters;
    /// The prune parameters currently in effect.
    fn prune_parameters(&self) -> PruneParameters;
    /// Completion of the background interaction-record download, 0-100.
    fn download_progress(&self) -> f32;
}

/// Renderer-side hook producing image bytes for a named capture.
pub type ImageCapture = Box<dyn Fn(&str) -> Result<Vec<u8>, String> + Send + Sync>;

/// Statistics of one repaint pass, used to verify idempotence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepaintStats {
    /// Node visuals actually reassigned.
    pub node_visuals: usize,
    /// Link visuals actually reassigned.
    pub link_visuals: usize,
}

pub struct GraphViewController {
    scene: Arc<RwLock<Scene>>,
    index: Arc<RwLock<LinkIndex>>,
    highlight: HighlightStateMachine,
    overlay: AnimationOverlay,
    source: Arc<dyn TopologySource>,
    /// Node ids of the last installed logical graph.
    live_nodes: HashSet<String>,
    /// Edge set of the last installed logical graph.
    logical_edges: LogicalEdgeSet,
    specie: String,
    selection_mode: bool,
    generation: Arc<AtomicU64>,
    notifications: broadcast::Sender<Notification>,
    image_capture: Option<ImageCapture>,
}

impl GraphViewController {
    pub fn new(source: Arc<dyn TopologySource>, specie: impl Into<String>) -> Self {
        let scene = Arc::new(RwLock::new(Scene::new()));
        let (notifications, _) = broadcast::channel(64);
        Self {
            overlay: AnimationOverlay::new(Arc::clone(&scene)),
            scene,
            index: Arc::new(RwLock::new(LinkIndex::new())),
            highlight: HighlightStateMachine::new(),
            source,
            live_nodes: HashSet::new(),
            logical_edges: LogicalEdgeSet::new(),
            specie: specie.into().to_lowercase(),
            selection_mode: false,
            generation: Arc::new(AtomicU64::new(0)),
            notifications,
            image_capture: None,
        }
    }

    /// Subscribe to the notification stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Shared handle to the scene, for the renderer and its physics tick.
    pub fn scene_handle(&self) -> Arc<RwLock<Scene>> {
        Arc::clone(&self.scene)
    }

    /// Register the renderer's image capture hook.
    pub fn set_image_capture(&mut self, capture: ImageCapture) {
        self.image_capture = Some(capture);
    }

    pub fn specie(&self) -> &str {
        &self.specie
    }

    pub fn selection_mode(&self) -> bool {
        self.selection_mode
    }

    /// Install a new logical graph, replacing the rendered one wholesale.
    ///
    /// Tears down highlight/animation/index state synchronously, then
    /// spawns the asynchronous link-index registration pass; must be called
    /// within a tokio runtime.
    pub fn install_graph(&mut self, graph: LogicalGraph) -> Result<(), ViewError> {
        if graph.is_empty() {
            return Err(ViewError::EmptyGraph);
        }

        self.teardown();
        self.live_nodes = graph.node_ids();
        self.logical_edges = graph.edge_set();
        {
            let mut scene = self.scene.write();
            scene.install(&graph);
            info!(
                nodes = scene.node_count(),
                links = scene.link_count(),
                "graph installed"
            );
        }
        self.spawn_register_pass();

        self.emit_rebuilt();
        Ok(())
    }

    /// Merge new data into the rendered graph ("reheat"), disabling
    /// clipping first. Without an explicit graph the current trim
    /// parameters are replayed through the topology source.
    pub fn reheat(&mut self, graph: Option<LogicalGraph>) -> Result<(), ViewError> {
        let graph =
            graph.unwrap_or_else(|| self.source.trim(&self.source.trim_parameters()));
        if graph.is_empty() {
            return Err(ViewError::EmptyGraph);
        }

        for node in graph.node_ids() {
            self.live_nodes.insert(node);
        }
        for edge in &graph.edges {
            self.logical_edges.insert(&edge.source, &edge.target);
        }
        {
            let mut scene = self.scene.write();
            unclip(&mut scene);
            scene.merge(&graph);
            info!(
                nodes = scene.node_count(),
                links = scene.link_count(),
                "graph reheated"
            );
        }
        self.spawn_register_pass();

        self.emit_rebuilt();
        Ok(())
    }

    /// Tear everything down to an empty view.
    pub fn full_reset(&mut self) {
        self.teardown();
        self.live_nodes.clear();
        self.logical_edges = LogicalEdgeSet::new();
        self.scene.write().clear();
        info!("view reset");
        self.emit_counts();
    }

    /// Dispatch a topology lifecycle event.
    pub fn handle_topology_event(&mut self, event: TopologyEvent) -> Result<(), ViewError> {
        match event {
            TopologyEvent::TrimChanged(parameters) => {
                let graph = self.source.trim(&parameters);
                info!(
                    nodes = graph.nodes.len(),
                    edges = graph.edges.len(),
                    "trim recomputed logical subgraph"
                );
                self.apply_logical(graph)
            }
            TopologyEvent::PruneChanged { seeds, distance } => {
                let graph = self.source.prune(&seeds, distance);
                info!(
                    seeds = seeds.len(),
                    nodes = graph.nodes.len(),
                    "prune recomputed logical subgraph"
                );
                self.apply_logical(graph)
            }
            TopologyEvent::FullReset => {
                self.full_reset();
                Ok(())
            }
            TopologyEvent::Reheat { graph } => self.reheat(graph),
            TopologyEvent::SpecieChanged(specie) => {
                self.specie = specie.to_lowercase();
                info!(specie = %self.specie, "specie changed");
                self.full_reset();
                Ok(())
            }
        }
    }

    /// Dispatch a selection/programmatic-hover event.
    pub fn handle_selection_event(&mut self, event: SelectionEvent) {
        match event {
            SelectionEvent::EnterSelectionMode => self.selection_mode = true,
            SelectionEvent::ExitSelectionMode => self.selection_mode = false,
            SelectionEvent::UnselectAll => self.reset_highlight(),
            SelectionEvent::HistoryHoverNodes(ids) => {
                self.highlight.history_hover_nodes(ids);
                self.update_geometries();
            }
            SelectionEvent::HistoryHoverLink(key) => {
                self.highlight.history_hover_link(key);
                self.update_geometries();
            }
            SelectionEvent::HistoryHoverClear => {
                self.highlight.history_hover_clear();
                self.update_geometries();
            }
        }
    }

    /// Add nodes to the selection by id. Emits the add delta (possibly
    /// empty) and repaints.
    pub fn highlight_nodes<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let added = {
            let scene = self.scene.read();
            self.highlight.highlight(ids, &scene, &self.live_nodes)
        };
        self.notify(Notification::SelectionAdded(added));
        self.update_geometries();
    }

    /// Add every rendered node matching the predicate to the selection.
    pub fn highlight_nodes_where<F>(&mut self, matcher: F)
    where
        F: Fn(&str) -> bool,
    {
        let added = {
            let scene = self.scene.read();
            self.highlight
                .highlight_where(matcher, &scene, &self.live_nodes)
        };
        self.notify(Notification::SelectionAdded(added));
        self.update_geometries();
    }

    /// Remove nodes from the selection by id, with one remove notification
    /// per id actually removed.
    pub fn unhighlight_nodes<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in self.highlight.unhighlight(ids) {
            self.notify(Notification::SelectionRemoved(id));
        }
        self.update_geometries();
    }

    /// Remove every selected node matching the predicate.
    pub fn unhighlight_nodes_where<F>(&mut self, matcher: F)
    where
        F: Fn(&str) -> bool,
    {
        for id in self.highlight.unhighlight_where(matcher) {
            self.notify(Notification::SelectionRemoved(id));
        }
        self.update_geometries();
    }

    /// Clear the selection.
    pub fn reset_highlight(&mut self) {
        self.highlight.reset();
        self.notify(Notification::SelectionReset);
        self.update_geometries();
    }

    /// Pointer hover over a node (or nothing). Repaints only on an actual
    /// state change.
    pub fn hover_node(&mut self, target: Option<&str>) {
        let changed = {
            let index = self.index.read();
            self.highlight.hover(target, &index)
        };
        if changed {
            self.update_geometries();
        }
    }

    /// Pointer hover over a link (or nothing).
    pub fn hover_link(&mut self, target: Option<&LinkKey>) {
        if self.highlight.hover_link(target) {
            self.update_geometries();
        }
    }

    /// A click on a node: in selection mode it toggles the node's
    /// selection, otherwise it requests the node's card.
    pub fn node_clicked(&mut self, id: &str) {
        if self.selection_mode {
            if self.highlight.selected_node_ids().any(|s| s == id) {
                self.unhighlight_nodes([id]);
            } else {
                self.highlight_nodes([id]);
            }
        } else {
            self.notify(Notification::NodeCardRequested(id.to_owned()));
        }
    }

    /// A click on a link requests the link's card.
    pub fn link_clicked(&mut self, key: LinkKey) {
        self.notify(Notification::LinkCardRequested(key));
    }

    /// A copy of the rendered node with the given id.
    pub fn node(&self, id: &str) -> Option<SceneNode> {
        self.scene.read().node(id).cloned()
    }

    /// Keys of every link incident to the given node.
    pub fn links_of(&self, id: &str) -> Vec<LinkKey> {
        self.index
            .read()
            .all_from(id)
            .map(|(partner, _)| LinkKey::new(id, partner))
            .collect()
    }

    /// Reassign a node's group; the visual catches up on the next repaint.
    pub fn set_node_group(&mut self, id: &str, group: u8) {
        self.scene.write().set_group(id, group);
        self.update_geometries();
    }

    /// Remove nodes (and their links) from the scene by id.
    pub fn remove_nodes<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: HashSet<String> = ids.into_iter().map(Into::into).collect();
        self.remove_node_set(ids);
    }

    /// Remove every rendered node matching the predicate.
    pub fn remove_nodes_where<F>(&mut self, matcher: F)
    where
        F: Fn(&str) -> bool,
    {
        let ids: HashSet<String> = self
            .scene
            .read()
            .nodes()
            .filter(|n| matcher(&n.id))
            .map(|n| n.id.clone())
            .collect();
        self.remove_node_set(ids);
    }

    fn remove_node_set(&mut self, ids: HashSet<String>) {
        if ids.is_empty() {
            return;
        }
        for id in &ids {
            self.overlay.cancel_for(id);
        }
        {
            let mut scene = self.scene.write();
            scene.remove_nodes(&ids);
        }
        // Link slots shifted; the index is stale until the pass re-runs.
        self.index.write().clear();
        self.spawn_register_pass();

        self.highlight.unhighlight(ids.iter());
        self.emit_counts();
    }

    /// Resolve highlight state into per-object visuals.
    ///
    /// Idempotent and cheap when nothing changed: visuals are compared
    /// before assignment and the returned stats count only actual
    /// reassignments. A no-op if the scene has no nodes yet. Every repaint
    /// starts by cancelling all animations, then restarts the pulse for
    /// nodes currently under history hover.
    pub fn update_geometries(&self) -> RepaintStats {
        if self.scene.read().is_empty() {
            return RepaintStats::default();
        }

        self.overlay.cancel_all();

        let mut stats = RepaintStats::default();
        {
            let mut scene = self.scene.write();
            for node in scene.nodes_mut() {
                let resolved = self.highlight.resolve_node(&node.id, node.group);
                if node.visual != resolved {
                    node.visual = resolved;
                    stats.node_visuals += 1;
                }
            }
            for link in scene.links_mut() {
                let resolved = self.highlight.resolve_link(&link.key());
                if link.visual != resolved {
                    link.visual = resolved;
                    stats.link_visuals += 1;
                }
            }
        }

        for id in self.highlight.history_hover_node_ids() {
            self.overlay.pulse(id);
        }

        debug!(
            node_visuals = stats.node_visuals,
            link_visuals = stats.link_visuals,
            "repainted"
        );
        stats
    }

    /// Serialize the visible-and-logically-valid subgraph to JSON.
    pub fn serialize_json(&self) -> Result<String, ViewError> {
        let scene = self.scene.read();
        GraphSerializer::new(&scene, &self.logical_edges).to_json(&self.parameter_snapshot())
    }

    /// Serialize the raw interaction records of the visible subgraph.
    pub fn serialize_tabular(&self) -> String {
        let scene = self.scene.read();
        GraphSerializer::new(&scene, &self.logical_edges).to_tabular()
    }

    /// Produce a named download artifact of the given kind.
    pub fn export(&self, kind: &str, name: &str) -> Result<Artifact, ViewError> {
        match kind.parse::<ExportKind>()? {
            ExportKind::Json => Ok(Artifact {
                filename: format!("{name}.json"),
                mime: "application/json",
                bytes: self.serialize_json()?.into_bytes(),
            }),
            ExportKind::Tabular => Ok(Artifact {
                filename: format!("{name}.tsv"),
                mime: "text/tab-separated-values",
                bytes: self.serialize_tabular().into_bytes(),
            }),
            ExportKind::Image => {
                let capture = self.image_capture.as_ref().ok_or_else(|| {
                    ViewError::ImageCapture("no capture hook registered".to_owned())
                })?;
                match capture(name) {
                    Ok(bytes) => Ok(Artifact {
                        filename: format!("{name}.png"),
                        mime: "image/png",
                        bytes,
                    }),
                    Err(cause) => {
                        error!(%cause, "image capture failed");
                        Err(ViewError::ImageCapture(cause))
                    }
                }
            }
        }
    }

    /// Completion of the background interaction-record download, 0-100.
    pub fn download_progress(&self) -> f32 {
        self.source.download_progress()
    }

    /// The parameter state embedded in exports.
    pub fn parameter_snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            trim: self.source.trim_parameters(),
            prune: self.source.prune_parameters(),
            specie: self.specie.clone(),
        }
    }

    /// Renderer callback: endpoints were assigned during the last tick.
    /// Returns whether every link is now bound.
    pub fn bind_link_endpoints(&self) -> bool {
        self.scene.write().bind_endpoints()
    }

    /// Install a freshly computed logical subgraph: full install when the
    /// scene is empty, otherwise re-clip the existing scene to it.
    fn apply_logical(&mut self, graph: LogicalGraph) -> Result<(), ViewError> {
        if self.scene.read().is_empty() {
            return self.install_graph(graph);
        }

        self.live_nodes = graph.node_ids();
        self.logical_edges = graph.edge_set();
        {
            let mut scene = self.scene.write();
            let index = self.index.read();
            clip(&mut scene, &index, &self.live_nodes, &self.logical_edges);
        }
        self.highlight.prune_selection(&self.live_nodes);
        self.update_geometries();
        self.emit_counts();
        Ok(())
    }

    /// Synchronous teardown preceding a graph install.
    fn teardown(&mut self) {
        self.overlay.cancel_all();
        self.highlight.clear_all();
        self.index.write().clear();
        // Invalidate any in-flight registration pass.
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn spawn_register_pass(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::spawn(register_links(
            Arc::clone(&self.scene),
            Arc::clone(&self.index),
            Arc::clone(&self.generation),
            generation,
        ));
    }

    fn emit_rebuilt(&self) {
        let (nodes, links) = {
            let scene = self.scene.read();
            (scene.node_count(), scene.link_count())
        };
        self.notify(Notification::GraphRebuilt { nodes, links });
        self.emit_counts();
    }

    fn emit_counts(&self) {
        let (visible_nodes, visible_links) = self.scene.read().visible_counts();
        self.notify(Notification::CountsChanged {
            visible_nodes,
            visible_links,
        });
    }

    fn notify(&self, notification: Notification) {
        // Nobody listening is fine.
        let _ = self.notifications.send(notification);
    }
}
