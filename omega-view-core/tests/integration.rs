//! Integration Tests for the Graph View Engine
//!
//! These drive [`GraphViewController`] the way the host application does:
//! install a logical graph, play the renderer's part (bind link endpoints,
//! let the registration pass run), then interact and export.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use omega_view_core::{
    GraphExport, GraphViewController, HomologyEvidence, HomologyParameter, InteractionRecord,
    LinkKey, LogicalEdge, LogicalGraph, LogicalNode, NodeVisual, Notification, PruneParameters,
    SelectionEvent, TopologyEvent, TopologySource, TrimParameters, ViewError,
};

/// A canned topology engine: trim always returns the configured graph,
/// prune restricts it to the seeds.
struct FixedTopology {
    graph: LogicalGraph,
}

impl TopologySource for FixedTopology {
    fn trim(&self, _parameters: &TrimParameters) -> LogicalGraph {
        self.graph.clone()
    }

    fn prune(&self, seeds: &[String], _distance: Option<u32>) -> LogicalGraph {
        let keep: HashSet<&str> = seeds.iter().map(String::as_str).collect();
        LogicalGraph {
            nodes: self
                .graph
                .nodes
                .iter()
                .filter(|n| keep.contains(n.id.as_str()))
                .cloned()
                .collect(),
            edges: self
                .graph
                .edges
                .iter()
                .filter(|e| keep.contains(e.source.as_str()) && keep.contains(e.target.as_str()))
                .cloned()
                .collect(),
        }
    }

    fn trim_parameters(&self) -> TrimParameters {
        TrimParameters::default()
    }

    fn prune_parameters(&self) -> PruneParameters {
        PruneParameters::default()
    }

    fn download_progress(&self) -> f32 {
        100.0
    }
}

fn node(id: &str, group: u8, value: f64) -> LogicalNode {
    LogicalNode {
        id: id.to_owned(),
        group,
        value,
    }
}

fn edge(a: &str, b: &str) -> LogicalEdge {
    LogicalEdge {
        source: a.to_owned(),
        target: b.to_owned(),
        evidence: HomologyEvidence::default(),
    }
}

fn sample_graph() -> LogicalGraph {
    LogicalGraph {
        nodes: vec![node("A", 0, 2.0), node("B", 1, 3.0), node("C", 0, 1.0)],
        edges: vec![edge("A", "B"), edge("B", "C")],
    }
}

fn controller_with(graph: LogicalGraph) -> GraphViewController {
    GraphViewController::new(Arc::new(FixedTopology { graph }), "R6")
}

/// Play the renderer: bind every link endpoint, then yield until the
/// spawned registration pass has written the index.
async fn settle(controller: &GraphViewController) {
    controller.bind_link_endpoints();
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

/// Test that the link index is populated asynchronously, after the
/// renderer has bound endpoints, never synchronously with the install.
#[tokio::test]
async fn install_registers_the_link_index_asynchronously() {
    let mut controller = controller_with(sample_graph());
    controller.install_graph(sample_graph()).unwrap();

    // The index must not be assumed populated when install returns.
    assert!(controller.links_of("B").is_empty());

    settle(&controller).await;

    let mut incident = controller.links_of("B");
    incident.sort_by_key(|key| key.to_string());
    assert_eq!(
        incident,
        vec![LinkKey::new("A", "B"), LinkKey::new("B", "C")]
    );
}

/// Test that an empty logical graph is rejected and leaves the previous
/// state untouched.
#[tokio::test]
async fn installing_an_empty_graph_is_an_error() {
    let mut controller = controller_with(sample_graph());
    controller.install_graph(sample_graph()).unwrap();
    settle(&controller).await;

    let result = controller.install_graph(LogicalGraph::default());
    assert!(matches!(result, Err(ViewError::EmptyGraph)));
    assert_eq!(controller.scene_handle().read().node_count(), 3);
}

/// Test that a prune event clips the scene to the seed subgraph instead
/// of rebuilding it.
#[tokio::test]
async fn prune_clips_the_scene_to_the_seed_subgraph() {
    let mut controller = controller_with(sample_graph());
    controller.install_graph(sample_graph()).unwrap();
    settle(&controller).await;

    controller
        .handle_topology_event(TopologyEvent::PruneChanged {
            seeds: vec!["A".to_owned(), "B".to_owned()],
            distance: Some(1),
        })
        .unwrap();

    let scene = controller.scene_handle();
    let scene = scene.read();
    assert!(scene.node("A").unwrap().visible);
    assert!(scene.node("B").unwrap().visible);
    assert!(!scene.node("C").unwrap().visible);
    // Node C is still rendered, only hidden.
    assert_eq!(scene.node_count(), 3);
    // (A,B) survives; (B,C) touches the hidden node.
    assert_eq!(scene.visible_counts(), (2, 1));
}

/// Test that highlighting the same node twice emits a second, empty
/// add delta rather than repeating the first.
#[tokio::test]
async fn repeated_highlight_reports_an_empty_delta() {
    let mut controller = controller_with(sample_graph());
    let mut notifications = controller.subscribe();
    controller.install_graph(sample_graph()).unwrap();
    settle(&controller).await;

    controller.highlight_nodes(["A"]);
    controller.highlight_nodes(["A"]);

    let mut deltas: Vec<Vec<String>> = Vec::new();
    while let Ok(notification) = notifications.try_recv() {
        if let Notification::SelectionAdded(ids) = notification {
            deltas.push(ids);
        }
    }
    assert_eq!(deltas, vec![vec!["A".to_owned()], Vec::new()]);
}

/// Test that a repaint with no highlight-state change reassigns nothing.
#[tokio::test]
async fn repaint_is_idempotent() {
    let mut controller = controller_with(sample_graph());
    controller.install_graph(sample_graph()).unwrap();
    settle(&controller).await;

    // Both calls repaint internally, so the state has converged.
    controller.highlight_nodes(["A"]);
    controller.hover_node(Some("B"));

    let stats = controller.update_geometries();
    assert_eq!(stats.node_visuals, 0);
    assert_eq!(stats.link_visuals, 0);

    let scene = controller.scene_handle();
    let scene = scene.read();
    assert_eq!(scene.node("A").unwrap().visual, NodeVisual::Selected);
    assert_eq!(scene.node("B").unwrap().visual, NodeVisual::Hover);
}

/// Test the history-hover pulse lifecycle: hovering from a sibling
/// component recolors the node and starts the pulse, clearing it cancels
/// the pulse and resets the scale to identity.
#[tokio::test]
async fn history_hover_pulses_and_cancels_cleanly() {
    let mut controller = controller_with(sample_graph());
    controller.install_graph(sample_graph()).unwrap();
    settle(&controller).await;

    controller.handle_selection_event(SelectionEvent::HistoryHoverNodes(vec!["A".to_owned()]));
    // Let the pulse task take its first tick.
    tokio::time::sleep(Duration::from_millis(20)).await;

    {
        let scene = controller.scene_handle();
        let scene = scene.read();
        assert_eq!(scene.node("A").unwrap().visual, NodeVisual::HistoryHover);
    }

    controller.handle_selection_event(SelectionEvent::HistoryHoverClear);

    let scene = controller.scene_handle();
    let scene = scene.read();
    assert_eq!(scene.node("A").unwrap().scale, 1.0);
    assert_eq!(scene.node("A").unwrap().visual, NodeVisual::Group0);
}

/// Test that a selection never leaks nodes the logical computation
/// dropped: after a prune, only still-live members stay selected.
#[tokio::test]
async fn selection_survives_prune_only_for_live_nodes() {
    let mut controller = controller_with(sample_graph());
    controller.install_graph(sample_graph()).unwrap();
    settle(&controller).await;

    controller.highlight_nodes(["A", "C"]);

    controller
        .handle_topology_event(TopologyEvent::PruneChanged {
            seeds: vec!["A".to_owned(), "B".to_owned()],
            distance: None,
        })
        .unwrap();

    let scene = controller.scene_handle();
    let scene = scene.read();
    assert_eq!(scene.node("A").unwrap().visual, NodeVisual::Selected);
    assert_eq!(scene.node("C").unwrap().visual, NodeVisual::Group0);
}

/// Test that a JSON export parses back into a logical graph that installs
/// like any other.
#[tokio::test]
async fn json_export_round_trips_through_import() {
    let graph = LogicalGraph {
        nodes: vec![node("A", 0, 2.0), node("B", 1, 5.0)],
        edges: vec![edge("A", "B")],
    };
    let mut controller = controller_with(graph.clone());
    controller.install_graph(graph).unwrap();
    settle(&controller).await;

    let json = controller.serialize_json().unwrap();
    let export = GraphExport::from_json(&json).unwrap();
    assert_eq!(export.metadata.specie, "r6");

    let recovered = export.into_logical();
    let ids: HashSet<String> = recovered.nodes.iter().map(|n| n.id.clone()).collect();
    assert_eq!(ids, HashSet::from(["A".to_owned(), "B".to_owned()]));
    assert_eq!(recovered.edges.len(), 1);

    let mut second = controller_with(sample_graph());
    second.install_graph(recovered).unwrap();
    settle(&second).await;
    assert_eq!(second.links_of("A"), vec![LinkKey::new("A", "B")]);
}

/// Test the tabular export end to end: one line per raw interaction
/// record, and nothing for links the logical edge set no longer holds.
#[tokio::test]
async fn tabular_export_follows_the_logical_edge_set() {
    let evidence = HomologyEvidence {
        low_query: vec![HomologyParameter {
            valid: true,
            identity: 51.0,
            ..Default::default()
        }],
        high_query: Vec::new(),
        records: vec![InteractionRecord::new(["uniprotkb:A", "uniprotkb:B"])],
    };
    let graph = LogicalGraph {
        nodes: vec![node("A", 0, 1.0), node("B", 0, 1.0)],
        edges: vec![LogicalEdge {
            source: "A".to_owned(),
            target: "B".to_owned(),
            evidence,
        }],
    };
    let mut controller = controller_with(graph.clone());
    controller.install_graph(graph).unwrap();
    settle(&controller).await;

    assert_eq!(
        controller.serialize_tabular(),
        "A\tB\t51\tuniprotkb:A\tuniprotkb:B\n"
    );

    // A prune down to a single node evicts (A,B) from the logical edge
    // set; the rendered link is now stale and must not be exported.
    controller
        .handle_topology_event(TopologyEvent::PruneChanged {
            seeds: vec!["A".to_owned()],
            distance: None,
        })
        .unwrap();
    assert_eq!(controller.serialize_tabular(), "");
}

/// Test that export rejects unknown kinds, and image export fails loudly
/// without a capture hook.
#[tokio::test]
async fn unknown_export_kind_is_rejected() {
    let controller = controller_with(sample_graph());

    assert!(matches!(
        controller.export("xml", "graph"),
        Err(ViewError::UnknownExport(_))
    ));
    assert!(matches!(
        controller.export("image", "graph"),
        Err(ViewError::ImageCapture(_))
    ));
}

/// Test that image export goes through the registered capture hook and
/// wraps its bytes into a named artifact.
#[tokio::test]
async fn image_export_uses_the_capture_hook() {
    let mut controller = controller_with(sample_graph());
    controller.set_image_capture(Box::new(|name| {
        assert_eq!(name, "snapshot");
        Ok(vec![0x89, 0x50])
    }));

    let artifact = controller.export("image", "snapshot").unwrap();
    assert_eq!(artifact.filename, "snapshot.png");
    assert_eq!(artifact.mime, "image/png");
    assert_eq!(artifact.bytes, vec![0x89, 0x50]);
}

/// Test that a specie change is a full reset under a new label.
#[tokio::test]
async fn specie_change_resets_the_view() {
    let mut controller = controller_with(sample_graph());
    controller.install_graph(sample_graph()).unwrap();
    settle(&controller).await;

    controller
        .handle_topology_event(TopologyEvent::SpecieChanged("Mtb".to_owned()))
        .unwrap();

    assert_eq!(controller.specie(), "mtb");
    assert!(controller.scene_handle().read().is_empty());
    assert!(controller.links_of("A").is_empty());
}

/// Test the click surface: in selection mode clicks toggle membership,
/// outside it they request the node card.
#[tokio::test]
async fn selection_mode_click_toggles_membership() {
    let mut controller = controller_with(sample_graph());
    let mut notifications = controller.subscribe();
    controller.install_graph(sample_graph()).unwrap();
    settle(&controller).await;

    controller.handle_selection_event(SelectionEvent::EnterSelectionMode);
    controller.node_clicked("A");
    controller.node_clicked("A");
    controller.handle_selection_event(SelectionEvent::ExitSelectionMode);
    controller.node_clicked("A");

    let mut saw_add = false;
    let mut saw_remove = false;
    let mut saw_card = false;
    while let Ok(notification) = notifications.try_recv() {
        match notification {
            Notification::SelectionAdded(ids) if ids == vec!["A".to_owned()] => saw_add = true,
            Notification::SelectionRemoved(id) if id == "A" => saw_remove = true,
            Notification::NodeCardRequested(id) if id == "A" => saw_card = true,
            _ => {}
        }
    }
    assert!(saw_add && saw_remove && saw_card);
}

/// Test that a reheat merges new data without discarding the rendered
/// graph and re-enables every hidden object first.
#[tokio::test]
async fn reheat_merges_and_unclips() {
    let mut controller = controller_with(sample_graph());
    controller.install_graph(sample_graph()).unwrap();
    settle(&controller).await;

    controller
        .handle_topology_event(TopologyEvent::PruneChanged {
            seeds: vec!["A".to_owned(), "B".to_owned()],
            distance: None,
        })
        .unwrap();
    assert_eq!(controller.scene_handle().read().visible_counts(), (2, 1));

    let extra = LogicalGraph {
        nodes: vec![node("D", 1, 4.0)],
        edges: vec![edge("C", "D")],
    };
    controller
        .handle_topology_event(TopologyEvent::Reheat { graph: Some(extra) })
        .unwrap();
    settle(&controller).await;

    let scene = controller.scene_handle();
    {
        let scene = scene.read();
        assert_eq!(scene.node_count(), 4);
        assert_eq!(scene.link_count(), 3);
        // The earlier clip is undone.
        assert!(scene.node("C").unwrap().visible);
    }
    assert_eq!(controller.links_of("D"), vec![LinkKey::new("C", "D")]);
}

/// Test that removing nodes drops their links, rebuilds the index and
/// updates the counts.
#[tokio::test]
async fn remove_nodes_rebuilds_counts_and_index() {
    let mut controller = controller_with(sample_graph());
    controller.install_graph(sample_graph()).unwrap();
    settle(&controller).await;

    controller.remove_nodes(["B"]);
    settle(&controller).await;

    let scene = controller.scene_handle();
    {
        let scene = scene.read();
        assert_eq!(scene.node_count(), 2);
        assert_eq!(scene.link_count(), 0);
    }
    assert!(controller.links_of("A").is_empty());
}
