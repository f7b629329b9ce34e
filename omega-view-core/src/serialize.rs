//! Graph Serialization
//!
//! A generic fold over the exportable link set: the intersection of the
//! links currently held by the renderer and the last installed logical edge
//! set, in renderer iteration order. Links the renderer still holds but the
//! logical computation dropped are visually stale and silently excluded.
//! Endpoints are resolved through the node arena at read time; a link whose
//! node vanished from the arena is skipped the same way.
//!
//! Two fixed encodings build on the fold: a JSON document (round-trippable,
//! the format the import path accepts back) and a tabular dump of the raw
//! interaction records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ViewError;
use crate::model::{
    HomologyEvidence, LogicalEdge, LogicalGraph, LogicalNode, ParameterSnapshot,
};
use crate::scene::{Scene, SceneLink, SceneNode};

/// Read-only serializer over a scene and the logical edge set it was last
/// synchronized with.
pub struct GraphSerializer<'a> {
    scene: &'a Scene,
    logical_edges: &'a crate::model::LogicalEdgeSet,
}

impl<'a> GraphSerializer<'a> {
    pub fn new(scene: &'a Scene, logical_edges: &'a crate::model::LogicalEdgeSet) -> Self {
        Self {
            scene,
            logical_edges,
        }
    }

    /// Fold an encoder over every logically-valid rendered link. The
    /// accumulator starts as `None`; the encoder receives the link and its
    /// resolved endpoint nodes in renderer iteration order.
    pub fn fold<T, F>(&self, mut encoder: F) -> Option<T>
    where
        F: FnMut(Option<T>, &SceneLink, &SceneNode, &SceneNode) -> Option<T>,
    {
        let mut accumulator = None;
        for link in self.scene.links() {
            let (a, b) = (link.source.id(), link.target.id());
            if !self.logical_edges.has_edge(a, b) {
                continue;
            }
            let (Some(source), Some(target)) = (self.scene.node(a), self.scene.node(b)) else {
                continue;
            };
            accumulator = encoder(accumulator, link, source, target);
        }
        accumulator
    }

    /// JSON export: visible nodes keyed by id, logically-valid links with
    /// their homology evidence, and the parameter snapshot as metadata.
    pub fn to_json(&self, metadata: &ParameterSnapshot) -> Result<String, ViewError> {
        let nodes: BTreeMap<String, NodeExport> = self
            .scene
            .nodes()
            .filter(|n| n.visible)
            .map(|n| {
                (
                    n.id.clone(),
                    NodeExport {
                        value: n.value,
                        group: n.group,
                    },
                )
            })
            .collect();

        let links = self
            .fold(|accumulator: Option<Vec<LinkExport>>, link, source, target| {
                let mut links = accumulator.unwrap_or_default();
                links.push(LinkExport {
                    source: source.id.clone(),
                    target: target.id.clone(),
                    homology: link.evidence.clone(),
                });
                Some(links)
            })
            .unwrap_or_default();

        let export = GraphExport {
            nodes,
            links,
            metadata: metadata.clone(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Tabular export: one line per raw interaction record,
    /// `source <TAB> target <TAB> best_identity <TAB> record fields`.
    pub fn to_tabular(&self) -> String {
        self.fold(|accumulator: Option<String>, link, source, target| {
            let mut out = accumulator.unwrap_or_default();
            let best = link.evidence.best_identity();
            for record in &link.evidence.records {
                out.push_str(&format!(
                    "{}\t{}\t{}\t{}\n",
                    source.id,
                    target.id,
                    best,
                    record.line()
                ));
            }
            Some(out)
        })
        .unwrap_or_default()
    }
}

/// The JSON document shape, accepted back by the import path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: BTreeMap<String, NodeExport>,
    pub links: Vec<LinkExport>,
    pub metadata: ParameterSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExport {
    pub value: f64,
    pub group: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkExport {
    pub source: String,
    pub target: String,
    pub homology: HomologyEvidence,
}

impl GraphExport {
    /// Parse a previously exported document.
    pub fn from_json(text: &str) -> Result<Self, ViewError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Rebuild a logical graph from the document, ready to install.
    pub fn into_logical(self) -> LogicalGraph {
        LogicalGraph {
            nodes: self
                .nodes
                .into_iter()
                .map(|(id, n)| LogicalNode {
                    id,
                    group: n.group,
                    value: n.value,
                })
                .collect(),
            edges: self
                .links
                .into_iter()
                .map(|l| LogicalEdge {
                    source: l.source,
                    target: l.target,
                    evidence: l.homology,
                })
                .collect(),
        }
    }
}

/// The export kinds the download surface accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Image,
    Json,
    Tabular,
}

impl std::str::FromStr for ExportKind {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "json" => Ok(Self::Json),
            "text" | "tabular" => Ok(Self::Tabular),
            other => Err(ViewError::UnknownExport(other.to_owned())),
        }
    }
}

/// A named, downloadable artifact.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HomologyParameter, InteractionRecord, LogicalEdgeSet};

    fn scene_with(
        nodes: &[(&str, u8, f64)],
        edges: &[(&str, &str, HomologyEvidence)],
    ) -> Scene {
        let graph = LogicalGraph {
            nodes: nodes
                .iter()
                .map(|(id, group, value)| LogicalNode {
                    id: (*id).to_owned(),
                    group: *group,
                    value: *value,
                })
                .collect(),
            edges: edges
                .iter()
                .map(|(a, b, evidence)| LogicalEdge {
                    source: (*a).to_owned(),
                    target: (*b).to_owned(),
                    evidence: evidence.clone(),
                })
                .collect(),
        };
        let mut scene = Scene::new();
        scene.install(&graph);
        scene.bind_endpoints();
        scene
    }

    fn edges(pairs: &[(&str, &str)]) -> LogicalEdgeSet {
        let mut set = LogicalEdgeSet::new();
        for (a, b) in pairs {
            set.insert(a, b);
        }
        set
    }

    #[test]
    fn stale_links_are_excluded() {
        let scene = scene_with(
            &[("A", 0, 1.0), ("B", 0, 1.0)],
            &[("A", "B", HomologyEvidence::default())],
        );
        // (A,B) is rendered but absent from the logical edge set.
        let logical = LogicalEdgeSet::new();
        let serializer = GraphSerializer::new(&scene, &logical);

        let count = serializer
            .fold(|acc: Option<usize>, _, _, _| Some(acc.unwrap_or(0) + 1))
            .unwrap_or(0);
        assert_eq!(count, 0);

        let json = serializer.to_json(&ParameterSnapshot::default()).unwrap();
        let export = GraphExport::from_json(&json).unwrap();
        assert!(export.links.is_empty());
    }

    #[test]
    fn json_round_trip_recovers_nodes_and_links() {
        let scene = scene_with(
            &[("A", 0, 2.0), ("B", 1, 5.0)],
            &[("A", "B", HomologyEvidence::default())],
        );
        let logical = edges(&[("A", "B")]);
        let metadata = ParameterSnapshot {
            specie: "r6".to_owned(),
            ..Default::default()
        };

        let json = GraphSerializer::new(&scene, &logical)
            .to_json(&metadata)
            .unwrap();
        let export = GraphExport::from_json(&json).unwrap();

        assert_eq!(export.metadata.specie, "r6");
        assert_eq!(export.nodes["A"], NodeExport { value: 2.0, group: 0 });
        assert_eq!(export.nodes["B"], NodeExport { value: 5.0, group: 1 });
        assert_eq!(export.links.len(), 1);
        assert_eq!(export.links[0].source, "A");
        assert_eq!(export.links[0].target, "B");

        let logical_again = export.into_logical();
        assert_eq!(logical_again.nodes.len(), 2);
        assert_eq!(logical_again.edges.len(), 1);
    }

    #[test]
    fn hidden_nodes_are_left_out_of_json() {
        let mut scene = scene_with(&[("A", 0, 1.0), ("B", 0, 1.0)], &[]);
        scene.node_mut("B").unwrap().visible = false;

        let logical = LogicalEdgeSet::new();
        let json = GraphSerializer::new(&scene, &logical)
            .to_json(&ParameterSnapshot::default())
            .unwrap();
        let export = GraphExport::from_json(&json).unwrap();

        assert!(export.nodes.contains_key("A"));
        assert!(!export.nodes.contains_key("B"));
    }

    #[test]
    fn tabular_lines_carry_best_identity_and_raw_fields() {
        let evidence = HomologyEvidence {
            low_query: vec![HomologyParameter {
                valid: true,
                identity: 45.0,
                ..Default::default()
            }],
            high_query: vec![HomologyParameter {
                valid: true,
                identity: 72.5,
                ..Default::default()
            }],
            records: vec![
                InteractionRecord::new(["uniprotkb:A", "uniprotkb:B"]),
                InteractionRecord::new(["uniprotkb:A", "uniprotkb:B", "score:0.9"]),
            ],
        };
        let scene = scene_with(
            &[("A", 0, 1.0), ("B", 0, 1.0)],
            &[("A", "B", evidence)],
        );
        let logical = edges(&[("A", "B")]);

        let tabular = GraphSerializer::new(&scene, &logical).to_tabular();
        let lines: Vec<&str> = tabular.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "A\tB\t72.5\tuniprotkb:A\tuniprotkb:B");
        assert_eq!(lines[1], "A\tB\t72.5\tuniprotkb:A\tuniprotkb:B\tscore:0.9");
    }

    #[test]
    fn export_kind_parsing() {
        use std::str::FromStr;

        assert_eq!(ExportKind::from_str("json").unwrap(), ExportKind::Json);
        assert_eq!(ExportKind::from_str("text").unwrap(), ExportKind::Tabular);
        assert_eq!(ExportKind::from_str("image").unwrap(), ExportKind::Image);
        assert!(matches!(
            ExportKind::from_str("xml"),
            Err(ViewError::UnknownExport(_))
        ));
    }
}
