//! Scene nodes and their visual states.

use serde::{Deserialize, Serialize};

/// The closed set of visual states a node can resolve to.
///
/// The highlight state machine resolves into this enum with a pure function;
/// only the renderer boundary turns a variant into an actual material. Hover
/// and history-hover share the hover color: both sit on the same precedence
/// tier, one driven by the pointer and one by sibling UI elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeVisual {
    /// Hover driven by a card/table/chart component.
    HistoryHover,
    /// Pointer hover.
    Hover,
    /// Member of the current selection.
    Selected,
    /// Default color for group-1 nodes.
    Group1,
    /// Default color for group-0 nodes.
    Group0,
}

impl NodeVisual {
    /// The default visual for a node of the given group.
    pub fn for_group(group: u8) -> Self {
        if group == 0 {
            Self::Group0
        } else {
            Self::Group1
        }
    }

    /// CSS color the renderer applies for this state.
    pub fn color(&self) -> &'static str {
        match self {
            Self::HistoryHover | Self::Hover => "rgb(255,0,0)",
            Self::Selected => "#FFA500",
            Self::Group0 => "#607AC1",
            Self::Group1 => "#60C183",
        }
    }
}

/// A rendered node. Identity is the only durable key; position is owned by
/// the renderer's physics tick and may be unset right after creation. The
/// engine mutates only `group`, `visible`, `visual` and `scale` in place,
/// never the node's identity, so index and highlight references stay valid
/// across renderer ticks.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: String,
    pub group: u8,
    pub value: f64,
    /// Renderer-owned 3D position; unstable, may be `None` until the first
    /// physics tick.
    pub position: Option<[f32; 3]>,
    pub visible: bool,
    pub visual: NodeVisual,
    /// Uniform scale of the renderable object; identity is 1.0.
    pub scale: f32,
}

impl SceneNode {
    pub fn new(id: impl Into<String>, group: u8, value: f64) -> Self {
        Self {
            id: id.into(),
            group,
            value,
            position: None,
            visible: true,
            visual: NodeVisual::for_group(group),
            scale: 1.0,
        }
    }
}
