//! Scene links, endpoint binding state and link keys.

use std::fmt;

use crate::model::HomologyEvidence;

/// An unordered pair of node ids identifying a link.
///
/// The pair is stored in canonical order, so `LinkKey::new(a, b)` and
/// `LinkKey::new(b, a)` are equal and hash identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkKey {
    lo: String,
    hi: String,
}

impl LinkKey {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    pub fn first(&self) -> &str {
        &self.lo
    }

    pub fn second(&self) -> &str {
        &self.hi
    }

    /// Whether the key touches the given node.
    pub fn contains(&self, id: &str) -> bool {
        self.lo == id || self.hi == id
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.lo, self.hi)
    }
}

/// One endpoint of a rendered link.
///
/// Right after a graph install the renderer only knows the raw node id;
/// it binds the endpoint to an actual node object during its own tick.
/// Consumers must tolerate the `Pending` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Raw id, node object not yet acknowledged by the renderer.
    Pending(String),
    /// Renderer has bound the endpoint to the node with this id.
    Bound(String),
}

impl Endpoint {
    /// The node id, available in either state.
    pub fn id(&self) -> &str {
        match self {
            Self::Pending(id) | Self::Bound(id) => id,
        }
    }

    /// The id only once the renderer has bound the endpoint.
    pub fn bound(&self) -> Option<&str> {
        match self {
            Self::Pending(_) => None,
            Self::Bound(id) => Some(id),
        }
    }

    pub fn bind(&mut self) {
        if let Self::Pending(id) = self {
            *self = Self::Bound(std::mem::take(id));
        }
    }
}

/// The closed set of visual states a link can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkVisual {
    /// Hover driven by a sibling UI element.
    HistoryHover,
    /// Selected or pointer-hovered.
    Active,
    Default,
}

impl LinkVisual {
    /// Number of directional particles the renderer runs along the link.
    pub fn particle_count(&self) -> u8 {
        match self {
            Self::HistoryHover | Self::Active => 4,
            Self::Default => 0,
        }
    }
}

/// A rendered link. Endpoints are ids resolved through the node arena at
/// read time; the link never holds node references.
#[derive(Debug, Clone)]
pub struct SceneLink {
    pub source: Endpoint,
    pub target: Endpoint,
    /// Homology metadata owned by the topology engine.
    pub evidence: HomologyEvidence,
    pub visible: bool,
    pub visual: LinkVisual,
}

impl SceneLink {
    pub fn new(source: impl Into<String>, target: impl Into<String>, evidence: HomologyEvidence) -> Self {
        Self {
            source: Endpoint::Pending(source.into()),
            target: Endpoint::Pending(target.into()),
            evidence,
            visible: true,
            visual: LinkVisual::Default,
        }
    }

    pub fn key(&self) -> LinkKey {
        LinkKey::new(self.source.id(), self.target.id())
    }

    /// Whether the renderer has bound both endpoints.
    pub fn is_bound(&self) -> bool {
        self.source.bound().is_some() && self.target.bound().is_some()
    }
}
