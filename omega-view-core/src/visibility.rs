//! Visibility Selection
//!
//! Clipping hides rendered nodes and links without destroying them; the
//! renderer keeps the objects so a later trim/prune can bring them back
//! without a rebuild. A link is shown only when both endpoints are in the
//! target subset *and* the logical edge set confirms the pair: the index can
//! return links whose endpoints are formally visible but which are stale
//! relative to the latest logical edge computation, and those must stay
//! hidden.

use std::collections::HashSet;

use smallvec::SmallVec;
use tracing::debug;

use crate::index::LinkIndex;
use crate::model::LogicalEdgeSet;
use crate::scene::Scene;

/// Restrict visibility to `node_subset` and the logical edges among it.
///
/// An empty subset hides everything; that is a valid state ("graph has no
/// nodes yet"), not an error.
pub fn clip(
    scene: &mut Scene,
    index: &LinkIndex,
    node_subset: &HashSet<String>,
    logical_edges: &LogicalEdgeSet,
) {
    for node in scene.nodes_mut() {
        node.visible = node_subset.contains(&node.id);
    }
    for link in scene.links_mut() {
        link.visible = false;
    }

    let mut shown = 0usize;
    for id in node_subset {
        // Node degree is small in practice; collect to release the index
        // borrow before mutating links.
        let partners: SmallVec<[(String, usize); 8]> = index
            .all_from(id)
            .map(|(partner, slot)| (partner.to_owned(), slot))
            .collect();

        for (partner, slot) in partners {
            if !node_subset.contains(&partner) {
                continue;
            }
            if let Some(link) = scene.link_mut(slot) {
                if !link.visible && logical_edges.has_edge(id, &partner) {
                    link.visible = true;
                    shown += 1;
                }
            }
        }
    }

    debug!(
        nodes = node_subset.len(),
        links = shown,
        "clipped scene to logical subset"
    );
}

/// Make every rendered node and link visible, unconditionally. Used before
/// installing a fresh logical subgraph, or when visibility should be
/// disabled entirely (the first reheat).
pub fn unclip(scene: &mut Scene) {
    for node in scene.nodes_mut() {
        node.visible = true;
    }
    for link in scene.links_mut() {
        link.visible = true;
    }
}
