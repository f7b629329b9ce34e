//! Link Index
//!
//! A reversible pair-to-link lookup over the rendered link list. The index
//! answers three questions the rest of the engine keeps asking: which link
//! object joins two node ids (in either order), does a pair exist at all,
//! and which links are incident to a given node.
//!
//! # Registration protocol
//!
//! The index is rebuilt by an asynchronous pass after every graph install.
//! The pass never partially indexes: if any link endpoint is still pending
//! renderer binding, the whole pass restarts once the scene's resolution
//! gate fires. Termination is bounded by the renderer's own tick, not by
//! this module. If the renderer never binds (malformed external data) the
//! pass waits forever; that is a documented open risk, surfaced with a
//! warning rather than silently capped. A generation counter lets a pass
//! detect that a newer install superseded it and abandon instead of writing
//! a stale index.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::scene::Scene;

/// A map over unordered pairs of string keys.
///
/// Entries are stored under both key orders, so `get(a, b)` and `get(b, a)`
/// always agree; each unordered pair holds at most one value.
#[derive(Debug, Clone)]
pub struct ReversibleKeyMap<V> {
    inner: HashMap<String, HashMap<String, V>>,
    pairs: usize,
}

impl<V: Clone> ReversibleKeyMap<V> {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
            pairs: 0,
        }
    }

    /// Insert a value for the unordered pair, replacing any previous one.
    pub fn set(&mut self, a: &str, b: &str, value: V) {
        if self.get(a, b).is_none() {
            self.pairs += 1;
        }
        self.inner
            .entry(a.to_owned())
            .or_default()
            .insert(b.to_owned(), value.clone());
        if a != b {
            self.inner
                .entry(b.to_owned())
                .or_default()
                .insert(a.to_owned(), value);
        }
    }

    /// Value for the pair, regardless of which key is queried first.
    pub fn get(&self, a: &str, b: &str) -> Option<&V> {
        self.inner.get(a).and_then(|m| m.get(b))
    }

    /// Whether the unordered pair has a value.
    pub fn has_couple(&self, a: &str, b: &str) -> bool {
        self.get(a, b).is_some()
    }

    /// Every (partner, value) pair reachable from the given key.
    pub fn all_from(&self, key: &str) -> impl Iterator<Item = (&str, &V)> {
        self.inner
            .get(key)
            .into_iter()
            .flat_map(|m| m.iter().map(|(k, v)| (k.as_str(), v)))
    }

    pub fn clear(&mut self) {
        self.inner.clear();
        self.pairs = 0;
    }

    /// Number of unordered pairs held.
    pub fn len(&self) -> usize {
        self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs == 0
    }
}

impl<V: Clone> Default for ReversibleKeyMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pair-to-link lookup over the scene's link list. Values are slots into
/// `Scene::links`; a structural scene change invalidates them, so the owner
/// clears the index and schedules a fresh registration pass.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    map: ReversibleKeyMap<usize>,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, a: &str, b: &str, slot: usize) {
        self.map.set(a, b, slot);
    }

    pub fn get(&self, a: &str, b: &str) -> Option<usize> {
        self.map.get(a, b).copied()
    }

    pub fn has_couple(&self, a: &str, b: &str) -> bool {
        self.map.has_couple(a, b)
    }

    /// All (partner id, link slot) pairs incident to the given node.
    pub fn all_from(&self, id: &str) -> impl Iterator<Item = (&str, usize)> {
        self.map.all_from(id).map(|(k, v)| (k, *v))
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Asynchronous registration pass: index every rendered link once the
/// renderer has bound all endpoints.
///
/// The pass scans the scene under a read lock; if any endpoint is still
/// pending it awaits the scene's resolution gate and rescans from the
/// start. `generation` must match `my_generation` for the result to be
/// written; otherwise a newer install owns the index and this pass quits.
pub async fn register_links(
    scene: Arc<RwLock<Scene>>,
    index: Arc<RwLock<LinkIndex>>,
    generation: Arc<AtomicU64>,
    my_generation: u64,
) {
    loop {
        if generation.load(Ordering::SeqCst) != my_generation {
            debug!(generation = my_generation, "register pass superseded, abandoning");
            return;
        }

        // Subscribe to the gate under the same lock as the scan so a bind
        // between scan and await still wakes us.
        let mut gate = {
            let scene = scene.read();
            let gate = scene.resolution_gate();

            let mut built = LinkIndex::new();
            let mut complete = true;
            for (slot, link) in scene.links().iter().enumerate() {
                match (link.source.bound(), link.target.bound()) {
                    (Some(a), Some(b)) => built.set(a, b, slot),
                    _ => {
                        complete = false;
                        break;
                    }
                }
            }

            if complete {
                if generation.load(Ordering::SeqCst) != my_generation {
                    debug!(generation = my_generation, "register pass superseded, abandoning");
                    return;
                }
                let pairs = built.len();
                *index.write() = built;
                debug!(pairs, "link index registered");
                return;
            }
            gate
        };

        warn!(
            generation = my_generation,
            "link endpoints still unresolved, waiting for renderer"
        );
        if gate.changed().await.is_err() {
            // Scene dropped; nothing left to index.
            return;
        }
    }
}
