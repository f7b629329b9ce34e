//! Animation Overlay
//!
//! Per-node, interval-driven animations layered over the scene, each
//! independently cancelable. The engine uses a single concrete animation:
//! an infinite scale pulse, 1x -> 3x -> 1x with 700 ms legs, restarted on
//! every repaint for nodes in the history-hover set.
//!
//! `cancel_all` is invoked at the start of every repaint pass so stale
//! pulses never survive a highlight-state change. It clears the shared
//! timeline and forcibly resets every affected node's scale to identity: a
//! mid-pulse node must never be stranded at a non-default scale.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::scene::Scene;

/// Duration of one leg of the scale pulse (1x -> 3x, then 3x -> 1x).
pub const PULSE_LEG_MS: u64 = 700;
/// Tick interval of the pulse animation: one full cycle.
pub const PULSE_INTERVAL_MS: u64 = 2 * PULSE_LEG_MS;

/// Shared animation timeline: the set of pulses currently running, sampled
/// by the renderer each frame.
#[derive(Debug, Default)]
pub struct Timeline {
    pulses: Mutex<HashMap<String, PulseState>>,
}

#[derive(Debug, Clone, Copy)]
struct PulseState {
    started: Instant,
    leg: Duration,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the scale pulse for a node.
    pub fn begin_pulse(&self, node_id: &str, leg: Duration) {
        self.pulses.lock().insert(
            node_id.to_owned(),
            PulseState {
                started: Instant::now(),
                leg,
            },
        );
    }

    /// Sample the scale of a node's pulse at the given instant. Nodes with
    /// no pulse are at identity. The pulse loops: up one leg, down the next.
    pub fn scale_of(&self, node_id: &str, at: Instant) -> f32 {
        let pulses = self.pulses.lock();
        let Some(pulse) = pulses.get(node_id) else {
            return 1.0;
        };

        let leg = pulse.leg.as_secs_f32();
        if leg == 0.0 {
            return 1.0;
        }
        let elapsed = at.saturating_duration_since(pulse.started).as_secs_f32();
        let phase = elapsed % (2.0 * leg);
        if phase < leg {
            1.0 + 2.0 * (phase / leg)
        } else {
            3.0 - 2.0 * ((phase - leg) / leg)
        }
    }

    /// Drop every running pulse.
    pub fn remove_all(&self) {
        self.pulses.lock().clear();
    }

    pub fn active(&self) -> usize {
        self.pulses.lock().len()
    }
}

/// Periodic callback invoked with the node id and the shared timeline.
pub type TickFn = Arc<dyn Fn(&str, &Timeline) + Send + Sync>;
/// Invoked when an animation is cancelled.
pub type CancelFn = Arc<dyn Fn(&str, &Timeline) + Send + Sync>;

struct Animation {
    task: JoinHandle<()>,
    on_cancel: Option<CancelFn>,
}

/// Registry of running per-node animations.
///
/// `start` spawns a tokio task, so the overlay must be driven from within a
/// runtime. Tasks only touch the scene through its shared lock.
pub struct AnimationOverlay {
    scene: Arc<RwLock<Scene>>,
    timeline: Arc<Timeline>,
    animations: DashMap<String, SmallVec<[Animation; 2]>>,
}

impl AnimationOverlay {
    pub fn new(scene: Arc<RwLock<Scene>>) -> Self {
        Self {
            scene,
            timeline: Arc::new(Timeline::new()),
            animations: DashMap::new(),
        }
    }

    pub fn timeline(&self) -> Arc<Timeline> {
        Arc::clone(&self.timeline)
    }

    /// Register a periodic animation for a node. The tick fires once
    /// immediately, then every `every`, until cancelled.
    pub fn start(
        &self,
        node_id: &str,
        tick: TickFn,
        every: Duration,
        on_cancel: Option<CancelFn>,
    ) {
        let id = node_id.to_owned();
        let timeline = Arc::clone(&self.timeline);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                tick(&id, &timeline);
            }
        });

        self.animations
            .entry(node_id.to_owned())
            .or_default()
            .push(Animation { task, on_cancel });
    }

    /// Start the standard history-hover scale pulse for a node.
    pub fn pulse(&self, node_id: &str) {
        let leg = Duration::from_millis(PULSE_LEG_MS);

        let scene = Arc::clone(&self.scene);
        let tick: TickFn = Arc::new(move |id, timeline| {
            timeline.begin_pulse(id, leg);
            let scale = timeline.scale_of(id, Instant::now());
            scene.write().set_scale(id, scale);
        });

        let scene = Arc::clone(&self.scene);
        let on_cancel: CancelFn = Arc::new(move |id, _| {
            scene.write().set_scale(id, 1.0);
        });

        self.start(
            node_id,
            tick,
            Duration::from_millis(PULSE_INTERVAL_MS),
            Some(on_cancel),
        );
    }

    /// Stop every animation of one node and run its cancel callbacks.
    pub fn cancel_for(&self, node_id: &str) {
        if let Some((_, animations)) = self.animations.remove(node_id) {
            for animation in animations {
                animation.task.abort();
                if let Some(on_cancel) = &animation.on_cancel {
                    on_cancel(node_id, &self.timeline);
                }
            }
        }
    }

    /// Stop everything: clear the timeline, abort every task, run every
    /// cancel callback and force every affected node back to identity
    /// scale.
    pub fn cancel_all(&self) {
        self.timeline.remove_all();

        let ids: Vec<String> = self.animations.iter().map(|e| e.key().clone()).collect();
        if !ids.is_empty() {
            debug!(nodes = ids.len(), "cancelling all animations");
        }

        for id in ids {
            if let Some((_, animations)) = self.animations.remove(&id) {
                for animation in animations {
                    animation.task.abort();
                    if let Some(on_cancel) = &animation.on_cancel {
                        on_cancel(&id, &self.timeline);
                    }
                }
            }
            self.scene.write().set_scale(&id, 1.0);
        }
    }

    /// Number of nodes with at least one running animation.
    pub fn animated_nodes(&self) -> usize {
        self.animations.len()
    }
}
