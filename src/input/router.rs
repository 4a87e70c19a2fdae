//! Hit testing, input interests, captures, and rate limiting.
//!
//! The router owns no primitives. It reads the paint-ordered input lists
//! the compiler published through the script registry and resolves each
//! positional event to the topmost matching primitive, walking entries in
//! reverse paint order and descending through script and component
//! references with composed transforms.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::ViewPortError;
use crate::input::events::{InputClass, InputClasses, InputEvent};
use crate::math::{Matrix, Point};
use crate::primitive::{ElementId, PrimitiveData, Uid};
use crate::scene::SceneId;
use crate::script::GraphId;

/// One input-eligible primitive in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEntry {
    pub uid: Uid,
    /// Cumulative local-to-graph-root transform at compile time.
    pub transform: Matrix,
    /// Enough of the primitive to run its containment predicate.
    pub shape: PrimitiveData,
    pub owner: SceneId,
    pub classes: InputClasses,
    pub id: Option<ElementId>,
}

/// A paint-ordered input-list node: a testable primitive or a descent into
/// another graph's list.
#[derive(Debug, Clone, PartialEq)]
pub enum InputNode {
    Prim(InputEntry),
    Graph { graph_id: GraphId, transform: Matrix },
}

/// Paint-ordered list of input nodes for one graph. Hit testing traverses
/// it in reverse, so the last-drawn primitive wins overlaps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputList {
    pub nodes: Vec<InputNode>,
}

impl InputList {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A resolved hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub owner: SceneId,
    pub element_id: Option<ElementId>,
    /// Event coordinate in the hit primitive's local space.
    pub local: Point,
    /// The primitive's cumulative transform to global space.
    pub transform: Matrix,
}

/// Find the topmost input-eligible primitive containing `global`, starting
/// from `root`'s input list. `lists` resolves a graph id to its current
/// input list; unresolvable references are skipped. The visited set bounds
/// recursion in the face of (invalid) reference cycles across graphs.
pub fn hit_test<F>(lists: &F, root: &GraphId, class: InputClass, global: Point) -> Option<Hit>
where
    F: Fn(&GraphId) -> Option<Arc<InputList>>,
{
    let mut visited = HashSet::new();
    hit_test_in(lists, root, class, global, Matrix::IDENTITY, &mut visited)
}

fn hit_test_in<F>(
    lists: &F,
    graph_id: &GraphId,
    class: InputClass,
    global: Point,
    outer: Matrix,
    visited: &mut HashSet<GraphId>,
) -> Option<Hit>
where
    F: Fn(&GraphId) -> Option<Arc<InputList>>,
{
    if !visited.insert(graph_id.clone()) {
        return None;
    }
    let list = lists(graph_id)?;

    for node in list.nodes.iter().rev() {
        match node {
            InputNode::Graph {
                graph_id: child,
                transform,
            } => {
                let composed = outer.mul(transform);
                if let Some(hit) = hit_test_in(lists, child, class, global, composed, visited) {
                    return Some(hit);
                }
            }
            InputNode::Prim(entry) => {
                if !entry.classes.contains(class.bit()) {
                    continue;
                }
                let cumulative = outer.mul(&entry.transform);
                let Some(inverse) = cumulative.invert() else {
                    continue;
                };
                let local = inverse.transform_point(global);
                if entry.shape.contains_point(local) {
                    return Some(Hit {
                        owner: entry.owner,
                        element_id: entry.id.clone(),
                        local,
                        transform: cumulative,
                    });
                }
            }
        }
    }

    visited.remove(graph_id);
    None
}

struct RateGate {
    interval: Duration,
    last: Option<Instant>,
    pending: Option<InputEvent>,
}

/// Outcome of offering an event to the rate limiter.
#[derive(Debug, PartialEq, Eq)]
pub enum Admission {
    /// Dispatch now.
    Deliver,
    /// Held back; the latest pending event flushes on the next deadline.
    Coalesced,
}

/// Input interest and capture state for one viewport.
///
/// Requests are non-exclusive subscriptions. Captures stack per class so
/// nested captures unwind naturally; the top of the stack is the active
/// capturer and sees every event of that class exclusively.
#[derive(Default)]
pub struct Router {
    requests: HashMap<InputClass, Vec<SceneId>>,
    captures: HashMap<InputClass, Vec<SceneId>>,
    gates: HashMap<InputClass, RateGate>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, scene: SceneId, classes: InputClasses) {
        for class in classes.classes() {
            let set = self.requests.entry(class).or_default();
            if !set.contains(&scene) {
                set.push(scene);
            }
        }
    }

    pub fn release(&mut self, scene: SceneId, classes: InputClasses) {
        for class in classes.classes() {
            if let Some(set) = self.requests.get_mut(&class) {
                set.retain(|s| *s != scene);
            }
        }
    }

    pub fn capture(&mut self, scene: SceneId, classes: InputClasses) {
        for class in classes.classes() {
            self.captures.entry(class).or_default().push(scene);
        }
    }

    /// Pop the top of each class stack, provided the caller holds it.
    pub fn release_capture(
        &mut self,
        scene: SceneId,
        classes: InputClasses,
    ) -> Result<(), ViewPortError> {
        for class in classes.classes() {
            let stack = self.captures.entry(class).or_default();
            if stack.last() == Some(&scene) {
                stack.pop();
            } else {
                return Err(ViewPortError::InvalidState(format!(
                    "scene {scene} does not hold the {class:?} capture"
                )));
            }
        }
        Ok(())
    }

    /// Drop every request and capture held by a dead scene. Returns the
    /// classes where the scene was the active capturer, paired with the
    /// next holder (who should be told the gesture moved to them).
    pub fn drop_scene(&mut self, scene: SceneId) -> Vec<(InputClass, Option<SceneId>)> {
        for set in self.requests.values_mut() {
            set.retain(|s| *s != scene);
        }

        let mut lost = Vec::new();
        for (class, stack) in self.captures.iter_mut() {
            let was_top = stack.last() == Some(&scene);
            stack.retain(|s| *s != scene);
            if was_top {
                lost.push((*class, stack.last().copied()));
            }
        }
        lost
    }

    pub fn capturer_of(&self, class: InputClass) -> Option<SceneId> {
        self.captures.get(&class).and_then(|s| s.last()).copied()
    }

    pub fn requesters_of(&self, class: InputClass) -> &[SceneId] {
        self.requests.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Declare a minimum dispatch interval for a class. A zero interval
    /// removes the gate.
    pub fn set_rate_limit(&mut self, class: InputClass, interval: Duration) {
        if interval.is_zero() {
            self.gates.remove(&class);
        } else {
            self.gates.insert(
                class,
                RateGate {
                    interval,
                    last: None,
                    pending: None,
                },
            );
        }
    }

    /// Offer an event to the rate limiter. Ungated classes always deliver.
    pub fn admit(&mut self, event: &InputEvent, now: Instant) -> Admission {
        let class = event.class();
        let Some(gate) = self.gates.get_mut(&class) else {
            return Admission::Deliver;
        };
        match gate.last {
            Some(last) if now.duration_since(last) < gate.interval => {
                // keep only the latest
                gate.pending = Some(event.clone());
                Admission::Coalesced
            }
            _ => {
                gate.last = Some(now);
                Admission::Deliver
            }
        }
    }

    /// Release pending events whose interval has elapsed.
    pub fn due_flushes(&mut self, now: Instant) -> Vec<InputEvent> {
        let mut out = Vec::new();
        for gate in self.gates.values_mut() {
            if gate.pending.is_none() {
                continue;
            }
            let due = match gate.last {
                Some(last) => now.duration_since(last) >= gate.interval,
                None => true,
            };
            if due {
                gate.last = Some(now);
                if let Some(ev) = gate.pending.take() {
                    out.push(ev);
                }
            }
        }
        out
    }

    /// Earliest instant a pending coalesced event becomes due.
    pub fn next_flush_deadline(&self) -> Option<Instant> {
        self.gates
            .values()
            .filter(|g| g.pending.is_some())
            .filter_map(|g| g.last.map(|last| last + g.interval))
            .min()
    }
}
