//! Scenes: application-owned producers of graphs and consumers of input.
//!
//! Each scene runs on its own blocking worker thread with a mailbox the
//! viewport delivers into. Handler methods are plain synchronous Rust; the
//! [`SceneContext`] round-trips to the coordinator under the hood, so
//! `push_graph` returns compile errors directly to the caller.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::errors::ViewPortError;
use crate::graph::Graph;
use crate::input::{InputClass, InputClasses, InputEvent};
use crate::math::Point;
use crate::primitive::ElementId;
use crate::script::{GraphId, Script};
use crate::theme::Theme;
use crate::viewport::{PutOutcome, ViewPortHandle, ViewPortId};

/// A unique identifier for a scene.
///
/// Internally a [`Uuid`] wrapper; treat it as an opaque handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(Uuid);

impl SceneId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle notifications delivered outside the input path.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneLifecycle {
    ThemeChanged(Theme),
    Resized { width: u32, height: u32 },
    /// A capture this scene now tops landed on it because the previous
    /// holder went away mid-gesture.
    CaptureLost(InputClass),
    Shutdown,
}

/// Context attached to a delivered input event.
#[derive(Debug, Clone, PartialEq)]
pub struct InputContext {
    /// Id of the hit primitive, when the event was resolved by hit testing.
    pub element_id: Option<ElementId>,
    /// Event coordinate in the hit primitive's (or capturer's) local space.
    pub local: Option<Point>,
    pub viewport_id: ViewPortId,
}

/// What the viewport delivers into a scene's mailbox.
#[derive(Debug)]
pub(crate) enum SceneMessage {
    Input {
        event: InputEvent,
        context: InputContext,
    },
    Lifecycle(SceneLifecycle),
}

/// An application scene.
///
/// `init` runs once on the scene's worker before any event arrives and
/// normally pushes the first graph. All methods run on the same worker
/// thread, one message at a time, in delivery order.
pub trait Scene: Send + 'static {
    fn name(&self) -> &str {
        "scene"
    }

    fn init(&mut self, ctx: &mut SceneContext) -> anyhow::Result<()>;

    fn handle_input(&mut self, event: InputEvent, context: &InputContext, ctx: &mut SceneContext) {
        let _ = (event, context, ctx);
    }

    fn handle_lifecycle(&mut self, event: SceneLifecycle, ctx: &mut SceneContext) {
        let _ = (event, ctx);
    }
}

/// The scene's window into the viewport.
pub struct SceneContext {
    scene_id: SceneId,
    graph_id: GraphId,
    viewport: ViewPortHandle,
}

impl SceneContext {
    pub(crate) fn new(scene_id: SceneId, graph_id: GraphId, viewport: ViewPortHandle) -> Self {
        Self {
            scene_id,
            graph_id,
            viewport,
        }
    }

    pub fn scene_id(&self) -> SceneId {
        self.scene_id
    }

    /// The graph id this scene's primary graph registers under.
    pub fn graph_id(&self) -> &GraphId {
        &self.graph_id
    }

    /// The viewport handle, for queries and advanced calls.
    pub fn viewport(&self) -> &ViewPortHandle {
        &self.viewport
    }

    /// Compile and register this scene's graph under its primary id.
    pub fn push_graph(&self, graph: Graph) -> Result<PutOutcome, ViewPortError> {
        self.viewport
            .put_graph_blocking(self.graph_id.clone(), graph, self.scene_id)
    }

    /// Compile and register a graph under an explicit id, still owned by
    /// this scene.
    pub fn push_graph_as(
        &self,
        id: impl Into<GraphId>,
        graph: Graph,
    ) -> Result<PutOutcome, ViewPortError> {
        self.viewport
            .put_graph_blocking(id.into(), graph, self.scene_id)
    }

    /// Register a pre-built script. No input list, no semantics.
    pub fn push_script(
        &self,
        id: impl Into<GraphId>,
        script: Script,
    ) -> Result<PutOutcome, ViewPortError> {
        self.viewport
            .put_script_blocking(id.into(), script, self.scene_id)
    }

    pub fn del_graph(&self, id: impl Into<GraphId>) -> Result<(), ViewPortError> {
        self.viewport.del_graph_blocking(id.into())
    }

    /// Subscribe to an input class set, non-exclusively.
    pub fn request_input(&self, classes: InputClasses) -> Result<(), ViewPortError> {
        self.viewport.request_input_blocking(self.scene_id, classes)
    }

    pub fn release_input(&self, classes: InputClasses) -> Result<(), ViewPortError> {
        self.viewport.release_input_blocking(self.scene_id, classes)
    }

    /// Take exclusive hold of an input class set. Captures stack; the most
    /// recent capturer wins until it releases.
    pub fn capture_input(&self, classes: InputClasses) -> Result<(), ViewPortError> {
        self.viewport.capture_input_blocking(self.scene_id, classes)
    }

    pub fn release_capture(&self, classes: InputClasses) -> Result<(), ViewPortError> {
        self.viewport
            .release_capture_blocking(self.scene_id, classes)
    }

    /// Start a child scene under this one. Returns the child's scene id
    /// and the graph id its output registers under; reference it from this
    /// scene's graph with a `component_ref` primitive pointing at that
    /// graph id. `host_element` links the child's semantic entries under
    /// the hosting element.
    pub fn start_child(
        &self,
        scene: Box<dyn Scene>,
        host_element: Option<ElementId>,
    ) -> Result<(SceneId, GraphId), ViewPortError> {
        self.viewport
            .start_child_blocking(self.scene_id, scene, host_element)
    }
}

/// Drains a scene's mailbox on a blocking worker thread.
pub(crate) struct SceneWorker {
    scene: Box<dyn Scene>,
    ctx: SceneContext,
    rx: mpsc::Receiver<SceneMessage>,
}

impl SceneWorker {
    pub(crate) fn new(
        scene: Box<dyn Scene>,
        ctx: SceneContext,
        rx: mpsc::Receiver<SceneMessage>,
    ) -> Self {
        Self { scene, ctx, rx }
    }

    pub(crate) fn run(mut self) {
        if let Err(err) = self.scene.init(&mut self.ctx) {
            tracing::warn!(
                scene = self.scene.name(),
                %err,
                "scene init failed, stopping"
            );
            return;
        }

        while let Some(msg) = self.rx.blocking_recv() {
            match msg {
                SceneMessage::Input { event, context } => {
                    self.scene.handle_input(event, &context, &mut self.ctx)
                }
                SceneMessage::Lifecycle(SceneLifecycle::Shutdown) => {
                    self.scene
                        .handle_lifecycle(SceneLifecycle::Shutdown, &mut self.ctx);
                    break;
                }
                SceneMessage::Lifecycle(event) => {
                    self.scene.handle_lifecycle(event, &mut self.ctx)
                }
            }
        }
    }
}
