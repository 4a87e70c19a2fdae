//! Commands processed by the coordinator's run loop.
//!
//! Callers that need a synchronous answer carry a `oneshot` reply channel;
//! everything else is fire-and-forget. Ignoring a dead reply receiver is
//! deliberate: the caller gave up waiting, the operation still applies.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::driver::{Driver, DriverId};
use crate::errors::ViewPortError;
use crate::graph::Graph;
use crate::input::{InputClass, InputClasses, InputEvent};
use crate::primitive::ElementId;
use crate::scene::{Scene, SceneId};
use crate::script::{GraphId, Script};
use crate::theme::Theme;

/// What a `put_graph`/`put_script` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The registry swapped in a new generation and drivers were told.
    Updated,
    /// Byte-identical to the registered script: nothing changed, nobody
    /// was notified.
    Unchanged,
}

/// Builds a fresh root scene. Retained so theme changes can re-initialize
/// the root subtree.
pub type SceneFactory = Arc<dyn Fn() -> Box<dyn Scene> + Send + Sync>;

pub(crate) enum ViewPortCommand {
    PutGraph {
        id: GraphId,
        graph: Graph,
        owner: SceneId,
        reply: oneshot::Sender<Result<PutOutcome, ViewPortError>>,
    },
    PutScript {
        id: GraphId,
        script: Script,
        owner: SceneId,
        reply: oneshot::Sender<Result<PutOutcome, ViewPortError>>,
    },
    DelGraph {
        id: GraphId,
        reply: oneshot::Sender<Result<(), ViewPortError>>,
    },
    SetRoot {
        name: String,
        factory: SceneFactory,
        reply: oneshot::Sender<Result<SceneId, ViewPortError>>,
    },
    StartChild {
        parent: SceneId,
        scene: Box<dyn Scene>,
        host_element: Option<ElementId>,
        reply: oneshot::Sender<Result<(SceneId, GraphId), ViewPortError>>,
    },
    /// External supervisor hook: stop a scene and cascade cleanup.
    TerminateScene {
        id: SceneId,
        reply: oneshot::Sender<Result<(), ViewPortError>>,
    },
    /// A scene's worker exited (normally or by panic).
    SceneStopped { id: SceneId },
    AttachDriver {
        driver: Box<dyn Driver>,
        reply: oneshot::Sender<DriverId>,
    },
    DetachDriver { id: DriverId },
    SetRateLimit {
        class: InputClass,
        interval: Duration,
    },
    SetTheme { theme: Theme },
    Resize { width: u32, height: u32 },
    Input { event: InputEvent },
    RequestInput {
        scene: SceneId,
        classes: InputClasses,
    },
    ReleaseInput {
        scene: SceneId,
        classes: InputClasses,
    },
    CaptureInput {
        scene: SceneId,
        classes: InputClasses,
    },
    ReleaseCapture {
        scene: SceneId,
        classes: InputClasses,
    },
    /// Synthetic press/release at an element's center.
    Click {
        id: ElementId,
        reply: oneshot::Sender<Result<(), ViewPortError>>,
    },
    Shutdown { reply: oneshot::Sender<()> },
}
