//! The cloneable viewport handle.
//!
//! Commands round-trip through the coordinator; queries read the shared
//! registries directly and never wait on it. Scene workers run on blocking
//! threads, so the context layer uses the `_blocking` variants.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::driver::{Driver, DriverId};
use crate::errors::ViewPortError;
use crate::graph::Graph;
use crate::input::{InputClass, InputClasses, InputEvent};
use crate::math::Point;
use crate::primitive::{ElementId, PrimitiveKind};
use crate::scene::{Scene, SceneId};
use crate::script::{GraphId, Script};
use crate::semantic::{SemanticEntry, SemanticTree};
use crate::theme::Theme;
use crate::viewport::commands::{PutOutcome, SceneFactory, ViewPortCommand};
use crate::viewport::registry::Registries;
use crate::viewport::ViewPortId;

#[derive(Clone)]
pub struct ViewPortHandle {
    id: ViewPortId,
    cmd_tx: mpsc::Sender<ViewPortCommand>,
    registries: Arc<Registries>,
}

impl std::fmt::Debug for ViewPortHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewPortHandle")
            .field("id", &self.id)
            .finish()
    }
}

impl ViewPortHandle {
    pub(crate) fn new(
        id: ViewPortId,
        cmd_tx: mpsc::Sender<ViewPortCommand>,
        registries: Arc<Registries>,
    ) -> Self {
        Self {
            id,
            cmd_tx,
            registries,
        }
    }

    pub fn id(&self) -> ViewPortId {
        self.id
    }

    // ------------------------------------------------------------------
    // command round-trips

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ViewPortCommand,
    ) -> Result<T, ViewPortError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .await
            .map_err(|_| ViewPortError::ChannelClosed)?;
        rx.await.map_err(|_| ViewPortError::ChannelClosed)
    }

    fn request_blocking<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ViewPortCommand,
    ) -> Result<T, ViewPortError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .blocking_send(build(tx))
            .map_err(|_| ViewPortError::ChannelClosed)?;
        rx.blocking_recv().map_err(|_| ViewPortError::ChannelClosed)
    }

    async fn send(&self, cmd: ViewPortCommand) -> Result<(), ViewPortError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| ViewPortError::ChannelClosed)
    }

    /// Compile `graph` and register it under `id`, owned by `owner`.
    pub async fn put_graph(
        &self,
        id: impl Into<GraphId>,
        graph: Graph,
        owner: SceneId,
    ) -> Result<PutOutcome, ViewPortError> {
        let id = id.into();
        self.request(move |reply| ViewPortCommand::PutGraph {
            id,
            graph,
            owner,
            reply,
        })
        .await?
    }

    /// Register a pre-built script. No input list, no semantic snapshot.
    pub async fn put_script(
        &self,
        id: impl Into<GraphId>,
        script: Script,
        owner: SceneId,
    ) -> Result<PutOutcome, ViewPortError> {
        let id = id.into();
        self.request(move |reply| ViewPortCommand::PutScript {
            id,
            script,
            owner,
            reply,
        })
        .await?
    }

    pub async fn del_graph(&self, id: impl Into<GraphId>) -> Result<(), ViewPortError> {
        let id = id.into();
        self.request(move |reply| ViewPortCommand::DelGraph { id, reply })
            .await?
    }

    /// Replace the root scene. The factory is retained so the root subtree
    /// can be rebuilt on theme changes.
    pub async fn set_root<F>(
        &self,
        name: impl Into<String>,
        factory: F,
    ) -> Result<SceneId, ViewPortError>
    where
        F: Fn() -> Box<dyn Scene> + Send + Sync + 'static,
    {
        let name = name.into();
        let factory: SceneFactory = Arc::new(factory);
        self.request(move |reply| ViewPortCommand::SetRoot {
            name,
            factory,
            reply,
        })
        .await?
    }

    /// Supervisor hook: stop a scene (and its children) from outside.
    pub async fn terminate_scene(&self, id: SceneId) -> Result<(), ViewPortError> {
        self.request(move |reply| ViewPortCommand::TerminateScene { id, reply })
            .await?
    }

    pub async fn attach_driver(&self, driver: Box<dyn Driver>) -> Result<DriverId, ViewPortError> {
        self.request(move |reply| ViewPortCommand::AttachDriver { driver, reply })
            .await
    }

    pub async fn detach_driver(&self, id: DriverId) -> Result<(), ViewPortError> {
        self.send(ViewPortCommand::DetachDriver { id }).await
    }

    /// Feed one raw input event into the router.
    pub async fn input(&self, event: InputEvent) -> Result<(), ViewPortError> {
        self.send(ViewPortCommand::Input { event }).await
    }

    /// Declare a minimum dispatch interval for a high-frequency class.
    pub async fn set_input_rate_limit(
        &self,
        class: InputClass,
        interval: Duration,
    ) -> Result<(), ViewPortError> {
        self.send(ViewPortCommand::SetRateLimit { class, interval })
            .await
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), ViewPortError> {
        self.send(ViewPortCommand::SetTheme { theme }).await
    }

    pub async fn resize(&self, width: u32, height: u32) -> Result<(), ViewPortError> {
        self.send(ViewPortCommand::Resize { width, height }).await
    }

    /// Inject a synthetic click at an element's center. Goes through the
    /// input router like driver input, so captures and hit-testing apply.
    pub async fn click(&self, id: impl Into<ElementId>) -> Result<(), ViewPortError> {
        let id = id.into();
        self.request(move |reply| ViewPortCommand::Click { id, reply })
            .await?
    }

    pub async fn shutdown(&self) -> Result<(), ViewPortError> {
        self.request(|reply| ViewPortCommand::Shutdown { reply })
            .await
    }

    // ------------------------------------------------------------------
    // blocking variants for scene workers

    pub(crate) fn put_graph_blocking(
        &self,
        id: GraphId,
        graph: Graph,
        owner: SceneId,
    ) -> Result<PutOutcome, ViewPortError> {
        self.request_blocking(move |reply| ViewPortCommand::PutGraph {
            id,
            graph,
            owner,
            reply,
        })?
    }

    pub(crate) fn put_script_blocking(
        &self,
        id: GraphId,
        script: Script,
        owner: SceneId,
    ) -> Result<PutOutcome, ViewPortError> {
        self.request_blocking(move |reply| ViewPortCommand::PutScript {
            id,
            script,
            owner,
            reply,
        })?
    }

    pub(crate) fn del_graph_blocking(&self, id: GraphId) -> Result<(), ViewPortError> {
        self.request_blocking(move |reply| ViewPortCommand::DelGraph { id, reply })?
    }

    pub(crate) fn request_input_blocking(
        &self,
        scene: SceneId,
        classes: InputClasses,
    ) -> Result<(), ViewPortError> {
        self.cmd_tx
            .blocking_send(ViewPortCommand::RequestInput { scene, classes })
            .map_err(|_| ViewPortError::ChannelClosed)
    }

    pub(crate) fn release_input_blocking(
        &self,
        scene: SceneId,
        classes: InputClasses,
    ) -> Result<(), ViewPortError> {
        self.cmd_tx
            .blocking_send(ViewPortCommand::ReleaseInput { scene, classes })
            .map_err(|_| ViewPortError::ChannelClosed)
    }

    pub(crate) fn capture_input_blocking(
        &self,
        scene: SceneId,
        classes: InputClasses,
    ) -> Result<(), ViewPortError> {
        self.cmd_tx
            .blocking_send(ViewPortCommand::CaptureInput { scene, classes })
            .map_err(|_| ViewPortError::ChannelClosed)
    }

    pub(crate) fn release_capture_blocking(
        &self,
        scene: SceneId,
        classes: InputClasses,
    ) -> Result<(), ViewPortError> {
        self.cmd_tx
            .blocking_send(ViewPortCommand::ReleaseCapture { scene, classes })
            .map_err(|_| ViewPortError::ChannelClosed)
    }

    pub(crate) fn start_child_blocking(
        &self,
        parent: SceneId,
        scene: Box<dyn Scene>,
        host_element: Option<ElementId>,
    ) -> Result<(SceneId, GraphId), ViewPortError> {
        self.request_blocking(move |reply| ViewPortCommand::StartChild {
            parent,
            scene,
            host_element,
            reply,
        })?
    }

    // ------------------------------------------------------------------
    // concurrent reads

    /// The registered script for a graph id, if any. Reads the registry
    /// directly; never waits on the coordinator.
    pub fn get_script(&self, id: impl Into<GraphId>) -> Option<Arc<Script>> {
        self.registries.get_script(&id.into())
    }

    pub fn list_script_ids(&self) -> Vec<GraphId> {
        self.registries.list_ids()
    }

    // ------------------------------------------------------------------
    // semantic queries

    fn semantics_guard(&self) -> Result<(), ViewPortError> {
        if self.registries.semantics_enabled() {
            Ok(())
        } else {
            Err(ViewPortError::SemanticDisabled)
        }
    }

    /// O(1) lookup through the global id index.
    pub fn find_by_id(&self, id: impl Into<ElementId>) -> Result<SemanticEntry, ViewPortError> {
        self.semantics_guard()?;
        let id = id.into();
        let (graph, _) = self
            .registries
            .lookup_id(&id)
            .ok_or(ViewPortError::NotFound)?;
        self.registries
            .snapshot(&graph)
            .and_then(|snap| snap.get(&id).cloned())
            .ok_or(ViewPortError::NotFound)
    }

    pub fn find_by_type(&self, kind: &str) -> Result<Vec<SemanticEntry>, ViewPortError> {
        self.semantics_guard()?;
        let mut out = Vec::new();
        for (_, snap) in self.registries.snapshots() {
            for id in snap.ids_of_type(kind) {
                if let Some(entry) = snap.get(id) {
                    out.push(entry.clone());
                }
            }
        }
        Ok(out)
    }

    pub fn find_by_role(&self, role: &str) -> Result<Vec<SemanticEntry>, ViewPortError> {
        self.semantics_guard()?;
        let mut out = Vec::new();
        for (_, snap) in self.registries.snapshots() {
            for id in snap.ids_of_role(role) {
                if let Some(entry) = snap.get(id) {
                    out.push(entry.clone());
                }
            }
        }
        Ok(out)
    }

    pub fn find_by_primitive(
        &self,
        module: PrimitiveKind,
    ) -> Result<Vec<SemanticEntry>, ViewPortError> {
        self.semantics_guard()?;
        let mut out = Vec::new();
        for (_, snap) in self.registries.snapshots() {
            for id in snap.ids_of_primitive(module) {
                if let Some(entry) = snap.get(id) {
                    out.push(entry.clone());
                }
            }
        }
        Ok(out)
    }

    /// Elements whose screen bounds contain the point, topmost first.
    pub fn elements_at_point(&self, x: f32, y: f32) -> Result<Vec<SemanticEntry>, ViewPortError> {
        self.semantics_guard()?;
        let p = Point::new(x, y);
        let mut out: Vec<SemanticEntry> = Vec::new();
        for (_, snap) in self.registries.snapshots() {
            out.extend(snap.entries_at_point(p).into_iter().cloned());
        }
        // stable: preserves each snapshot's own paint-order tie-break
        out.sort_by(|a, b| b.z_index.cmp(&a.z_index));
        Ok(out)
    }

    /// Rebuild the element hierarchy under `root_id`.
    pub fn tree(&self, root_id: impl Into<ElementId>) -> Result<SemanticTree, ViewPortError> {
        self.semantics_guard()?;
        let id = root_id.into();
        let (graph, _) = self
            .registries
            .lookup_id(&id)
            .ok_or(ViewPortError::NotFound)?;
        let snap = self
            .registries
            .snapshot(&graph)
            .ok_or(ViewPortError::NotFound)?;
        SemanticTree::build(&snap, &id).ok_or(ViewPortError::NotFound)
    }
}
