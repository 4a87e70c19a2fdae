//! The coordinator run loop.
//!
//! The [`ViewPort`] is a single-writer state machine: every mutation of the
//! shared registries goes through its command channel and is applied by one
//! task, which preserves change-detection and notification ordering.
//! Readers (drivers, semantic queries) never enter this loop; they read the
//! registries directly through the handle.
//!
//! The coordinator never blocks on a scene or a driver. Outbound delivery
//! is `try_send` everywhere: a full driver queue drops the notice with a
//! warning, a dead scene mailbox drops the event silently.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::ViewPortConfig;
use crate::driver::{self, Driver, DriverId, DriverNotice};
use crate::errors::ViewPortError;
use crate::graph::compiler::{compile, CompileOptions};
use crate::graph::Graph;
use crate::input::router::{hit_test, Admission, Hit, InputList, InputNode, Router};
use crate::input::{InputClass, InputEvent, Modifiers, MouseButton, PressState};
use crate::math::{Matrix, Point};
use crate::primitive::ElementId;
use crate::scene::{
    InputContext, Scene, SceneContext, SceneId, SceneLifecycle, SceneMessage, SceneWorker,
};
use crate::script::{GraphId, Script};
use crate::semantic::SemanticEntry;
use crate::theme::Theme;
use crate::viewport::commands::{PutOutcome, SceneFactory, ViewPortCommand};
use crate::viewport::registry::{Registries, ScriptEntry};
use crate::viewport::{ViewPortHandle, ViewPortId};

struct SceneRecord {
    mailbox: mpsc::Sender<SceneMessage>,
    parent: Option<SceneId>,
    name: String,
    graph_id: GraphId,
    /// Element in the parent graph hosting this scene's output, used as
    /// the semantic parent for the scene's entries.
    host_element: Option<ElementId>,
}

struct DriverRecord {
    id: DriverId,
    tx: mpsc::Sender<DriverNotice>,
}

enum Flow {
    Continue,
    Stop,
}

/// The coordination core of the runtime.
pub struct ViewPort {
    id: ViewPortId,
    config: ViewPortConfig,
    registries: Arc<Registries>,
    cmd_tx: mpsc::Sender<ViewPortCommand>,
    cmd_rx: mpsc::Receiver<ViewPortCommand>,
    router: Router,
    scenes: HashMap<SceneId, SceneRecord>,
    drivers: Vec<DriverRecord>,
    root: Option<SceneId>,
    root_factory: Option<(String, SceneFactory)>,
    theme: Theme,
    width: u32,
    height: u32,
}

impl ViewPort {
    pub fn new(config: ViewPortConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_capacity);
        let registries = Arc::new(Registries::new(config.enable_semantics));
        let theme = config.theme;
        let (width, height) = (config.width, config.height);
        Self {
            id: ViewPortId::new(),
            config,
            registries,
            cmd_tx,
            cmd_rx,
            router: Router::new(),
            scenes: HashMap::new(),
            drivers: Vec::new(),
            root: None,
            root_factory: None,
            theme,
            width,
            height,
        }
    }

    /// Spawn the command loop, returning the handle and its join handle.
    pub fn start(self) -> (ViewPortHandle, JoinHandle<()>) {
        let handle = self.handle();
        let join = tokio::spawn(self.run());
        (handle, join)
    }

    fn handle(&self) -> ViewPortHandle {
        ViewPortHandle::new(self.id, self.cmd_tx.clone(), self.registries.clone())
    }

    async fn run(mut self) {
        tracing::debug!(viewport = %self.id, "viewport started");
        loop {
            let deadline = self.router.next_flush_deadline();
            tokio::select! {
                maybe_cmd = self.cmd_rx.recv() => {
                    match maybe_cmd {
                        Some(cmd) => {
                            if matches!(self.handle_command(cmd), Flow::Stop) {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = flush_timer(deadline) => {
                    for event in self.router.due_flushes(Instant::now()) {
                        self.dispatch(event);
                    }
                }
            }
        }
        tracing::debug!(viewport = %self.id, "viewport stopped");
    }

    fn handle_command(&mut self, cmd: ViewPortCommand) -> Flow {
        match cmd {
            ViewPortCommand::PutGraph {
                id,
                graph,
                owner,
                reply,
            } => {
                let _ = reply.send(self.put_graph(id, graph, owner));
            }
            ViewPortCommand::PutScript {
                id,
                script,
                owner,
                reply,
            } => {
                let _ = reply.send(self.put_script(id, script, owner));
            }
            ViewPortCommand::DelGraph { id, reply } => {
                let _ = reply.send(self.del_graph(&id));
            }
            ViewPortCommand::SetRoot {
                name,
                factory,
                reply,
            } => {
                let _ = reply.send(self.set_root(name, factory));
            }
            ViewPortCommand::StartChild {
                parent,
                scene,
                host_element,
                reply,
            } => {
                let _ = reply.send(self.start_child(parent, scene, host_element));
            }
            ViewPortCommand::TerminateScene { id, reply } => {
                let _ = reply.send(self.terminate_scene(id));
            }
            ViewPortCommand::SceneStopped { id } => self.scene_stopped(id),
            ViewPortCommand::AttachDriver { driver, reply } => {
                let _ = reply.send(self.attach_driver(driver));
            }
            ViewPortCommand::DetachDriver { id } => self.detach_driver(id),
            ViewPortCommand::SetRateLimit { class, interval } => {
                self.router.set_rate_limit(class, interval);
            }
            ViewPortCommand::SetTheme { theme } => self.set_theme(theme),
            ViewPortCommand::Resize { width, height } => self.resize(width, height),
            ViewPortCommand::Input { event } => self.process_input(event),
            ViewPortCommand::RequestInput { scene, classes } => {
                self.router.request(scene, classes);
            }
            ViewPortCommand::ReleaseInput { scene, classes } => {
                self.router.release(scene, classes);
            }
            ViewPortCommand::CaptureInput { scene, classes } => {
                self.router.capture(scene, classes);
            }
            ViewPortCommand::ReleaseCapture { scene, classes } => {
                if let Err(err) = self.router.release_capture(scene, classes) {
                    tracing::warn!(%err, "capture release refused");
                }
            }
            ViewPortCommand::Click { id, reply } => {
                let _ = reply.send(self.click(&id));
            }
            ViewPortCommand::Shutdown { reply } => {
                self.shutdown();
                let _ = reply.send(());
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    // ------------------------------------------------------------------
    // script registry

    fn put_graph(
        &mut self,
        id: GraphId,
        graph: Graph,
        owner: SceneId,
    ) -> Result<PutOutcome, ViewPortError> {
        let parent_id = self
            .scenes
            .get(&owner)
            .and_then(|r| r.host_element.clone());
        let mut opts = CompileOptions::new(owner).with_semantics(self.config.enable_semantics);
        opts.parent_id = parent_id;

        let compiled = compile(&graph, &opts)?;

        if let Some(existing) = self.registries.get_entry(&id) {
            if existing.script.wire_bytes() == compiled.script.wire_bytes() {
                return Ok(PutOutcome::Unchanged);
            }
        }

        let semantics = compiled.semantics.map(|mut snap| {
            snap.set_timestamp_ms(now_ms());
            Arc::new(snap)
        });
        self.registries.insert(ScriptEntry {
            graph_id: id.clone(),
            script: Arc::new(compiled.script),
            input_list: Arc::new(compiled.input_list),
            semantics,
            owner,
        });
        self.notify_drivers(DriverNotice::ScriptsUpdated(vec![id]));
        Ok(PutOutcome::Updated)
    }

    fn put_script(
        &mut self,
        id: GraphId,
        script: Script,
        owner: SceneId,
    ) -> Result<PutOutcome, ViewPortError> {
        if let Some(existing) = self.registries.get_entry(&id) {
            if existing.script.wire_bytes() == script.wire_bytes() {
                return Ok(PutOutcome::Unchanged);
            }
        }
        self.registries.insert(ScriptEntry {
            graph_id: id.clone(),
            script: Arc::new(script),
            input_list: Arc::new(InputList::default()),
            semantics: None,
            owner,
        });
        self.notify_drivers(DriverNotice::ScriptsUpdated(vec![id]));
        Ok(PutOutcome::Updated)
    }

    fn del_graph(&mut self, id: &GraphId) -> Result<(), ViewPortError> {
        match self.registries.remove(id) {
            Some(_) => {
                self.notify_drivers(DriverNotice::ScriptsDeleted(vec![id.clone()]));
                Ok(())
            }
            None => Err(ViewPortError::NotFound),
        }
    }

    // ------------------------------------------------------------------
    // scene lifecycle

    fn set_root(&mut self, name: String, factory: SceneFactory) -> Result<SceneId, ViewPortError> {
        if let Some(old_root) = self.root.take() {
            self.stop_scene_tree(old_root);
            self.notify_drivers(DriverNotice::ResetScene);
        }
        self.root_factory = Some((name.clone(), factory.clone()));

        let scene = factory();
        let id = self.start_scene(scene, GraphId::root(), None, None, name);
        self.root = Some(id);
        Ok(id)
    }

    fn start_child(
        &mut self,
        parent: SceneId,
        scene: Box<dyn Scene>,
        host_element: Option<ElementId>,
    ) -> Result<(SceneId, GraphId), ViewPortError> {
        if !self.scenes.contains_key(&parent) {
            return Err(ViewPortError::NotFound);
        }
        let graph_id = GraphId::from(uuid::Uuid::new_v4().to_string());
        let name = scene.name().to_string();
        let id = self.start_scene(scene, graph_id.clone(), Some(parent), host_element, name);
        Ok((id, graph_id))
    }

    fn start_scene(
        &mut self,
        scene: Box<dyn Scene>,
        graph_id: GraphId,
        parent: Option<SceneId>,
        host_element: Option<ElementId>,
        name: String,
    ) -> SceneId {
        let scene_id = SceneId::new();
        let (tx, rx) = mpsc::channel(self.config.scene_mailbox_capacity);

        let ctx = SceneContext::new(scene_id, graph_id.clone(), self.handle());
        let worker = SceneWorker::new(scene, ctx, rx);
        let join = tokio::task::spawn_blocking(move || worker.run());

        // observe worker exit (including panics) and report back
        let cmd_tx = self.cmd_tx.clone();
        tokio::spawn(async move {
            let _ = join.await;
            let _ = cmd_tx
                .send(ViewPortCommand::SceneStopped { id: scene_id })
                .await;
        });

        tracing::debug!(scene = %scene_id, %name, graph = %graph_id, "scene started");
        self.scenes.insert(
            scene_id,
            SceneRecord {
                mailbox: tx,
                parent,
                name,
                graph_id,
                host_element,
            },
        );
        scene_id
    }

    fn terminate_scene(&mut self, id: SceneId) -> Result<(), ViewPortError> {
        if !self.scenes.contains_key(&id) {
            return Err(ViewPortError::NotFound);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        self.stop_scene_tree(id);
        Ok(())
    }

    /// A worker exited on its own. Clean up whatever it left behind and
    /// cascade to its children.
    fn scene_stopped(&mut self, id: SceneId) {
        if self.scenes.remove(&id).is_none() {
            return; // already cleaned up through an explicit stop
        }
        tracing::debug!(scene = %id, "scene stopped");
        if self.root == Some(id) {
            self.root = None;
        }
        self.cleanup_scene_resources(id);
        for child in self.children_of(id) {
            self.stop_scene_tree(child);
        }
    }

    fn children_of(&self, parent: SceneId) -> Vec<SceneId> {
        self.scenes
            .iter()
            .filter(|(_, r)| r.parent == Some(parent))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Stop a scene and every descendant: send shutdown, drop mailboxes,
    /// release registry entries and input state.
    fn stop_scene_tree(&mut self, root: SceneId) {
        let mut stack = vec![root];
        let mut tree = Vec::new();
        while let Some(id) = stack.pop() {
            tree.push(id);
            stack.extend(self.children_of(id));
        }

        // children first so parents never observe half-dead subtrees
        for id in tree.into_iter().rev() {
            if let Some(record) = self.scenes.remove(&id) {
                let _ = record
                    .mailbox
                    .try_send(SceneMessage::Lifecycle(SceneLifecycle::Shutdown));
                // record (and mailbox sender) drops here, closing the worker
            }
            self.cleanup_scene_resources(id);
        }
    }

    /// Remove everything a dead scene owned: registry entries, semantic
    /// slices, input requests and captures.
    fn cleanup_scene_resources(&mut self, id: SceneId) {
        let owned = self.registries.owned_by(id);
        if !owned.is_empty() {
            for graph in &owned {
                self.registries.remove(graph);
            }
            self.notify_drivers(DriverNotice::ScriptsDeleted(owned));
        }

        for (class, next_holder) in self.router.drop_scene(id) {
            if let Some(next) = next_holder {
                self.deliver_lifecycle(next, SceneLifecycle::CaptureLost(class));
            }
        }
    }

    // ------------------------------------------------------------------
    // drivers

    fn attach_driver(&mut self, boxed: Box<dyn Driver>) -> DriverId {
        let id = DriverId::new();
        let (tx, rx) = mpsc::channel(self.config.driver_queue_capacity);
        driver::spawn_pump(boxed, rx);

        // fresh queue, these cannot fail
        let _ = tx.try_send(DriverNotice::Theme(self.theme));
        let _ = tx.try_send(DriverNotice::Resize {
            width: self.width,
            height: self.height,
        });
        let _ = tx.try_send(DriverNotice::ScriptsUpdated(self.registries.list_ids()));

        tracing::debug!(driver = %id, "driver attached");
        self.drivers.push(DriverRecord { id, tx });
        id
    }

    fn detach_driver(&mut self, id: DriverId) {
        let before = self.drivers.len();
        self.drivers.retain(|d| d.id != id);
        if self.drivers.len() == before {
            tracing::warn!(driver = %id, "detach of unknown driver");
        }
    }

    fn notify_drivers(&self, notice: DriverNotice) {
        for driver in &self.drivers {
            if let Err(mpsc::error::TrySendError::Full(_)) = driver.tx.try_send(notice.clone()) {
                tracing::warn!(driver = %driver.id, "driver queue full, dropping notice");
            }
        }
    }

    // ------------------------------------------------------------------
    // theme and geometry

    fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.notify_drivers(DriverNotice::Theme(theme));
        for id in self.scene_ids() {
            self.deliver_lifecycle(id, SceneLifecycle::ThemeChanged(theme));
        }

        // the root subtree restarts so everything rebuilds in new colors
        if let Some((name, factory)) = self.root_factory.clone() {
            if let Some(old_root) = self.root.take() {
                self.stop_scene_tree(old_root);
            }
            self.notify_drivers(DriverNotice::ResetScene);
            let scene = factory();
            let id = self.start_scene(scene, GraphId::root(), None, None, name);
            self.root = Some(id);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.notify_drivers(DriverNotice::Resize { width, height });
        for id in self.scene_ids() {
            self.deliver_lifecycle(id, SceneLifecycle::Resized { width, height });
        }
        self.dispatch(InputEvent::Viewport(
            crate::input::ViewportEvent::Reshape { width, height },
        ));
    }

    fn scene_ids(&self) -> Vec<SceneId> {
        self.scenes.keys().copied().collect()
    }

    // ------------------------------------------------------------------
    // input

    fn process_input(&mut self, event: InputEvent) {
        match self.router.admit(&event, Instant::now()) {
            Admission::Deliver => self.dispatch(event),
            Admission::Coalesced => {}
        }
    }

    fn dispatch(&mut self, event: InputEvent) {
        let class = event.class();

        // a capture short-circuits everything else
        if let Some(capturer) = self.router.capturer_of(class) {
            let (event, context) = match event.position() {
                Some(global) => {
                    let root_tf = self.scene_root_transform(capturer);
                    let local = root_tf
                        .invert()
                        .map(|inv| inv.transform_point(global))
                        .unwrap_or(global);
                    (
                        event.with_position(local),
                        self.input_context(None, Some(local)),
                    )
                }
                None => (event, self.input_context(None, None)),
            };
            self.deliver_input(capturer, event, context);
            return;
        }

        if class.is_positional() {
            if let Some(position) = event.position() {
                if let Some(hit) = self.hit_test_at(class, position) {
                    let context = self.input_context(hit.element_id.clone(), Some(hit.local));
                    self.deliver_input(hit.owner, event.with_position(hit.local), context);
                }
            }
        }

        // broadcast is additive to the hit-tested delivery
        let requesters: Vec<SceneId> = self.router.requesters_of(class).to_vec();
        for scene in requesters {
            let context = self.input_context(None, None);
            self.deliver_input(scene, event.clone(), context);
        }
    }

    fn input_context(&self, element_id: Option<ElementId>, local: Option<Point>) -> InputContext {
        InputContext {
            element_id,
            local,
            viewport_id: self.id,
        }
    }

    /// Hit-test starting from the root graph, falling back to graphs no
    /// other graph references (headless viewports register graphs without
    /// a root scene).
    fn hit_test_at(&self, class: InputClass, position: Point) -> Option<Hit> {
        let registries = self.registries.clone();
        let lists = move |id: &GraphId| registries.input_list(id);

        let root = GraphId::root();
        if self.registries.get_entry(&root).is_some() {
            if let Some(hit) = hit_test(&lists, &root, class, position) {
                return Some(hit);
            }
        }

        let mut referenced = HashSet::new();
        for id in self.registries.list_ids() {
            if let Some(list) = self.registries.input_list(&id) {
                for node in &list.nodes {
                    if let InputNode::Graph { graph_id, .. } = node {
                        referenced.insert(graph_id.clone());
                    }
                }
            }
        }

        for id in self.registries.list_ids() {
            if id == root || referenced.contains(&id) {
                continue;
            }
            if let Some(hit) = hit_test(&lists, &id, class, position) {
                return Some(hit);
            }
        }
        None
    }

    /// The capturer's graph position in root space, found by following
    /// reference nodes from the root graph.
    fn scene_root_transform(&self, scene: SceneId) -> Matrix {
        let Some(record) = self.scenes.get(&scene) else {
            return Matrix::IDENTITY;
        };
        if record.graph_id.is_root() {
            return Matrix::IDENTITY;
        }
        let mut visited = HashSet::new();
        self.find_graph_transform(
            &GraphId::root(),
            &record.graph_id,
            Matrix::IDENTITY,
            &mut visited,
        )
        .unwrap_or(Matrix::IDENTITY)
    }

    fn find_graph_transform(
        &self,
        at: &GraphId,
        target: &GraphId,
        acc: Matrix,
        visited: &mut HashSet<GraphId>,
    ) -> Option<Matrix> {
        if at == target {
            return Some(acc);
        }
        if !visited.insert(at.clone()) {
            return None;
        }
        let list = self.registries.input_list(at)?;
        for node in &list.nodes {
            if let InputNode::Graph {
                graph_id,
                transform,
            } = node
            {
                if let Some(found) =
                    self.find_graph_transform(graph_id, target, acc.mul(transform), visited)
                {
                    return Some(found);
                }
            }
        }
        None
    }

    fn deliver_input(&self, scene: SceneId, event: InputEvent, context: InputContext) {
        let Some(record) = self.scenes.get(&scene) else {
            return; // unknown or already-dead owner, dropped silently
        };
        match record.mailbox.try_send(SceneMessage::Input { event, context }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(scene = %scene, "scene mailbox full, dropping input");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    fn deliver_lifecycle(&self, scene: SceneId, event: SceneLifecycle) {
        if let Some(record) = self.scenes.get(&scene) {
            let _ = record.mailbox.try_send(SceneMessage::Lifecycle(event));
        }
    }

    // ------------------------------------------------------------------
    // automation

    /// Synthesize a press/release pair at an element's center. The events
    /// take the normal input path, so captures and hit-testing apply.
    fn click(&mut self, id: &ElementId) -> Result<(), ViewPortError> {
        if !self.registries.semantics_enabled() {
            return Err(ViewPortError::SemanticDisabled);
        }
        if self.drivers.is_empty() {
            return Err(ViewPortError::NoDriver);
        }
        let (graph, _) = self
            .registries
            .lookup_id(id)
            .ok_or(ViewPortError::NotFound)?;
        let entry: SemanticEntry = self
            .registries
            .snapshot(&graph)
            .and_then(|snap| snap.get(id).cloned())
            .ok_or(ViewPortError::NotFound)?;

        let center = entry.screen_bounds.center();
        self.process_input(InputEvent::CursorButton {
            button: MouseButton::Left,
            state: PressState::Pressed,
            modifiers: Modifiers::empty(),
            position: center,
        });

        let cmd_tx = self.cmd_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = cmd_tx
                .send(ViewPortCommand::Input {
                    event: InputEvent::CursorButton {
                        button: MouseButton::Left,
                        state: PressState::Released,
                        modifiers: Modifiers::empty(),
                        position: center,
                    },
                })
                .await;
        });
        Ok(())
    }

    fn shutdown(&mut self) {
        tracing::debug!(viewport = %self.id, "shutting down");
        let ids = self.scene_ids();
        for id in ids {
            self.deliver_lifecycle(id, SceneLifecycle::Shutdown);
        }
        self.scenes.clear();
        self.drivers.clear();
        self.root = None;
    }
}

async fn flush_timer(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// integration-level tests live here because they exercise the whole loop
#[cfg(test)]
mod tests;
