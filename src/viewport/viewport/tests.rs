use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::color::Color;
use crate::config::ViewPortConfig;
use crate::driver::{Driver, NullDriver};
use crate::errors::ViewPortError;
use crate::graph::Graph;
use crate::input::{InputClasses, InputEvent, Modifiers, MouseButton, PressState};
use crate::math::{Aabb, Point};
use crate::primitive::{ElementId, Primitive, SemanticMeta};
use crate::scene::{InputContext, Scene, SceneContext, SceneId, SceneLifecycle};
use crate::script::GraphId;
use crate::style::StyleValue;
use crate::theme::Theme;
use crate::transform::Transform;
use crate::viewport::{PutOutcome, ViewPort, ViewPortHandle};

#[derive(Debug)]
enum Recorded {
    Ready(SceneId),
    Input(InputEvent, InputContext),
    Lifecycle(SceneLifecycle),
}

/// Cloneable description of a test scene, so `set_root` factories can
/// rebuild it.
#[derive(Clone)]
struct SceneSetup {
    graph: Option<Graph>,
    extra_graphs: Vec<(GraphId, Graph)>,
    requests: InputClasses,
    captures: InputClasses,
    release_capture_on_key: bool,
    fail_init: bool,
    child: Option<Box<SceneSetup>>,
    tx: UnboundedSender<Recorded>,
}

impl SceneSetup {
    fn new(tx: UnboundedSender<Recorded>) -> Self {
        Self {
            graph: None,
            extra_graphs: Vec::new(),
            requests: InputClasses::empty(),
            captures: InputClasses::empty(),
            release_capture_on_key: false,
            fail_init: false,
            child: None,
            tx,
        }
    }

    fn into_scene(self) -> Box<dyn Scene> {
        Box::new(TestScene { setup: self })
    }
}

struct TestScene {
    setup: SceneSetup,
}

impl Scene for TestScene {
    fn name(&self) -> &str {
        "test_scene"
    }

    fn init(&mut self, ctx: &mut SceneContext) -> anyhow::Result<()> {
        if let Some(graph) = self.setup.graph.clone() {
            ctx.push_graph(graph)?;
        }
        for (id, graph) in self.setup.extra_graphs.clone() {
            ctx.push_graph_as(id, graph)?;
        }
        if !self.setup.requests.is_empty() {
            ctx.request_input(self.setup.requests)?;
        }
        if !self.setup.captures.is_empty() {
            ctx.capture_input(self.setup.captures)?;
        }
        if let Some(child) = self.setup.child.clone() {
            ctx.start_child(child.into_scene(), None)?;
        }
        let _ = self.setup.tx.send(Recorded::Ready(ctx.scene_id()));
        if self.setup.fail_init {
            anyhow::bail!("deliberate init failure");
        }
        Ok(())
    }

    fn handle_input(&mut self, event: InputEvent, context: &InputContext, ctx: &mut SceneContext) {
        if self.setup.release_capture_on_key && matches!(event, InputEvent::Key { .. }) {
            let _ = ctx.release_capture(InputClasses::CURSOR_BUTTON);
        }
        let _ = self.setup.tx.send(Recorded::Input(event, context.clone()));
    }

    fn handle_lifecycle(&mut self, event: SceneLifecycle, _ctx: &mut SceneContext) {
        let _ = self.setup.tx.send(Recorded::Lifecycle(event));
    }
}

#[derive(Debug, Clone, PartialEq)]
enum DriverEvent {
    Updated(Vec<GraphId>),
    Deleted(Vec<GraphId>),
    Theme,
    Resize(u32, u32),
    Reset,
}

struct RecordingDriver {
    tx: UnboundedSender<DriverEvent>,
}

impl Driver for RecordingDriver {
    fn name(&self) -> &str {
        "recording"
    }

    fn scripts_updated(&mut self, ids: &[GraphId]) {
        let _ = self.tx.send(DriverEvent::Updated(ids.to_vec()));
    }

    fn scripts_deleted(&mut self, ids: &[GraphId]) {
        let _ = self.tx.send(DriverEvent::Deleted(ids.to_vec()));
    }

    fn theme_changed(&mut self, _theme: &Theme) {
        let _ = self.tx.send(DriverEvent::Theme);
    }

    fn resized(&mut self, width: u32, height: u32) {
        let _ = self.tx.send(DriverEvent::Resize(width, height));
    }

    fn reset_scene(&mut self) {
        let _ = self.tx.send(DriverEvent::Reset);
    }
}

const WAIT: Duration = Duration::from_secs(5);

async fn recv<T: std::fmt::Debug>(rx: &mut UnboundedReceiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a message")
        .expect("channel closed")
}

async fn next_input(rx: &mut UnboundedReceiver<Recorded>) -> (InputEvent, InputContext) {
    loop {
        if let Recorded::Input(event, context) = recv(rx).await {
            return (event, context);
        }
    }
}

async fn wait_ready(rx: &mut UnboundedReceiver<Recorded>) -> SceneId {
    loop {
        if let Recorded::Ready(id) = recv(rx).await {
            return id;
        }
    }
}

/// Skip the attach-time snapshot notices (theme, resize, initial ids).
async fn drain_initial(rx: &mut UnboundedReceiver<DriverEvent>) {
    loop {
        match recv(rx).await {
            DriverEvent::Updated(_) => return,
            _ => continue,
        }
    }
}

async fn eventually(mut f: impl FnMut() -> bool) {
    for _ in 0..200 {
        if f() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not met in time");
}

fn press_at(x: f32, y: f32) -> InputEvent {
    InputEvent::CursorButton {
        button: MouseButton::Left,
        state: PressState::Pressed,
        modifiers: Modifiers::empty(),
        position: Point::new(x, y),
    }
}

fn save_button_graph() -> Graph {
    let mut g = Graph::new();
    g.add_to_root(
        Primitive::rect(100.0, 50.0)
            .with_transform(Transform::new().translate(10.0, 20.0))
            .with_id("save_btn")
            .with_semantic(SemanticMeta {
                kind: Some("button".into()),
                clickable: Some(true),
                label: Some("Save".into()),
                ..Default::default()
            }),
    )
    .unwrap();
    g
}

fn start_viewport() -> ViewPortHandle {
    let (handle, _join) = ViewPort::new(ViewPortConfig::default()).start();
    handle
}

#[tokio::test]
async fn empty_graph_registers_an_empty_script() {
    let vp = start_viewport();
    let owner = SceneId::new();

    let outcome = vp.put_graph("main", Graph::new(), owner).await.unwrap();
    assert_eq!(outcome, PutOutcome::Updated);

    let script = vp.get_script("main").expect("script registered");
    assert_eq!(script.len(), 0);
    assert!(vp.find_by_type("button").unwrap().is_empty());
}

#[tokio::test]
async fn identified_rect_round_trips_through_semantics() {
    let vp = start_viewport();
    vp.put_graph("main", save_button_graph(), SceneId::new())
        .await
        .unwrap();

    let entry = vp.find_by_id("save_btn").unwrap();
    assert_eq!(entry.kind, "button");
    assert_eq!(entry.local_bounds, Aabb::new(0.0, 0.0, 100.0, 50.0));
    assert_eq!(entry.screen_bounds, Aabb::new(10.0, 20.0, 100.0, 50.0));
    assert!(entry.clickable);
    assert_eq!(entry.label.as_deref(), Some("Save"));

    let at = vp.elements_at_point(50.0, 40.0).unwrap();
    assert_eq!(at.len(), 1);
    assert_eq!(at[0].id, ElementId::from("save_btn"));
    assert!(vp.elements_at_point(0.0, 0.0).unwrap().is_empty());
}

#[tokio::test]
async fn noop_put_emits_exactly_one_notification() {
    let vp = start_viewport();
    let (dtx, mut drx) = unbounded_channel();
    vp.attach_driver(Box::new(RecordingDriver { tx: dtx }))
        .await
        .unwrap();
    drain_initial(&mut drx).await;

    let owner = SceneId::new();
    let mut g1 = Graph::new();
    g1.add_to_root(Primitive::rect(10.0, 10.0)).unwrap();

    assert_eq!(
        vp.put_graph("main", g1.clone(), owner).await.unwrap(),
        PutOutcome::Updated
    );
    assert_eq!(
        recv(&mut drx).await,
        DriverEvent::Updated(vec!["main".into()])
    );

    // byte-identical graph: total no-op
    assert_eq!(
        vp.put_graph("main", g1.clone(), owner).await.unwrap(),
        PutOutcome::Unchanged
    );

    // a real change must be the very next notice the driver sees
    let mut g2 = Graph::new();
    g2.add_to_root(Primitive::rect(20.0, 10.0)).unwrap();
    assert_eq!(
        vp.put_graph("main", g2, owner).await.unwrap(),
        PutOutcome::Updated
    );
    assert_eq!(
        recv(&mut drx).await,
        DriverEvent::Updated(vec!["main".into()])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn overlap_resolves_to_last_painted() {
    let vp = start_viewport();
    let (tx, mut rx) = unbounded_channel();

    let mut g = Graph::new();
    g.add_to_root(
        Primitive::rect(100.0, 50.0)
            .with_style(StyleValue::Input(InputClasses::CURSOR_BUTTON))
            .with_id("a"),
    )
    .unwrap();
    g.add_to_root(
        Primitive::rect(100.0, 50.0)
            .with_style(StyleValue::Input(InputClasses::CURSOR_BUTTON))
            .with_id("b"),
    )
    .unwrap();

    let mut setup = SceneSetup::new(tx);
    setup.graph = Some(g);
    vp.set_root("overlap", move || setup.clone().into_scene())
        .await
        .unwrap();
    wait_ready(&mut rx).await;

    vp.input(press_at(50.0, 25.0)).await.unwrap();
    let (event, context) = next_input(&mut rx).await;
    assert!(matches!(event, InputEvent::CursorButton { .. }));
    assert_eq!(context.element_id, Some("b".into()));
    assert_eq!(context.local, Some(Point::new(50.0, 25.0)));

    let at = vp.elements_at_point(50.0, 25.0).unwrap();
    let ids: Vec<_> = at.into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![ElementId::from("b"), ElementId::from("a")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn capture_is_exclusive_until_released() {
    let vp = start_viewport();
    let (t_tx, mut t_rx) = unbounded_channel();
    let (s_tx, mut s_rx) = unbounded_channel();

    // T: root scene with a hit-eligible rect, also a requester.
    let mut t_graph = Graph::new();
    t_graph
        .add_to_root(
            Primitive::rect(100.0, 50.0)
                .with_style(StyleValue::Input(InputClasses::CURSOR_BUTTON))
                .with_id("t_rect"),
        )
        .unwrap();

    // S: child scene capturing cursor_button, releasing it on any key.
    let mut s_setup = SceneSetup::new(s_tx);
    s_setup.captures = InputClasses::CURSOR_BUTTON;
    s_setup.requests = InputClasses::KEY;
    s_setup.release_capture_on_key = true;

    let mut t_setup = SceneSetup::new(t_tx);
    t_setup.graph = Some(t_graph);
    t_setup.requests = InputClasses::CURSOR_BUTTON;
    t_setup.child = Some(Box::new(s_setup));

    vp.set_root("capture", move || t_setup.clone().into_scene())
        .await
        .unwrap();
    wait_ready(&mut t_rx).await;
    wait_ready(&mut s_rx).await;

    // while S holds the capture, the click goes to S alone
    vp.input(press_at(50.0, 25.0)).await.unwrap();
    let (event, context) = next_input(&mut s_rx).await;
    assert!(matches!(
        event,
        InputEvent::CursorButton {
            state: PressState::Pressed,
            ..
        }
    ));
    assert_eq!(context.element_id, None);

    // S releases on key, then the same click reaches T
    vp.input(InputEvent::Key {
        key: "Escape".into(),
        state: PressState::Pressed,
        modifiers: Modifiers::empty(),
    })
    .await
    .unwrap();
    let (key_event, _) = next_input(&mut s_rx).await;
    assert!(matches!(key_event, InputEvent::Key { .. }));

    vp.input(press_at(50.0, 25.0)).await.unwrap();

    // hit-tested delivery with the element id...
    let (event, context) = next_input(&mut t_rx).await;
    assert!(matches!(event, InputEvent::CursorButton { .. }));
    assert_eq!(context.element_id, Some("t_rect".into()));
    // ...and the additive broadcast without one
    let (_, context) = next_input(&mut t_rx).await;
    assert_eq!(context.element_id, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn broadcast_is_additive_to_hit_delivery() {
    let vp = start_viewport();
    let (a_tx, mut a_rx) = unbounded_channel();
    let (b_tx, mut b_rx) = unbounded_channel();

    let mut a_graph = Graph::new();
    a_graph
        .add_to_root(
            Primitive::rect(100.0, 50.0)
                .with_style(StyleValue::Input(InputClasses::CURSOR_BUTTON))
                .with_id("a_rect"),
        )
        .unwrap();

    // B: requester only, no geometry
    let mut b_setup = SceneSetup::new(b_tx);
    b_setup.requests = InputClasses::CURSOR_BUTTON;

    let mut a_setup = SceneSetup::new(a_tx);
    a_setup.graph = Some(a_graph);
    a_setup.child = Some(Box::new(b_setup));

    vp.set_root("additive", move || a_setup.clone().into_scene())
        .await
        .unwrap();
    wait_ready(&mut a_rx).await;
    wait_ready(&mut b_rx).await;

    vp.input(press_at(50.0, 25.0)).await.unwrap();

    let (_, a_context) = next_input(&mut a_rx).await;
    assert_eq!(a_context.element_id, Some("a_rect".into()));
    assert_eq!(a_context.local, Some(Point::new(50.0, 25.0)));

    let (b_event, b_context) = next_input(&mut b_rx).await;
    assert_eq!(b_context.element_id, None);
    assert_eq!(b_event.position(), Some(Point::new(50.0, 25.0)));
}

#[tokio::test(flavor = "multi_thread")]
async fn scene_termination_cleans_up_ownership() {
    let vp = start_viewport();
    let (dtx, mut drx) = unbounded_channel();
    vp.attach_driver(Box::new(RecordingDriver { tx: dtx }))
        .await
        .unwrap();
    drain_initial(&mut drx).await;

    let (tx, mut rx) = unbounded_channel();
    let mut setup = SceneSetup::new(tx);
    setup.extra_graphs = vec![("x1".into(), save_button_graph())];
    let scene_id = vp
        .set_root("owner", move || setup.clone().into_scene())
        .await
        .unwrap();
    wait_ready(&mut rx).await;

    assert!(vp.list_script_ids().contains(&"x1".into()));
    assert!(vp.find_by_id("save_btn").is_ok());
    assert_eq!(
        recv(&mut drx).await,
        DriverEvent::Updated(vec!["x1".into()])
    );

    vp.terminate_scene(scene_id).await.unwrap();

    assert!(!vp.list_script_ids().contains(&"x1".into()));
    assert!(vp.get_script("x1").is_none());
    assert!(matches!(
        vp.find_by_id("save_btn"),
        Err(ViewPortError::NotFound)
    ));
    assert_eq!(
        recv(&mut drx).await,
        DriverEvent::Deleted(vec!["x1".into()])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_scene_init_still_cleans_up() {
    let vp = start_viewport();
    let (tx, mut rx) = unbounded_channel();
    let mut setup = SceneSetup::new(tx);
    setup.extra_graphs = vec![("doomed".into(), save_button_graph())];
    setup.fail_init = true;

    vp.set_root("doomed", move || setup.clone().into_scene())
        .await
        .unwrap();
    wait_ready(&mut rx).await;

    let handle = vp.clone();
    eventually(move || !handle.list_script_ids().contains(&"doomed".into())).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn automation_click_presses_and_releases_at_center() {
    let vp = start_viewport();
    vp.attach_driver(Box::new(NullDriver)).await.unwrap();

    let (tx, mut rx) = unbounded_channel();
    let mut setup = SceneSetup::new(tx);
    setup.graph = Some(save_button_graph());
    setup.requests = InputClasses::CURSOR_BUTTON;
    vp.set_root("click", move || setup.clone().into_scene())
        .await
        .unwrap();
    wait_ready(&mut rx).await;

    vp.click("save_btn").await.unwrap();

    let (press, _) = next_input(&mut rx).await;
    match press {
        InputEvent::CursorButton {
            state, position, ..
        } => {
            assert_eq!(state, PressState::Pressed);
            assert_eq!(position, Point::new(60.0, 45.0));
        }
        other => panic!("unexpected event {other:?}"),
    }

    let (release, _) = next_input(&mut rx).await;
    match release {
        InputEvent::CursorButton {
            state, position, ..
        } => {
            assert_eq!(state, PressState::Released);
            assert_eq!(position, Point::new(60.0, 45.0));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn click_requires_a_driver() {
    let vp = start_viewport();
    vp.put_graph("main", save_button_graph(), SceneId::new())
        .await
        .unwrap();
    assert!(matches!(
        vp.click("save_btn").await,
        Err(ViewPortError::NoDriver)
    ));
}

#[tokio::test]
async fn semantic_queries_honor_the_disabled_flag() {
    let config = ViewPortConfig {
        enable_semantics: false,
        ..Default::default()
    };
    let (vp, _join) = ViewPort::new(config).start();
    vp.put_graph("main", save_button_graph(), SceneId::new())
        .await
        .unwrap();

    assert!(matches!(
        vp.find_by_id("save_btn"),
        Err(ViewPortError::SemanticDisabled)
    ));
    assert!(matches!(
        vp.find_by_type("button"),
        Err(ViewPortError::SemanticDisabled)
    ));
    assert!(matches!(
        vp.elements_at_point(1.0, 1.0),
        Err(ViewPortError::SemanticDisabled)
    ));
    assert!(matches!(
        vp.click("save_btn").await,
        Err(ViewPortError::SemanticDisabled)
    ));

    // the script registry itself is unaffected
    assert!(vp.get_script("main").is_some());
}

#[tokio::test]
async fn del_graph_of_unknown_id_is_not_found() {
    let vp = start_viewport();
    assert!(matches!(
        vp.del_graph("ghost").await,
        Err(ViewPortError::NotFound)
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_readers_never_observe_torn_entries() {
    let vp = start_viewport();
    let owner = SceneId::new();

    let mut g1 = Graph::new();
    g1.add_to_root(Primitive::rect(10.0, 10.0).with_style(StyleValue::Fill(Color::rgb(1, 0, 0))))
        .unwrap();
    let mut g2 = Graph::new();
    g2.add_to_root(Primitive::circle(7.0).with_style(StyleValue::Fill(Color::rgb(0, 1, 0))))
        .unwrap();

    vp.put_graph("flip", g1.clone(), owner).await.unwrap();
    let bytes1 = vp.get_script("flip").unwrap().wire_bytes().to_vec();
    vp.put_graph("flip", g2.clone(), owner).await.unwrap();
    let bytes2 = vp.get_script("flip").unwrap().wire_bytes().to_vec();
    assert_ne!(bytes1, bytes2);

    let mut readers = Vec::new();
    for _ in 0..4 {
        let handle = vp.clone();
        let (b1, b2) = (bytes1.clone(), bytes2.clone());
        readers.push(tokio::spawn(async move {
            for _ in 0..500 {
                if let Some(script) = handle.get_script("flip") {
                    let bytes = script.wire_bytes();
                    assert!(bytes == b1.as_slice() || bytes == b2.as_slice());
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    for i in 0..100 {
        let g = if i % 2 == 0 { g1.clone() } else { g2.clone() };
        vp.put_graph("flip", g, owner).await.unwrap();
    }

    for reader in readers {
        reader.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn theme_change_restarts_the_root_subtree() {
    let vp = start_viewport();
    let (dtx, mut drx) = unbounded_channel();
    vp.attach_driver(Box::new(RecordingDriver { tx: dtx }))
        .await
        .unwrap();
    drain_initial(&mut drx).await;

    let (tx, mut rx) = unbounded_channel();
    let mut setup = SceneSetup::new(tx);
    setup.graph = Some(save_button_graph());
    vp.set_root("themed", move || setup.clone().into_scene())
        .await
        .unwrap();
    let first = wait_ready(&mut rx).await;

    vp.set_theme(Theme::light()).await.unwrap();

    // a fresh root instance comes up after the theme notice
    let second = wait_ready(&mut rx).await;
    assert_ne!(first, second);

    let mut saw_theme = false;
    let mut saw_reset = false;
    for _ in 0..10 {
        match recv(&mut drx).await {
            DriverEvent::Theme => saw_theme = true,
            DriverEvent::Reset => saw_reset = true,
            _ => {}
        }
        if saw_theme && saw_reset {
            break;
        }
    }
    assert!(saw_theme && saw_reset);
}

#[tokio::test(flavor = "multi_thread")]
async fn capture_lost_lands_on_next_holder_when_capturer_dies() {
    let vp = start_viewport();
    let (t_tx, mut t_rx) = unbounded_channel();
    let (s_tx, mut s_rx) = unbounded_channel();

    // child S captures on top of root T's capture
    let mut s_setup = SceneSetup::new(s_tx);
    s_setup.captures = InputClasses::CURSOR_BUTTON;

    let mut t_setup = SceneSetup::new(t_tx);
    t_setup.captures = InputClasses::CURSOR_BUTTON;
    t_setup.child = Some(Box::new(s_setup));

    vp.set_root("lost", move || t_setup.clone().into_scene())
        .await
        .unwrap();
    wait_ready(&mut t_rx).await;
    let s_id = wait_ready(&mut s_rx).await;

    vp.terminate_scene(s_id).await.unwrap();

    loop {
        match recv(&mut t_rx).await {
            Recorded::Lifecycle(SceneLifecycle::CaptureLost(class)) => {
                assert_eq!(class, crate::input::InputClass::CursorButton);
                break;
            }
            _ => continue,
        }
    }
}

#[tokio::test]
async fn put_script_registers_without_semantics() {
    let vp = start_viewport();
    let owner = SceneId::new();
    let script = crate::script::Script::from_commands(vec![
        crate::script::ScriptCommand::DrawRect {
            width: 5.0,
            height: 5.0,
        },
    ]);

    assert_eq!(
        vp.put_script("raw", script.clone(), owner).await.unwrap(),
        PutOutcome::Updated
    );
    assert_eq!(
        vp.put_script("raw", script, owner).await.unwrap(),
        PutOutcome::Unchanged
    );
    assert_eq!(vp.get_script("raw").unwrap().len(), 1);
    assert!(vp.find_by_type("rect").unwrap().is_empty());
}
