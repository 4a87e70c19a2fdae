//! Coordination core for a retained-mode 2D scene-graph UI runtime.
//!
//! Scenes declare UI as immutable [`Graph`](graph::Graph)s of primitives.
//! The compiler flattens a graph into a compact drawing
//! [`Script`](script::Script), a paint-ordered input list, and a semantic
//! snapshot; the [`ViewPort`](viewport::ViewPort) coordinator registers the
//! results for zero-copy concurrent consumption by drivers, routes raw
//! input back to scenes by hit-testing the live input tree, and answers
//! semantic queries for automated testing.

pub mod color;
pub mod config;
pub mod driver;
pub mod errors;
pub mod graph;
pub mod input;
pub mod math;
pub mod primitive;
pub mod scene;
pub mod script;
pub mod semantic;
pub mod style;
pub mod theme;
pub mod transform;
pub mod viewport;

pub use color::{Color, Rgba};
pub use config::ViewPortConfig;
pub use driver::{Driver, DriverId, NullDriver};
pub use errors::ViewPortError;
pub use graph::Graph;
pub use input::{InputClass, InputClasses, InputEvent, Modifiers, MouseButton, PressState};
pub use math::{Aabb, Matrix, Point};
pub use primitive::{ElementId, Primitive, PrimitiveKind, SemanticMeta};
pub use scene::{InputContext, Scene, SceneContext, SceneId, SceneLifecycle};
pub use script::{GraphId, Script, ScriptCommand};
pub use semantic::{SemanticEntry, SemanticTree};
pub use style::{StyleSet, StyleValue};
pub use theme::Theme;
pub use transform::Transform;
pub use viewport::{PutOutcome, ViewPort, ViewPortHandle, ViewPortId};
