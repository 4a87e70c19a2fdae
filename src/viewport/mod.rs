//! The ViewPort coordinator: registries, lifecycles, and notification.

pub mod commands;
pub mod handle;
pub mod registry;
#[allow(clippy::module_inception)]
pub mod viewport;

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use commands::{PutOutcome, SceneFactory};
pub use handle::ViewPortHandle;
pub use registry::{Registries, ScriptEntry};
pub use viewport::ViewPort;

/// A unique identifier for one viewport instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewPortId(Uuid);

impl ViewPortId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ViewPortId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ViewPortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
