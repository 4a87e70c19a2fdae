//! Output drivers.
//!
//! A driver consumes registered scripts and turns them into pixels (or
//! forwards them to a remote peer); it also produces raw input through the
//! viewport handle. The coordinator never calls a driver directly: each
//! attached driver gets its own bounded notice queue drained by a dedicated
//! worker, so a slow or dead driver cannot stall the coordinator or its
//! sibling drivers.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::script::GraphId;
use crate::theme::Theme;

/// A unique identifier for an attached driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DriverId(Uuid);

impl DriverId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DriverId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DriverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notifications pushed from the viewport to one driver.
#[derive(Debug, Clone)]
pub enum DriverNotice {
    /// These scripts changed; re-read them from the registry.
    ScriptsUpdated(Vec<GraphId>),
    /// These scripts are gone.
    ScriptsDeleted(Vec<GraphId>),
    Theme(Theme),
    Resize { width: u32, height: u32 },
    /// The root scene was replaced; drop cached per-scene state.
    ResetScene,
}

/// Callbacks a rendering backend implements.
///
/// Methods run on the driver's own worker, in notice order. Reading
/// scripts happens through the viewport handle's concurrent query path,
/// never through the coordinator.
pub trait Driver: Send + 'static {
    fn name(&self) -> &str {
        "driver"
    }

    fn scripts_updated(&mut self, ids: &[GraphId]) {
        let _ = ids;
    }

    fn scripts_deleted(&mut self, ids: &[GraphId]) {
        let _ = ids;
    }

    fn theme_changed(&mut self, theme: &Theme) {
        let _ = theme;
    }

    fn resized(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    fn reset_scene(&mut self) {}
}

/// Drain a driver's notice queue until the viewport drops the sender.
pub(crate) fn spawn_pump(
    mut driver: Box<dyn Driver>,
    mut rx: mpsc::Receiver<DriverNotice>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while let Some(notice) = rx.blocking_recv() {
            match notice {
                DriverNotice::ScriptsUpdated(ids) => driver.scripts_updated(&ids),
                DriverNotice::ScriptsDeleted(ids) => driver.scripts_deleted(&ids),
                DriverNotice::Theme(theme) => driver.theme_changed(&theme),
                DriverNotice::Resize { width, height } => driver.resized(width, height),
                DriverNotice::ResetScene => driver.reset_scene(),
            }
        }
        tracing::debug!(driver = driver.name(), "driver pump stopped");
    })
}

/// A driver that ignores everything. Useful for tests and headless runs.
#[derive(Debug, Default)]
pub struct NullDriver;

impl Driver for NullDriver {
    fn name(&self) -> &str {
        "null"
    }
}
