use crate::theme::Theme;

/// Configuration for a [`ViewPort`](crate::viewport::ViewPort).
#[derive(Debug, Clone)]
pub struct ViewPortConfig {
    /// Logical viewport size in pixels.
    pub width: u32,
    pub height: u32,
    /// Initial theme, pushed to drivers on attach.
    pub theme: Theme,
    /// Build the semantic index during compilation. Off means zero
    /// snapshot cost and every semantic query answers `SemanticDisabled`.
    pub enable_semantics: bool,
    /// Capacity of the coordinator command channel.
    pub command_capacity: usize,
    /// Capacity of each scene's input mailbox.
    pub scene_mailbox_capacity: usize,
    /// Capacity of each driver's notice queue. A full queue drops notices.
    pub driver_queue_capacity: usize,
}

impl Default for ViewPortConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            theme: Theme::default(),
            enable_semantics: true,
            command_capacity: 64,
            scene_mailbox_capacity: 64,
            driver_queue_capacity: 64,
        }
    }
}
