//! User input: event model, interest registration, capture, hit testing.

pub mod events;
pub mod router;

pub use events::{
    InputClass, InputClasses, InputEvent, Modifiers, MouseButton, PressState, ViewportEvent,
};
pub use router::{Hit, Router};
