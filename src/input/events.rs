//! Input event types and classes.
//!
//! Every event belongs to exactly one [`InputClass`]. The first three
//! classes are positional: their payload carries a coordinate in the global
//! (root graph) space, which the router projects into local space on
//! delivery.

use std::fmt::Display;

use bitflags::bitflags;

use crate::math::Point;

/// Which physical mouse button an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    fn label(self) -> &'static str {
        match self {
            MouseButton::Left => "Left",
            MouseButton::Middle => "Middle",
            MouseButton::Right => "Right",
        }
    }
}

impl Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a button or key went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressState {
    Pressed,
    Released,
}

bitflags! {
    /// Modifier keys held while a key or button event fired.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT   = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT     = 1 << 2;
        const META    = 1 << 3;
    }
}

impl Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const LABELS: [(Modifiers, &str); 4] = [
            (Modifiers::SHIFT, "Shift"),
            (Modifiers::CONTROL, "Control"),
            (Modifiers::ALT, "Alt"),
            (Modifiers::META, "Meta"),
        ];

        if self.is_empty() {
            return f.write_str("None");
        }
        let mut first = true;
        for (flag, label) in LABELS {
            if self.contains(flag) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(label)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// The closed set of input classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputClass {
    CursorButton,
    CursorPos,
    CursorScroll,
    Key,
    Codepoint,
    Viewport,
}

impl InputClass {
    pub const ALL: [InputClass; 6] = [
        InputClass::CursorButton,
        InputClass::CursorPos,
        InputClass::CursorScroll,
        InputClass::Key,
        InputClass::Codepoint,
        InputClass::Viewport,
    ];

    /// Positional classes carry a global coordinate and participate in hit
    /// testing.
    pub fn is_positional(&self) -> bool {
        matches!(
            self,
            InputClass::CursorButton | InputClass::CursorPos | InputClass::CursorScroll
        )
    }

    pub fn bit(&self) -> InputClasses {
        match self {
            InputClass::CursorButton => InputClasses::CURSOR_BUTTON,
            InputClass::CursorPos => InputClasses::CURSOR_POS,
            InputClass::CursorScroll => InputClasses::CURSOR_SCROLL,
            InputClass::Key => InputClasses::KEY,
            InputClass::Codepoint => InputClasses::CODEPOINT,
            InputClass::Viewport => InputClasses::VIEWPORT,
        }
    }
}

bitflags! {
    /// A set of input classes, used both for primitive input styles and for
    /// request/capture registration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputClasses: u8 {
        const CURSOR_BUTTON = 0b0000_0001;
        const CURSOR_POS    = 0b0000_0010;
        const CURSOR_SCROLL = 0b0000_0100;
        const KEY           = 0b0000_1000;
        const CODEPOINT     = 0b0001_0000;
        const VIEWPORT      = 0b0010_0000;
    }
}

impl InputClasses {
    /// Every class; the wildcard registration.
    pub const ANY: InputClasses = InputClasses::all();

    pub fn classes(&self) -> impl Iterator<Item = InputClass> + '_ {
        InputClass::ALL.into_iter().filter(|c| self.contains(c.bit()))
    }
}

/// Viewport lifecycle events delivered through the input path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    /// The cursor entered the viewport.
    Enter(Point),
    /// The cursor left the viewport.
    Leave(Point),
    /// The viewport was resized.
    Reshape { width: u32, height: u32 },
    /// An input capture this scene held was taken away, typically because
    /// the capturing scene above it went away mid-gesture.
    CaptureLost(InputClass),
}

/// A single input event as produced by a driver (or synthesized by the
/// semantic `click` hook).
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    CursorButton {
        button: MouseButton,
        state: PressState,
        modifiers: Modifiers,
        position: Point,
    },
    CursorPos {
        position: Point,
    },
    CursorScroll {
        offset: (f32, f32),
        position: Point,
    },
    Key {
        key: String,
        state: PressState,
        modifiers: Modifiers,
    },
    Codepoint {
        codepoint: char,
        modifiers: Modifiers,
    },
    Viewport(ViewportEvent),
}

impl InputEvent {
    pub fn class(&self) -> InputClass {
        match self {
            InputEvent::CursorButton { .. } => InputClass::CursorButton,
            InputEvent::CursorPos { .. } => InputClass::CursorPos,
            InputEvent::CursorScroll { .. } => InputClass::CursorScroll,
            InputEvent::Key { .. } => InputClass::Key,
            InputEvent::Codepoint { .. } => InputClass::Codepoint,
            InputEvent::Viewport(_) => InputClass::Viewport,
        }
    }

    /// The global coordinate for positional events.
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::CursorButton { position, .. } => Some(*position),
            InputEvent::CursorPos { position } => Some(*position),
            InputEvent::CursorScroll { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Returns a copy with the positional coordinate replaced, used when
    /// projecting into a capturer's or hit target's local space.
    pub fn with_position(&self, p: Point) -> InputEvent {
        let mut ev = self.clone();
        match &mut ev {
            InputEvent::CursorButton { position, .. } => *position = p,
            InputEvent::CursorPos { position } => *position = p,
            InputEvent::CursorScroll { position, .. } => *position = p,
            _ => {}
        }
        ev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_and_modifiers_format_for_logs() {
        assert_eq!(MouseButton::Middle.to_string(), "Middle");
        assert_eq!(Modifiers::empty().to_string(), "None");
        assert_eq!((Modifiers::SHIFT | Modifiers::ALT).to_string(), "Shift+Alt");
        assert_eq!(
            Modifiers::all().to_string(),
            "Shift+Control+Alt+Meta"
        );
    }

    #[test]
    fn positional_classes() {
        assert!(InputClass::CursorButton.is_positional());
        assert!(InputClass::CursorPos.is_positional());
        assert!(InputClass::CursorScroll.is_positional());
        assert!(!InputClass::Key.is_positional());
        assert!(!InputClass::Viewport.is_positional());
    }

    #[test]
    fn class_set_round_trip() {
        let set = InputClasses::CURSOR_BUTTON | InputClasses::KEY;
        let classes: Vec<_> = set.classes().collect();
        assert_eq!(classes, vec![InputClass::CursorButton, InputClass::Key]);
        assert_eq!(InputClasses::ANY.classes().count(), 6);
    }

    #[test]
    fn event_position_projection() {
        let ev = InputEvent::CursorPos {
            position: Point::new(5.0, 5.0),
        };
        let moved = ev.with_position(Point::new(1.0, 2.0));
        assert_eq!(moved.position(), Some(Point::new(1.0, 2.0)));

        let key = InputEvent::Key {
            key: "a".into(),
            state: PressState::Pressed,
            modifiers: Modifiers::empty(),
        };
        assert_eq!(key.position(), None);
    }
}
