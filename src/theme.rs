//! Named color themes shared by scenes and drivers.

use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// The color slots scenes draw with and drivers clear to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub text: Rgba,
    pub background: Rgba,
    pub border: Rgba,
    pub active: Rgba,
    pub thumb: Rgba,
    pub focus: Rgba,
    pub highlight: Rgba,
}

impl Theme {
    pub fn dark() -> Theme {
        Theme {
            text: Rgba::WHITE,
            background: Rgba::from_hex(0x222222),
            border: Rgba::from_hex(0x000000),
            active: Rgba::from_hex(0x585858),
            thumb: Rgba::from_hex(0x484848),
            focus: Rgba::from_hex(0x0071BC),
            highlight: Rgba::from_hex(0xF3F315),
        }
    }

    pub fn light() -> Theme {
        Theme {
            text: Rgba::BLACK,
            background: Rgba::from_hex(0xEEEEEE),
            border: Rgba::from_hex(0x939393),
            active: Rgba::from_hex(0xDDDDDD),
            thumb: Rgba::from_hex(0xCCCCCC),
            focus: Rgba::from_hex(0x0071BC),
            highlight: Rgba::from_hex(0xF3F315),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::dark()
    }
}
