//! Color types for fills, strokes, and gradients.

use serde::{Deserialize, Serialize};

/// An 8-bit-per-channel RGBA value.
///
/// This is the concrete color every paint eventually resolves to. Channel
/// order matches the wire encoding, which writes the four bytes as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Web-style color names accepted by [`Rgba::named`]. Kept to the handful
/// UI code actually asks for; anything fancier comes in as hex.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("blue", 0x0000FF),
    ("cornflower_blue", 0x6495ED),
    ("cyan", 0x00FFFF),
    ("dark_gray", 0x404040),
    ("dark_grey", 0x404040),
    ("gray", 0x808080),
    ("green", 0x00FF00),
    ("grey", 0x808080),
    ("light_gray", 0xD3D3D3),
    ("light_grey", 0xD3D3D3),
    ("magenta", 0xFF00FF),
    ("orange", 0xFFA500),
    ("purple", 0x800080),
    ("red", 0xFF0000),
    ("steel_blue", 0x4682B4),
    ("white", 0xFFFFFF),
    ("yellow", 0xFFFF00),
];

impl Rgba {
    /// All four channels, explicitly.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color from its three channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    /// Opaque color from a `0xRRGGBB` literal, the way colors usually
    /// appear in themes and design notes.
    pub const fn from_hex(rgb: u32) -> Self {
        Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Same color with the alpha channel replaced.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// The channels in encoding order.
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Look up a web-style color name. Unknown names yield `None` rather
    /// than a fallback color.
    pub fn named(name: &str) -> Option<Rgba> {
        if name == "transparent" {
            return Some(Rgba::TRANSPARENT);
        }
        NAMED_COLORS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, hex)| Rgba::from_hex(*hex))
    }

    pub const WHITE: Rgba = Rgba::from_hex(0xFFFFFF);
    pub const BLACK: Rgba = Rgba::from_hex(0x000000);
    pub const RED: Rgba = Rgba::from_hex(0xFF0000);
    pub const GREEN: Rgba = Rgba::from_hex(0x00FF00);
    pub const BLUE: Rgba = Rgba::from_hex(0x0000FF);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
}

/// A paint source for fills and strokes.
///
/// Equality is structural, which the change detector relies on; two
/// gradients with identical descriptors compare equal, a named constant and
/// its RGBA expansion compare equal because names resolve at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Color {
    /// Solid color.
    Solid(Rgba),
    /// Linear gradient between two points.
    LinearGradient {
        start: (f32, f32),
        end: (f32, f32),
        from: Rgba,
        to: Rgba,
    },
    /// Radial gradient between an inner and an outer radius.
    RadialGradient {
        center: (f32, f32),
        inner_radius: f32,
        outer_radius: f32,
        from: Rgba,
        to: Rgba,
    },
    /// Box gradient: a feathered rounded rectangle.
    BoxGradient {
        rect: (f32, f32, f32, f32),
        radius: f32,
        feather: f32,
        from: Rgba,
        to: Rgba,
    },
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Solid(Rgba::rgb(r, g, b))
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color::Solid(Rgba::new(r, g, b, a))
    }

    pub fn named(name: &str) -> Option<Self> {
        Rgba::named(name).map(Color::Solid)
    }
}

impl From<Rgba> for Color {
    fn from(c: Rgba) -> Self {
        Color::Solid(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_expands_to_channels() {
        assert_eq!(Rgba::from_hex(0x123456), Rgba::new(0x12, 0x34, 0x56, 0xFF));
        assert_eq!(Rgba::from_hex(0xFFFFFF), Rgba::WHITE);
        assert_eq!(
            Rgba::from_hex(0x123456).with_alpha(0x78).to_array(),
            [0x12, 0x34, 0x56, 0x78]
        );
    }

    #[test]
    fn named_colors_resolve() {
        assert_eq!(Rgba::named("red"), Some(Rgba::RED));
        assert_eq!(Rgba::named("grey"), Rgba::named("gray"));
        assert_eq!(Rgba::named("transparent"), Some(Rgba::TRANSPARENT));
        assert_eq!(Rgba::named("no_such_color"), None);
    }

    #[test]
    fn gradient_equality_is_structural() {
        let a = Color::LinearGradient {
            start: (0.0, 0.0),
            end: (10.0, 0.0),
            from: Rgba::RED,
            to: Rgba::BLUE,
        };
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, Color::Solid(Rgba::RED));
    }
}
