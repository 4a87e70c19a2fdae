//! Canonical byte encoding for scripts.
//!
//! # Layout
//!
//! ```text
//! [ops_len: u32 LE] [op stream] [blob]
//! ```
//!
//! The op stream is one opcode byte per command followed by a fixed-width
//! payload (`f32` little-endian, `u8` enum discriminants). Variable-size
//! payloads (text, font names, paths, sprite lists, script ids) live in the
//! companion blob section and are referenced from the op stream as
//! `(offset: u32, len: u32)` pairs relative to the blob start.
//!
//! The encoding is a pure function of the command list. The registry's
//! change detector compares these bytes directly, so any nondeterminism
//! here would break no-op detection.

use crate::color::{Color, Rgba};
use crate::primitive::{PathCommand, SpriteDraw};
use crate::script::ScriptCommand;
use crate::style::{LineCap, LineJoin, TextAlign, TextBase};

mod op {
    pub const PUSH_STATE: u8 = 0x01;
    pub const POP_STATE: u8 = 0x02;
    pub const TRANSFORM: u8 = 0x03;
    pub const TRANSLATE: u8 = 0x04;
    pub const SCALE: u8 = 0x05;
    pub const ROTATE: u8 = 0x06;

    pub const FILL_COLOR: u8 = 0x10;
    pub const STROKE_COLOR: u8 = 0x11;
    pub const STROKE_WIDTH: u8 = 0x12;
    pub const LINE_CAP: u8 = 0x13;
    pub const LINE_JOIN: u8 = 0x14;
    pub const MITER_LIMIT: u8 = 0x15;
    pub const FONT: u8 = 0x16;
    pub const FONT_SIZE: u8 = 0x17;
    pub const TEXT_ALIGN: u8 = 0x18;
    pub const TEXT_BASE: u8 = 0x19;
    pub const SCISSOR: u8 = 0x1A;
    pub const HIDDEN: u8 = 0x1B;

    pub const DRAW_LINE: u8 = 0x20;
    pub const DRAW_RECT: u8 = 0x21;
    pub const DRAW_RRECT: u8 = 0x22;
    pub const DRAW_CIRCLE: u8 = 0x23;
    pub const DRAW_ELLIPSE: u8 = 0x24;
    pub const DRAW_TRIANGLE: u8 = 0x25;
    pub const DRAW_QUAD: u8 = 0x26;
    pub const DRAW_PATH: u8 = 0x27;
    pub const DRAW_ARC: u8 = 0x28;
    pub const DRAW_SECTOR: u8 = 0x29;
    pub const DRAW_TEXT: u8 = 0x2A;
    pub const DRAW_SPRITES: u8 = 0x2B;
    pub const DRAW_SCRIPT: u8 = 0x2C;
}

struct Encoder {
    ops: Vec<u8>,
    blob: Vec<u8>,
}

impl Encoder {
    fn new() -> Self {
        Self {
            ops: Vec::new(),
            blob: Vec::new(),
        }
    }

    fn u8(&mut self, v: u8) {
        self.ops.push(v);
    }

    fn f32(&mut self, v: f32) {
        self.ops.extend_from_slice(&v.to_le_bytes());
    }

    fn f32s(&mut self, vs: &[f32]) {
        for v in vs {
            self.f32(*v);
        }
    }

    fn rgba(&mut self, c: Rgba) {
        self.ops.extend_from_slice(&c.to_array());
    }

    fn color(&mut self, c: &Color) {
        match c {
            Color::Solid(rgba) => {
                self.u8(0);
                self.rgba(*rgba);
            }
            Color::LinearGradient {
                start,
                end,
                from,
                to,
            } => {
                self.u8(1);
                self.f32s(&[start.0, start.1, end.0, end.1]);
                self.rgba(*from);
                self.rgba(*to);
            }
            Color::RadialGradient {
                center,
                inner_radius,
                outer_radius,
                from,
                to,
            } => {
                self.u8(2);
                self.f32s(&[center.0, center.1, *inner_radius, *outer_radius]);
                self.rgba(*from);
                self.rgba(*to);
            }
            Color::BoxGradient {
                rect,
                radius,
                feather,
                from,
                to,
            } => {
                self.u8(3);
                self.f32s(&[rect.0, rect.1, rect.2, rect.3, *radius, *feather]);
                self.rgba(*from);
                self.rgba(*to);
            }
        }
    }

    /// Append bytes to the blob and reference them from the op stream.
    fn blob_ref(&mut self, bytes: &[u8]) {
        let offset = self.blob.len() as u32;
        let len = bytes.len() as u32;
        self.blob.extend_from_slice(bytes);
        self.ops.extend_from_slice(&offset.to_le_bytes());
        self.ops.extend_from_slice(&len.to_le_bytes());
    }

    fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.ops.len() + self.blob.len());
        out.extend_from_slice(&(self.ops.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.ops);
        out.extend_from_slice(&self.blob);
        out
    }
}

fn encode_path(commands: &[PathCommand]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(commands.len() as u32).to_le_bytes());
    for cmd in commands {
        match cmd {
            PathCommand::MoveTo(x, y) => {
                out.push(0);
                out.extend_from_slice(&x.to_le_bytes());
                out.extend_from_slice(&y.to_le_bytes());
            }
            PathCommand::LineTo(x, y) => {
                out.push(1);
                out.extend_from_slice(&x.to_le_bytes());
                out.extend_from_slice(&y.to_le_bytes());
            }
            PathCommand::BezierTo(c1x, c1y, c2x, c2y, x, y) => {
                out.push(2);
                for v in [c1x, c1y, c2x, c2y, x, y] {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            PathCommand::QuadTo(cx, cy, x, y) => {
                out.push(3);
                for v in [cx, cy, x, y] {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            PathCommand::Close => out.push(4),
        }
    }
    out
}

fn encode_sprites(draws: &[SpriteDraw]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(draws.len() as u32).to_le_bytes());
    for d in draws {
        for v in [
            d.src.0, d.src.1, d.src.2, d.src.3, d.dst.0, d.dst.1, d.dst.2, d.dst.3,
        ] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        let id = d.image_id.as_bytes();
        out.extend_from_slice(&(id.len() as u32).to_le_bytes());
        out.extend_from_slice(id);
    }
    out
}

fn line_cap_byte(c: LineCap) -> u8 {
    match c {
        LineCap::Butt => 0,
        LineCap::Round => 1,
        LineCap::Square => 2,
    }
}

fn line_join_byte(j: LineJoin) -> u8 {
    match j {
        LineJoin::Miter => 0,
        LineJoin::Round => 1,
        LineJoin::Bevel => 2,
    }
}

fn text_align_byte(a: TextAlign) -> u8 {
    match a {
        TextAlign::Left => 0,
        TextAlign::Center => 1,
        TextAlign::Right => 2,
    }
}

fn text_base_byte(b: TextBase) -> u8 {
    match b {
        TextBase::Top => 0,
        TextBase::Middle => 1,
        TextBase::Alphabetic => 2,
        TextBase::Bottom => 3,
    }
}

/// Encode a command list into its canonical wire bytes.
pub fn encode(commands: &[ScriptCommand]) -> Vec<u8> {
    let mut e = Encoder::new();
    for cmd in commands {
        match cmd {
            ScriptCommand::PushState => e.u8(op::PUSH_STATE),
            ScriptCommand::PopState => e.u8(op::POP_STATE),
            ScriptCommand::Transform(m) => {
                e.u8(op::TRANSFORM);
                e.f32s(&m.0);
            }
            ScriptCommand::Translate(dx, dy) => {
                e.u8(op::TRANSLATE);
                e.f32s(&[*dx, *dy]);
            }
            ScriptCommand::Scale(sx, sy) => {
                e.u8(op::SCALE);
                e.f32s(&[*sx, *sy]);
            }
            ScriptCommand::Rotate(r) => {
                e.u8(op::ROTATE);
                e.f32(*r);
            }
            ScriptCommand::FillColor(c) => {
                e.u8(op::FILL_COLOR);
                e.color(c);
            }
            ScriptCommand::StrokeColor(c) => {
                e.u8(op::STROKE_COLOR);
                e.color(c);
            }
            ScriptCommand::StrokeWidth(w) => {
                e.u8(op::STROKE_WIDTH);
                e.f32(*w);
            }
            ScriptCommand::LineCap(c) => {
                e.u8(op::LINE_CAP);
                e.u8(line_cap_byte(*c));
            }
            ScriptCommand::LineJoin(j) => {
                e.u8(op::LINE_JOIN);
                e.u8(line_join_byte(*j));
            }
            ScriptCommand::MiterLimit(m) => {
                e.u8(op::MITER_LIMIT);
                e.f32(*m);
            }
            ScriptCommand::Font(name) => {
                e.u8(op::FONT);
                e.blob_ref(name.as_bytes());
            }
            ScriptCommand::FontSize(s) => {
                e.u8(op::FONT_SIZE);
                e.f32(*s);
            }
            ScriptCommand::TextAlign(a) => {
                e.u8(op::TEXT_ALIGN);
                e.u8(text_align_byte(*a));
            }
            ScriptCommand::TextBase(b) => {
                e.u8(op::TEXT_BASE);
                e.u8(text_base_byte(*b));
            }
            ScriptCommand::Scissor(s) => {
                e.u8(op::SCISSOR);
                match s {
                    Some((x, y, w, h)) => {
                        e.u8(1);
                        e.f32s(&[*x, *y, *w, *h]);
                    }
                    None => e.u8(0),
                }
            }
            ScriptCommand::Hidden(h) => {
                e.u8(op::HIDDEN);
                e.u8(*h as u8);
            }
            ScriptCommand::DrawLine { from, to } => {
                e.u8(op::DRAW_LINE);
                e.f32s(&[from.0, from.1, to.0, to.1]);
            }
            ScriptCommand::DrawRect { width, height } => {
                e.u8(op::DRAW_RECT);
                e.f32s(&[*width, *height]);
            }
            ScriptCommand::DrawRoundedRect {
                width,
                height,
                radius,
            } => {
                e.u8(op::DRAW_RRECT);
                e.f32s(&[*width, *height, *radius]);
            }
            ScriptCommand::DrawCircle { radius } => {
                e.u8(op::DRAW_CIRCLE);
                e.f32(*radius);
            }
            ScriptCommand::DrawEllipse { rx, ry } => {
                e.u8(op::DRAW_ELLIPSE);
                e.f32s(&[*rx, *ry]);
            }
            ScriptCommand::DrawTriangle { p1, p2, p3 } => {
                e.u8(op::DRAW_TRIANGLE);
                e.f32s(&[p1.0, p1.1, p2.0, p2.1, p3.0, p3.1]);
            }
            ScriptCommand::DrawQuad { p1, p2, p3, p4 } => {
                e.u8(op::DRAW_QUAD);
                e.f32s(&[p1.0, p1.1, p2.0, p2.1, p3.0, p3.1, p4.0, p4.1]);
            }
            ScriptCommand::DrawPath(commands) => {
                e.u8(op::DRAW_PATH);
                let bytes = encode_path(commands);
                e.blob_ref(&bytes);
            }
            ScriptCommand::DrawArc { radius, start, end } => {
                e.u8(op::DRAW_ARC);
                e.f32s(&[*radius, *start, *end]);
            }
            ScriptCommand::DrawSector { radius, start, end } => {
                e.u8(op::DRAW_SECTOR);
                e.f32s(&[*radius, *start, *end]);
            }
            ScriptCommand::DrawText(text) => {
                e.u8(op::DRAW_TEXT);
                e.blob_ref(text.as_bytes());
            }
            ScriptCommand::DrawSprites(draws) => {
                e.u8(op::DRAW_SPRITES);
                let bytes = encode_sprites(draws);
                e.blob_ref(&bytes);
            }
            ScriptCommand::DrawScript(id) => {
                e.u8(op::DRAW_SCRIPT);
                e.blob_ref(id.as_str().as_bytes());
            }
        }
    }
    e.finish()
}
