//! The closed drawing-command set.
//!
//! Commands come in two groups: state commands, which change the cumulative
//! transform or the active styles, and draw commands, which paint in the
//! current state. The compiler brackets state changes with
//! `PushState`/`PopState` so a consumer can replay the stream with a plain
//! state stack.

use crate::color::Color;
use crate::math::Matrix;
use crate::primitive::{PathCommand, SpriteDraw};
use crate::script::GraphId;
use crate::style::{LineCap, LineJoin, TextAlign, TextBase};

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    PushState,
    PopState,

    Transform(Matrix),
    Translate(f32, f32),
    Scale(f32, f32),
    Rotate(f32),

    FillColor(Color),
    StrokeColor(Color),
    StrokeWidth(f32),
    LineCap(LineCap),
    LineJoin(LineJoin),
    MiterLimit(f32),
    Font(String),
    FontSize(f32),
    TextAlign(TextAlign),
    TextBase(TextBase),
    Scissor(Option<(f32, f32, f32, f32)>),
    Hidden(bool),

    DrawLine {
        from: (f32, f32),
        to: (f32, f32),
    },
    DrawRect {
        width: f32,
        height: f32,
    },
    DrawRoundedRect {
        width: f32,
        height: f32,
        radius: f32,
    },
    DrawCircle {
        radius: f32,
    },
    DrawEllipse {
        rx: f32,
        ry: f32,
    },
    DrawTriangle {
        p1: (f32, f32),
        p2: (f32, f32),
        p3: (f32, f32),
    },
    DrawQuad {
        p1: (f32, f32),
        p2: (f32, f32),
        p3: (f32, f32),
        p4: (f32, f32),
    },
    DrawPath(Vec<PathCommand>),
    DrawArc {
        radius: f32,
        start: f32,
        end: f32,
    },
    DrawSector {
        radius: f32,
        start: f32,
        end: f32,
    },
    DrawText(String),
    DrawSprites(Vec<SpriteDraw>),
    /// Draw another registered script by id. The indirection is resolved by
    /// the consumer at draw time; referenced scripts are not inlined.
    DrawScript(GraphId),
}

impl ScriptCommand {
    /// True for commands that only alter state rather than paint.
    pub fn is_state(&self) -> bool {
        matches!(
            self,
            ScriptCommand::PushState
                | ScriptCommand::PopState
                | ScriptCommand::Transform(_)
                | ScriptCommand::Translate(..)
                | ScriptCommand::Scale(..)
                | ScriptCommand::Rotate(_)
                | ScriptCommand::FillColor(_)
                | ScriptCommand::StrokeColor(_)
                | ScriptCommand::StrokeWidth(_)
                | ScriptCommand::LineCap(_)
                | ScriptCommand::LineJoin(_)
                | ScriptCommand::MiterLimit(_)
                | ScriptCommand::Font(_)
                | ScriptCommand::FontSize(_)
                | ScriptCommand::TextAlign(_)
                | ScriptCommand::TextBase(_)
                | ScriptCommand::Scissor(_)
                | ScriptCommand::Hidden(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_vs_draw_split() {
        assert!(ScriptCommand::PushState.is_state());
        assert!(ScriptCommand::Translate(1.0, 2.0).is_state());
        assert!(ScriptCommand::Hidden(true).is_state());
        assert!(!ScriptCommand::DrawCircle { radius: 1.0 }.is_state());
        assert!(!ScriptCommand::DrawScript(GraphId::main()).is_state());
    }
}
