//! Drawable and structural primitives.
//!
//! A primitive is one node in a graph: a tagged data payload plus the
//! transform, styles, and addressing metadata shared by every tag. The
//! compiler consumes three per-tag capabilities: command emission for the
//! script, a local-space bounding box for the semantic index, and a point
//! containment predicate for hit testing.
//!
//! Hit predicates for shapes without a natural filled interior are coarse
//! by choice: `line` never hits (its data has no width), `path` tests its
//! bounding box, and `arc` tests like the sector it outlines.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::math::{Aabb, Point};
use crate::script::{GraphId, ScriptCommand};
use crate::style::StyleSet;
use crate::transform::Transform;

/// Per-graph primitive identifier. The root group is always uid 0.
pub type Uid = u32;

/// Uid of the root group in every graph.
pub const ROOT_UID: Uid = 0;

/// A stable, externally addressable element name.
///
/// Ids are scene-assigned strings. They address primitives for semantic
/// queries and come back attached to hit-tested input events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The tag of a primitive, used for by-module semantic queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Group,
    Rect,
    RoundedRect,
    Circle,
    Ellipse,
    Line,
    Triangle,
    Quad,
    Path,
    Arc,
    Sector,
    Text,
    Sprites,
    ScriptRef,
    ComponentRef,
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PrimitiveKind::Group => "group",
            PrimitiveKind::Rect => "rect",
            PrimitiveKind::RoundedRect => "rounded_rect",
            PrimitiveKind::Circle => "circle",
            PrimitiveKind::Ellipse => "ellipse",
            PrimitiveKind::Line => "line",
            PrimitiveKind::Triangle => "triangle",
            PrimitiveKind::Quad => "quad",
            PrimitiveKind::Path => "path",
            PrimitiveKind::Arc => "arc",
            PrimitiveKind::Sector => "sector",
            PrimitiveKind::Text => "text",
            PrimitiveKind::Sprites => "sprites",
            PrimitiveKind::ScriptRef => "script_ref",
            PrimitiveKind::ComponentRef => "component_ref",
        };
        write!(f, "{s}")
    }
}

/// One segment of a path primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    BezierTo(f32, f32, f32, f32, f32, f32),
    QuadTo(f32, f32, f32, f32),
    Close,
}

/// One sprite blit: a source rectangle from an image drawn into a
/// destination rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDraw {
    pub src: (f32, f32, f32, f32),
    pub dst: (f32, f32, f32, f32),
    pub image_id: String,
}

/// The tagged payload of a primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveData {
    Group { children: Vec<Uid> },
    Rect { width: f32, height: f32 },
    RoundedRect { width: f32, height: f32, radius: f32 },
    Circle { radius: f32 },
    Ellipse { rx: f32, ry: f32 },
    Line { from: (f32, f32), to: (f32, f32) },
    Triangle { p1: (f32, f32), p2: (f32, f32), p3: (f32, f32) },
    Quad { p1: (f32, f32), p2: (f32, f32), p3: (f32, f32), p4: (f32, f32) },
    Path { commands: Vec<PathCommand> },
    Arc { radius: f32, start: f32, end: f32 },
    Sector { radius: f32, start: f32, end: f32 },
    Text { text: String },
    Sprites { draws: Vec<SpriteDraw> },
    /// Defers drawing to another registered script at draw time. Not
    /// recursively compiled.
    ScriptRef { id: GraphId },
    /// Hosts a child scene's graph. Draws through the same indirection as
    /// `ScriptRef`; carries child uids like a group.
    ComponentRef { id: GraphId, children: Vec<Uid> },
}

impl PrimitiveData {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveData::Group { .. } => PrimitiveKind::Group,
            PrimitiveData::Rect { .. } => PrimitiveKind::Rect,
            PrimitiveData::RoundedRect { .. } => PrimitiveKind::RoundedRect,
            PrimitiveData::Circle { .. } => PrimitiveKind::Circle,
            PrimitiveData::Ellipse { .. } => PrimitiveKind::Ellipse,
            PrimitiveData::Line { .. } => PrimitiveKind::Line,
            PrimitiveData::Triangle { .. } => PrimitiveKind::Triangle,
            PrimitiveData::Quad { .. } => PrimitiveKind::Quad,
            PrimitiveData::Path { .. } => PrimitiveKind::Path,
            PrimitiveData::Arc { .. } => PrimitiveKind::Arc,
            PrimitiveData::Sector { .. } => PrimitiveKind::Sector,
            PrimitiveData::Text { .. } => PrimitiveKind::Text,
            PrimitiveData::Sprites { .. } => PrimitiveKind::Sprites,
            PrimitiveData::ScriptRef { .. } => PrimitiveKind::ScriptRef,
            PrimitiveData::ComponentRef { .. } => PrimitiveKind::ComponentRef,
        }
    }

    /// Child uid list for container tags.
    pub fn children(&self) -> Option<&[Uid]> {
        match self {
            PrimitiveData::Group { children } => Some(children),
            PrimitiveData::ComponentRef { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Uid>> {
        match self {
            PrimitiveData::Group { children } => Some(children),
            PrimitiveData::ComponentRef { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Sanity-check the payload. The type system enforces the shape per
    /// tag; this catches numerically nonsensical data before compilation
    /// commits it.
    pub fn validate(&self) -> Result<(), String> {
        fn finite(vals: &[f32], what: &str) -> Result<(), String> {
            if vals.iter().all(|v| v.is_finite()) {
                Ok(())
            } else {
                Err(format!("{what} contains a non-finite value"))
            }
        }
        fn non_negative(v: f32, what: &str) -> Result<(), String> {
            if v >= 0.0 {
                Ok(())
            } else {
                Err(format!("{what} must be non-negative, got {v}"))
            }
        }

        match self {
            PrimitiveData::Group { .. } | PrimitiveData::ComponentRef { .. } => Ok(()),
            PrimitiveData::Rect { width, height } => {
                finite(&[*width, *height], "rect")?;
                non_negative(*width, "rect width")?;
                non_negative(*height, "rect height")
            }
            PrimitiveData::RoundedRect {
                width,
                height,
                radius,
            } => {
                finite(&[*width, *height, *radius], "rounded_rect")?;
                non_negative(*width, "rounded_rect width")?;
                non_negative(*height, "rounded_rect height")?;
                non_negative(*radius, "rounded_rect radius")
            }
            PrimitiveData::Circle { radius } => {
                finite(&[*radius], "circle")?;
                non_negative(*radius, "circle radius")
            }
            PrimitiveData::Ellipse { rx, ry } => {
                finite(&[*rx, *ry], "ellipse")?;
                non_negative(*rx, "ellipse rx")?;
                non_negative(*ry, "ellipse ry")
            }
            PrimitiveData::Line { from, to } => finite(&[from.0, from.1, to.0, to.1], "line"),
            PrimitiveData::Triangle { p1, p2, p3 } => {
                finite(&[p1.0, p1.1, p2.0, p2.1, p3.0, p3.1], "triangle")
            }
            PrimitiveData::Quad { p1, p2, p3, p4 } => finite(
                &[p1.0, p1.1, p2.0, p2.1, p3.0, p3.1, p4.0, p4.1],
                "quad",
            ),
            PrimitiveData::Path { commands } => {
                for cmd in commands {
                    match cmd {
                        PathCommand::MoveTo(x, y) | PathCommand::LineTo(x, y) => {
                            finite(&[*x, *y], "path")?
                        }
                        PathCommand::BezierTo(a, b, c, d, e, f) => {
                            finite(&[*a, *b, *c, *d, *e, *f], "path")?
                        }
                        PathCommand::QuadTo(a, b, c, d) => finite(&[*a, *b, *c, *d], "path")?,
                        PathCommand::Close => {}
                    }
                }
                Ok(())
            }
            PrimitiveData::Arc { radius, start, end }
            | PrimitiveData::Sector { radius, start, end } => {
                finite(&[*radius, *start, *end], "arc")?;
                non_negative(*radius, "arc radius")
            }
            PrimitiveData::Text { .. } => Ok(()),
            PrimitiveData::Sprites { draws } => {
                for d in draws {
                    finite(
                        &[d.src.0, d.src.1, d.src.2, d.src.3, d.dst.0, d.dst.1, d.dst.2, d.dst.3],
                        "sprites",
                    )?;
                }
                Ok(())
            }
            PrimitiveData::ScriptRef { .. } => Ok(()),
        }
    }

    /// Emit this primitive's drawing commands. Structural tags emit
    /// nothing; reference tags emit the `DrawScript` indirection.
    pub fn commands(&self, out: &mut Vec<ScriptCommand>) {
        match self {
            PrimitiveData::Group { .. } => {}
            PrimitiveData::Rect { width, height } => out.push(ScriptCommand::DrawRect {
                width: *width,
                height: *height,
            }),
            PrimitiveData::RoundedRect {
                width,
                height,
                radius,
            } => out.push(ScriptCommand::DrawRoundedRect {
                width: *width,
                height: *height,
                radius: *radius,
            }),
            PrimitiveData::Circle { radius } => {
                out.push(ScriptCommand::DrawCircle { radius: *radius })
            }
            PrimitiveData::Ellipse { rx, ry } => {
                out.push(ScriptCommand::DrawEllipse { rx: *rx, ry: *ry })
            }
            PrimitiveData::Line { from, to } => out.push(ScriptCommand::DrawLine {
                from: *from,
                to: *to,
            }),
            PrimitiveData::Triangle { p1, p2, p3 } => out.push(ScriptCommand::DrawTriangle {
                p1: *p1,
                p2: *p2,
                p3: *p3,
            }),
            PrimitiveData::Quad { p1, p2, p3, p4 } => out.push(ScriptCommand::DrawQuad {
                p1: *p1,
                p2: *p2,
                p3: *p3,
                p4: *p4,
            }),
            PrimitiveData::Path { commands } => {
                out.push(ScriptCommand::DrawPath(commands.clone()))
            }
            PrimitiveData::Arc { radius, start, end } => out.push(ScriptCommand::DrawArc {
                radius: *radius,
                start: *start,
                end: *end,
            }),
            PrimitiveData::Sector { radius, start, end } => out.push(ScriptCommand::DrawSector {
                radius: *radius,
                start: *start,
                end: *end,
            }),
            PrimitiveData::Text { text } => out.push(ScriptCommand::DrawText(text.clone())),
            PrimitiveData::Sprites { draws } => {
                out.push(ScriptCommand::DrawSprites(draws.clone()))
            }
            PrimitiveData::ScriptRef { id } => out.push(ScriptCommand::DrawScript(id.clone())),
            PrimitiveData::ComponentRef { id, .. } => {
                out.push(ScriptCommand::DrawScript(id.clone()))
            }
        }
    }

    /// Local-space bounding box. Text has no metrics available here, so its
    /// box is a deterministic estimate from the resolved font size.
    pub fn bounds(&self, styles: &StyleSet) -> Aabb {
        match self {
            PrimitiveData::Group { .. }
            | PrimitiveData::ScriptRef { .. }
            | PrimitiveData::ComponentRef { .. } => Aabb::ZERO,
            PrimitiveData::Rect { width, height } => Aabb::new(0.0, 0.0, *width, *height),
            PrimitiveData::RoundedRect { width, height, .. } => {
                Aabb::new(0.0, 0.0, *width, *height)
            }
            PrimitiveData::Circle { radius } => {
                Aabb::new(-radius, -radius, radius * 2.0, radius * 2.0)
            }
            PrimitiveData::Ellipse { rx, ry } => Aabb::new(-rx, -ry, rx * 2.0, ry * 2.0),
            PrimitiveData::Line { from, to } => points_aabb(&[*from, *to]),
            PrimitiveData::Triangle { p1, p2, p3 } => points_aabb(&[*p1, *p2, *p3]),
            PrimitiveData::Quad { p1, p2, p3, p4 } => points_aabb(&[*p1, *p2, *p3, *p4]),
            PrimitiveData::Path { commands } => {
                let mut pts = Vec::new();
                for cmd in commands {
                    match cmd {
                        PathCommand::MoveTo(x, y) | PathCommand::LineTo(x, y) => {
                            pts.push((*x, *y))
                        }
                        PathCommand::BezierTo(c1x, c1y, c2x, c2y, x, y) => {
                            pts.push((*c1x, *c1y));
                            pts.push((*c2x, *c2y));
                            pts.push((*x, *y));
                        }
                        PathCommand::QuadTo(cx, cy, x, y) => {
                            pts.push((*cx, *cy));
                            pts.push((*x, *y));
                        }
                        PathCommand::Close => {}
                    }
                }
                points_aabb(&pts)
            }
            PrimitiveData::Arc { radius, .. } | PrimitiveData::Sector { radius, .. } => {
                Aabb::new(-radius, -radius, radius * 2.0, radius * 2.0)
            }
            PrimitiveData::Text { text } => {
                let size = styles.font_size();
                let ascent = size * 0.8;
                let width = text.chars().count() as f32 * size * 0.5;
                Aabb::new(0.0, -ascent, width, size)
            }
            PrimitiveData::Sprites { draws } => draws.iter().fold(Aabb::ZERO, |acc, d| {
                acc.union(Aabb::new(d.dst.0, d.dst.1, d.dst.2, d.dst.3))
            }),
        }
    }

    /// Point containment in local coordinates.
    pub fn contains_point(&self, p: Point) -> bool {
        match self {
            PrimitiveData::Group { .. }
            | PrimitiveData::ScriptRef { .. }
            | PrimitiveData::ComponentRef { .. }
            | PrimitiveData::Line { .. } => false,
            PrimitiveData::Rect { width, height } => {
                p.x >= 0.0 && p.x <= *width && p.y >= 0.0 && p.y <= *height
            }
            PrimitiveData::RoundedRect {
                width,
                height,
                radius,
            } => rounded_rect_contains(*width, *height, *radius, p),
            PrimitiveData::Circle { radius } => p.x * p.x + p.y * p.y <= radius * radius,
            PrimitiveData::Ellipse { rx, ry } => {
                if *rx == 0.0 || *ry == 0.0 {
                    return false;
                }
                let nx = p.x / rx;
                let ny = p.y / ry;
                nx * nx + ny * ny <= 1.0
            }
            PrimitiveData::Triangle { p1, p2, p3 } => triangle_contains(*p1, *p2, *p3, p),
            PrimitiveData::Quad { p1, p2, p3, p4 } => {
                triangle_contains(*p1, *p2, *p3, p) || triangle_contains(*p1, *p3, *p4, p)
            }
            PrimitiveData::Path { .. } => self.bounds(&StyleSet::new()).contains(p),
            PrimitiveData::Arc { radius, start, end }
            | PrimitiveData::Sector { radius, start, end } => {
                sector_contains(*radius, *start, *end, p)
            }
            PrimitiveData::Text { .. } => false,
            PrimitiveData::Sprites { draws } => draws
                .iter()
                .any(|d| Aabb::new(d.dst.0, d.dst.1, d.dst.2, d.dst.3).contains(p)),
        }
    }
}

fn points_aabb(pts: &[(f32, f32)]) -> Aabb {
    if pts.is_empty() {
        return Aabb::ZERO;
    }
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for (x, y) in pts {
        min_x = min_x.min(*x);
        min_y = min_y.min(*y);
        max_x = max_x.max(*x);
        max_y = max_y.max(*y);
    }
    Aabb::new(min_x, min_y, max_x - min_x, max_y - min_y)
}

fn rounded_rect_contains(width: f32, height: f32, radius: f32, p: Point) -> bool {
    if p.x < 0.0 || p.x > width || p.y < 0.0 || p.y > height {
        return false;
    }
    let r = radius.min(width / 2.0).min(height / 2.0);
    // nearest corner center, if the point is in a corner square
    let cx = if p.x < r {
        r
    } else if p.x > width - r {
        width - r
    } else {
        return true;
    };
    let cy = if p.y < r {
        r
    } else if p.y > height - r {
        height - r
    } else {
        return true;
    };
    let dx = p.x - cx;
    let dy = p.y - cy;
    dx * dx + dy * dy <= r * r
}

fn triangle_contains(p1: (f32, f32), p2: (f32, f32), p3: (f32, f32), p: Point) -> bool {
    fn sign(a: (f32, f32), b: (f32, f32), p: Point) -> f32 {
        (p.x - b.0) * (a.1 - b.1) - (a.0 - b.0) * (p.y - b.1)
    }
    let d1 = sign(p1, p2, p);
    let d2 = sign(p2, p3, p);
    let d3 = sign(p3, p1, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

fn sector_contains(radius: f32, start: f32, end: f32, p: Point) -> bool {
    use std::f32::consts::TAU;
    if p.x * p.x + p.y * p.y > radius * radius {
        return false;
    }
    if p.x == 0.0 && p.y == 0.0 {
        return true;
    }
    let sweep = end - start;
    if sweep.abs() >= TAU {
        return true;
    }
    let angle = p.y.atan2(p.x);
    if sweep >= 0.0 {
        let rel = (angle - start).rem_euclid(TAU);
        rel <= sweep
    } else {
        let rel = (start - angle).rem_euclid(TAU);
        rel <= -sweep
    }
}

/// Explicit semantic metadata attached to a primitive. Fields left `None`
/// fall back to inferred defaults at compile time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SemanticMeta {
    pub kind: Option<String>,
    pub role: Option<String>,
    pub label: Option<String>,
    pub value: Option<String>,
    pub clickable: Option<bool>,
    pub focusable: Option<bool>,
}

/// One node of a scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub data: PrimitiveData,
    pub transform: Transform,
    pub styles: StyleSet,
    pub id: Option<ElementId>,
    pub semantic: Option<SemanticMeta>,
}

impl Primitive {
    pub fn new(data: PrimitiveData) -> Self {
        Self {
            data,
            transform: Transform::default(),
            styles: StyleSet::default(),
            id: None,
            semantic: None,
        }
    }

    pub fn group() -> Self {
        Self::new(PrimitiveData::Group {
            children: Vec::new(),
        })
    }

    pub fn rect(width: f32, height: f32) -> Self {
        Self::new(PrimitiveData::Rect { width, height })
    }

    pub fn rounded_rect(width: f32, height: f32, radius: f32) -> Self {
        Self::new(PrimitiveData::RoundedRect {
            width,
            height,
            radius,
        })
    }

    pub fn circle(radius: f32) -> Self {
        Self::new(PrimitiveData::Circle { radius })
    }

    pub fn ellipse(rx: f32, ry: f32) -> Self {
        Self::new(PrimitiveData::Ellipse { rx, ry })
    }

    pub fn line(from: (f32, f32), to: (f32, f32)) -> Self {
        Self::new(PrimitiveData::Line { from, to })
    }

    pub fn triangle(p1: (f32, f32), p2: (f32, f32), p3: (f32, f32)) -> Self {
        Self::new(PrimitiveData::Triangle { p1, p2, p3 })
    }

    pub fn quad(p1: (f32, f32), p2: (f32, f32), p3: (f32, f32), p4: (f32, f32)) -> Self {
        Self::new(PrimitiveData::Quad { p1, p2, p3, p4 })
    }

    pub fn path(commands: Vec<PathCommand>) -> Self {
        Self::new(PrimitiveData::Path { commands })
    }

    pub fn arc(radius: f32, start: f32, end: f32) -> Self {
        Self::new(PrimitiveData::Arc { radius, start, end })
    }

    pub fn sector(radius: f32, start: f32, end: f32) -> Self {
        Self::new(PrimitiveData::Sector { radius, start, end })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(PrimitiveData::Text { text: text.into() })
    }

    pub fn sprites(draws: Vec<SpriteDraw>) -> Self {
        Self::new(PrimitiveData::Sprites { draws })
    }

    pub fn script_ref(id: impl Into<GraphId>) -> Self {
        Self::new(PrimitiveData::ScriptRef { id: id.into() })
    }

    pub fn component_ref(id: impl Into<GraphId>) -> Self {
        Self::new(PrimitiveData::ComponentRef {
            id: id.into(),
            children: Vec::new(),
        })
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_style(mut self, style: crate::style::StyleValue) -> Self {
        self.styles.set(style);
        self
    }

    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_semantic(mut self, semantic: SemanticMeta) -> Self {
        self.semantic = Some(semantic);
        self
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.data.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn rect_containment() {
        let rect = PrimitiveData::Rect {
            width: 100.0,
            height: 50.0,
        };
        assert!(rect.contains_point(Point::new(50.0, 25.0)));
        assert!(rect.contains_point(Point::new(0.0, 0.0)));
        assert!(rect.contains_point(Point::new(100.0, 50.0)));
        assert!(!rect.contains_point(Point::new(100.1, 25.0)));
        assert!(!rect.contains_point(Point::new(-0.1, 25.0)));
    }

    #[test]
    fn rounded_rect_cuts_corners() {
        let rr = PrimitiveData::RoundedRect {
            width: 100.0,
            height: 100.0,
            radius: 20.0,
        };
        assert!(rr.contains_point(Point::new(50.0, 50.0)));
        // inside the square but outside the corner round
        assert!(!rr.contains_point(Point::new(1.0, 1.0)));
        assert!(rr.contains_point(Point::new(20.0, 20.0)));
    }

    #[test]
    fn circle_and_ellipse_containment() {
        let c = PrimitiveData::Circle { radius: 10.0 };
        assert!(c.contains_point(Point::new(7.0, 7.0)));
        assert!(!c.contains_point(Point::new(8.0, 8.0)));

        let e = PrimitiveData::Ellipse { rx: 10.0, ry: 5.0 };
        assert!(e.contains_point(Point::new(9.0, 0.0)));
        assert!(!e.contains_point(Point::new(0.0, 6.0)));
    }

    #[test]
    fn triangle_containment_either_winding() {
        let ccw = PrimitiveData::Triangle {
            p1: (0.0, 0.0),
            p2: (10.0, 0.0),
            p3: (0.0, 10.0),
        };
        let cw = PrimitiveData::Triangle {
            p1: (0.0, 0.0),
            p2: (0.0, 10.0),
            p3: (10.0, 0.0),
        };
        let inside = Point::new(2.0, 2.0);
        let outside = Point::new(8.0, 8.0);
        assert!(ccw.contains_point(inside));
        assert!(cw.contains_point(inside));
        assert!(!ccw.contains_point(outside));
        assert!(!cw.contains_point(outside));
    }

    #[test]
    fn sector_respects_angle_span() {
        let s = PrimitiveData::Sector {
            radius: 10.0,
            start: 0.0,
            end: FRAC_PI_2,
        };
        assert!(s.contains_point(Point::new(3.0, 3.0)));
        assert!(!s.contains_point(Point::new(3.0, -3.0)));
        assert!(!s.contains_point(Point::new(-3.0, 3.0)));

        let full = PrimitiveData::Sector {
            radius: 10.0,
            start: 0.0,
            end: 2.0 * PI,
        };
        assert!(full.contains_point(Point::new(-3.0, -3.0)));
    }

    #[test]
    fn line_never_hits() {
        let l = PrimitiveData::Line {
            from: (0.0, 0.0),
            to: (10.0, 10.0),
        };
        assert!(!l.contains_point(Point::new(5.0, 5.0)));
    }

    #[test]
    fn bounds_for_simple_shapes() {
        let rect = PrimitiveData::Rect {
            width: 100.0,
            height: 50.0,
        };
        assert_eq!(rect.bounds(&StyleSet::new()), Aabb::new(0.0, 0.0, 100.0, 50.0));

        let circle = PrimitiveData::Circle { radius: 5.0 };
        assert_eq!(
            circle.bounds(&StyleSet::new()),
            Aabb::new(-5.0, -5.0, 10.0, 10.0)
        );

        let tri = PrimitiveData::Triangle {
            p1: (0.0, 0.0),
            p2: (10.0, 0.0),
            p3: (5.0, -8.0),
        };
        assert_eq!(tri.bounds(&StyleSet::new()), Aabb::new(0.0, -8.0, 10.0, 8.0));
    }

    #[test]
    fn validate_rejects_bad_numbers() {
        assert!(PrimitiveData::Rect {
            width: f32::NAN,
            height: 1.0
        }
        .validate()
        .is_err());
        assert!(PrimitiveData::Circle { radius: -1.0 }.validate().is_err());
        assert!(PrimitiveData::Rect {
            width: 10.0,
            height: 0.0
        }
        .validate()
        .is_ok());
    }
}
