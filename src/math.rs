//! Minimal 2D affine math.
//!
//! This type covers the subset of planar affine transforms the compiler and
//! input router actually need (identity, multiply, invert, point and AABB
//! mapping) without pulling in a linear-algebra crate.

use serde::{Deserialize, Serialize};

/// A point in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// A 2D affine transform stored as the six varying entries of a 3×3 matrix.
///
/// Layout is `[a, b, c, d, tx, ty]`, mapping a point as:
///
/// ```text
/// x' = a·x + c·y + tx
/// y' = b·x + d·y + ty
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix(pub [f32; 6]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    #[inline]
    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self([a, b, c, d, tx, ty])
    }

    #[inline]
    pub const fn translation(dx: f32, dy: f32) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, dx, dy])
    }

    #[inline]
    pub const fn scaling(sx: f32, sy: f32) -> Self {
        Self([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    #[inline]
    pub fn rotation(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self([c, s, -s, c, 0.0, 0.0])
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Returns true when the transform is a pure translation.
    #[inline]
    pub fn is_translation(&self) -> bool {
        let [a, b, c, d, _, _] = self.0;
        a == 1.0 && b == 0.0 && c == 0.0 && d == 1.0
    }

    #[inline]
    pub fn tx(&self) -> f32 {
        self.0[4]
    }

    #[inline]
    pub fn ty(&self) -> f32 {
        self.0[5]
    }

    /// Composes `self ∘ other`: the result applies `other` first, then `self`.
    pub fn mul(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, tx1, ty1] = self.0;
        let [a2, b2, c2, d2, tx2, ty2] = other.0;
        Matrix([
            a1 * a2 + c1 * b2,
            b1 * a2 + d1 * b2,
            a1 * c2 + c1 * d2,
            b1 * c2 + d1 * d2,
            a1 * tx2 + c1 * ty2 + tx1,
            b1 * tx2 + d1 * ty2 + ty1,
        ])
    }

    /// Inverts the transform. Returns `None` for a singular matrix.
    pub fn invert(&self) -> Option<Matrix> {
        let [a, b, c, d, tx, ty] = self.0;
        let det = a * d - b * c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Matrix([
            d * inv,
            -b * inv,
            -c * inv,
            a * inv,
            (c * ty - d * tx) * inv,
            (b * tx - a * ty) * inv,
        ]))
    }

    #[inline]
    pub fn transform_point(&self, p: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.0;
        Point {
            x: a * p.x + c * p.y + tx,
            y: b * p.x + d * p.y + ty,
        }
    }

    /// Maps an AABB through the transform and returns the AABB of the result.
    pub fn transform_aabb(&self, aabb: Aabb) -> Aabb {
        let corners = [
            self.transform_point(Point::new(aabb.left, aabb.top)),
            self.transform_point(Point::new(aabb.left + aabb.width, aabb.top)),
            self.transform_point(Point::new(aabb.left, aabb.top + aabb.height)),
            self.transform_point(Point::new(aabb.left + aabb.width, aabb.top + aabb.height)),
        ];
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for p in corners {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Aabb::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An axis-aligned bounding box in the coordinate space it was computed in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Aabb {
    pub const ZERO: Aabb = Aabb {
        left: 0.0,
        top: 0.0,
        width: 0.0,
        height: 0.0,
    };

    #[inline]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    /// Smallest AABB covering both boxes. Zero-sized boxes at the origin are
    /// treated as empty so unions do not get dragged toward (0,0).
    pub fn union(&self, other: Aabb) -> Aabb {
        if self.width == 0.0 && self.height == 0.0 {
            return other;
        }
        if other.width == 0.0 && other.height == 0.0 {
            return *self;
        }
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Aabb::new(left, top, right - left, bottom - top)
    }
}
