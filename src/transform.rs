//! Declarative primitive transforms.

use crate::math::Matrix;

/// Optional affine components attached to a primitive.
///
/// At compile time the components collapse into one [`Matrix`], composed as
/// `translate ∘ pin ∘ rotate ∘ scale ∘ pin⁻¹ ∘ matrix`: rotation and scale
/// happen around the pin point, the explicit matrix (when present) applies
/// first, and translation applies last. A transform with no components set
/// is the identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transform {
    pub translate: Option<(f32, f32)>,
    pub scale: Option<(f32, f32)>,
    pub rotate: Option<f32>,
    pub pin: Option<(f32, f32)>,
    pub matrix: Option<Matrix>,
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(mut self, dx: f32, dy: f32) -> Self {
        self.translate = Some((dx, dy));
        self
    }

    pub fn scale(mut self, sx: f32, sy: f32) -> Self {
        self.scale = Some((sx, sy));
        self
    }

    pub fn rotate(mut self, radians: f32) -> Self {
        self.rotate = Some(radians);
        self
    }

    pub fn pin(mut self, px: f32, py: f32) -> Self {
        self.pin = Some((px, py));
        self
    }

    pub fn matrix(mut self, m: Matrix) -> Self {
        self.matrix = Some(m);
        self
    }

    pub fn is_identity(&self) -> bool {
        self.translate.is_none()
            && self.scale.is_none()
            && self.rotate.is_none()
            && self.matrix.is_none()
    }

    /// Collapse the components into a single affine matrix.
    pub fn to_matrix(&self) -> Matrix {
        if self.is_identity() {
            return Matrix::IDENTITY;
        }

        let mut m = self.matrix.unwrap_or(Matrix::IDENTITY);

        if self.scale.is_some() || self.rotate.is_some() {
            let (px, py) = self.pin.unwrap_or((0.0, 0.0));
            let mut inner = Matrix::IDENTITY;
            if let Some((sx, sy)) = self.scale {
                inner = Matrix::scaling(sx, sy).mul(&inner);
            }
            if let Some(r) = self.rotate {
                inner = Matrix::rotation(r).mul(&inner);
            }
            if px != 0.0 || py != 0.0 {
                inner = Matrix::translation(px, py)
                    .mul(&inner)
                    .mul(&Matrix::translation(-px, -py));
            }
            m = inner.mul(&m);
        }

        if let Some((dx, dy)) = self.translate {
            m = Matrix::translation(dx, dy).mul(&m);
        }

        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point;

    #[test]
    fn empty_transform_is_identity() {
        assert!(Transform::new().is_identity());
        assert_eq!(Transform::new().to_matrix(), Matrix::IDENTITY);
    }

    #[test]
    fn translate_only_yields_translation_matrix() {
        let m = Transform::new().translate(10.0, 20.0).to_matrix();
        assert!(m.is_translation());
        assert_eq!(m.transform_point(Point::ZERO), Point::new(10.0, 20.0));
    }

    #[test]
    fn rotation_happens_around_pin() {
        let m = Transform::new()
            .rotate(std::f32::consts::PI)
            .pin(10.0, 10.0)
            .to_matrix();
        let p = m.transform_point(Point::new(20.0, 10.0));
        assert!((p.x - 0.0).abs() < 1e-4);
        assert!((p.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn scale_then_translate_order() {
        let m = Transform::new().translate(5.0, 0.0).scale(2.0, 2.0).to_matrix();
        // scale first, translation applied to the scaled result
        assert_eq!(m.transform_point(Point::new(1.0, 1.0)), Point::new(7.0, 2.0));
    }
}
