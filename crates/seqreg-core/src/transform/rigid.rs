//! Rigid transform implementation.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use nalgebra::Rotation2;
use serde::{Deserialize, Serialize};

use super::trait_::Transform;
use crate::spatial::{Point2, Vector2};

/// Rotation about a fixed centre followed by a translation.
///
/// `T(x) = R(angle) * (x - center) + center + translation`
///
/// Parameters are `[angle, cx, cy, tx, ty]` with the angle in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rigid2DTransform {
    pub angle: f64,
    pub center: Point2,
    pub translation: Vector2,
}

impl Default for Rigid2DTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Rigid2DTransform {
    pub const NUM_PARAMETERS: usize = 5;

    pub fn new(angle: f64, center: Point2, translation: Vector2) -> Self {
        Self {
            angle,
            center,
            translation,
        }
    }

    /// Zero angle, centre and translation.
    pub fn identity() -> Self {
        Self::new(0.0, Point2::origin(), Vector2::zeros())
    }

    pub fn parameters(&self) -> [f64; 5] {
        [
            self.angle,
            self.center.x,
            self.center.y,
            self.translation.x,
            self.translation.y,
        ]
    }

    /// # Panics
    /// Panics if `parameters` does not hold exactly five values.
    pub fn set_parameters(&mut self, parameters: &[f64]) {
        assert_eq!(
            parameters.len(),
            Self::NUM_PARAMETERS,
            "Rigid2D expects {} parameters, got {}",
            Self::NUM_PARAMETERS,
            parameters.len()
        );
        self.angle = parameters[0];
        self.center = Point2::new(parameters[1], parameters[2]);
        self.translation = Vector2::new(parameters[3], parameters[4]);
    }

    pub fn rotation(&self) -> Rotation2<f64> {
        Rotation2::new(self.angle)
    }

    pub fn transform_point(&self, point: &Point2) -> Point2 {
        self.center + self.rotation() * (point - self.center) + self.translation
    }

    /// Exact inverse about the same centre.
    pub fn inverse(&self) -> Self {
        let inverse_rotation = self.rotation().inverse();
        Self::new(-self.angle, self.center, -(inverse_rotation * self.translation))
    }

    /// `self ∘ inner`: apply `inner` first, then `self`.
    ///
    /// The result keeps `self`'s centre.
    pub fn compose_after(&self, inner: &Rigid2DTransform) -> Self {
        let ra = self.rotation();
        let rb = inner.rotation();
        // Expand inner about self.center, then apply self.
        let inner_offset = rb * (self.center - inner.center) + (inner.center - self.center)
            + inner.translation;
        let translation = ra * inner_offset + self.translation;
        Self::new(self.angle + inner.angle, self.center, translation)
    }
}

impl<B: Backend> Transform<B> for Rigid2DTransform {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();
        let (sin, cos) = self.angle.sin_cos();
        // Row vectors: y = x * R^T
        let rotation_t = Tensor::<B, 2>::from_floats(
            [[cos as f32, sin as f32], [-sin as f32, cos as f32]],
            &device,
        );
        let center = Tensor::<B, 1>::from_floats(
            [self.center.x as f32, self.center.y as f32],
            &device,
        )
        .reshape([1, 2]);
        let shift = Tensor::<B, 1>::from_floats(
            [
                (self.center.x + self.translation.x) as f32,
                (self.center.y + self.translation.y) as f32,
            ],
            &device,
        )
        .reshape([1, 2]);

        (points - center).matmul(rotation_t) + shift
    }
}
