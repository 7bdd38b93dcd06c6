//! Translation transform implementation.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::trait_::Transform;
use crate::spatial::{Point2, Vector2};

/// Pure translation: `T(x) = x + t`.
///
/// Parameters are `[tx, ty]` in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translation2DTransform {
    pub offset: Vector2,
}

impl Translation2DTransform {
    pub const NUM_PARAMETERS: usize = 2;

    pub fn new(offset: Vector2) -> Self {
        Self { offset }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn parameters(&self) -> [f64; 2] {
        [self.offset.x, self.offset.y]
    }

    /// # Panics
    /// Panics if `parameters` does not hold exactly two values.
    pub fn set_parameters(&mut self, parameters: &[f64]) {
        assert_eq!(
            parameters.len(),
            Self::NUM_PARAMETERS,
            "Translation2D expects {} parameters, got {}",
            Self::NUM_PARAMETERS,
            parameters.len()
        );
        self.offset = Vector2::new(parameters[0], parameters[1]);
    }

    pub fn transform_point(&self, point: &Point2) -> Point2 {
        point + self.offset
    }

    pub fn inverse(&self) -> Self {
        Self::new(-self.offset)
    }
}

impl<B: Backend> Transform<B> for Translation2DTransform {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let offset = Tensor::<B, 1>::from_floats(
            [self.offset.x as f32, self.offset.y as f32],
            &points.device(),
        )
        .reshape([1, 2]);
        points + offset
    }
}
