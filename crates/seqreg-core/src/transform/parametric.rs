//! Parametric transform dispatch.
//!
//! The registration pipelines optimise over flat parameter vectors.
//! `Transform2D` ties each supported model to its parameter layout,
//! its persisted type name and the per-parameter scales the step
//! optimiser uses.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

use super::rigid::Rigid2DTransform;
use super::trait_::Transform;
use super::translation::Translation2DTransform;
use crate::spatial::{Point2, Vector2};

/// Gradient divisor for rotation angles (radians against physical units).
pub const DEFAULT_ANGLE_SCALE: f64 = 1000.0;

/// A 2D transform with a fixed-length parameter vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Transform2D {
    /// Parameters `[angle, cx, cy, tx, ty]`.
    Rigid2D(Rigid2DTransform),
    /// Parameters `[tx, ty]`.
    Translation2D(Translation2DTransform),
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Rigid2DTransform> for Transform2D {
    fn from(t: Rigid2DTransform) -> Self {
        Transform2D::Rigid2D(t)
    }
}

impl From<Translation2DTransform> for Transform2D {
    fn from(t: Translation2DTransform) -> Self {
        Transform2D::Translation2D(t)
    }
}

impl Transform2D {
    /// Rigid transform with all parameters zero.
    pub fn identity() -> Self {
        Transform2D::Rigid2D(Rigid2DTransform::identity())
    }

    /// Translation with both parameters zero.
    pub fn identity_translation() -> Self {
        Transform2D::Translation2D(Translation2DTransform::identity())
    }

    /// Default initialisation for registering `moving` onto `fixed`.
    ///
    /// Rotation is zero, the centre is the fixed image centre and the
    /// translation maps that centre onto the moving image centre.
    pub fn default_initial(fixed_center: Point2, moving_center: Point2) -> Self {
        Transform2D::Rigid2D(Rigid2DTransform::new(
            0.0,
            fixed_center,
            moving_center - fixed_center,
        ))
    }

    /// Name used when persisting the transform.
    pub fn type_name(&self) -> &'static str {
        match self {
            Transform2D::Rigid2D(_) => "Rigid2D",
            Transform2D::Translation2D(_) => "Translation2D",
        }
    }

    /// Rebuild a transform from its persisted name and parameters.
    ///
    /// `Translation2D` is honoured; every other name loads as a rigid
    /// transform. Returns `None` when the parameter count does not fit.
    pub fn from_type_name(name: &str, parameters: &[f64]) -> Option<Self> {
        let mut transform = match name {
            "Translation2D" => Transform2D::identity_translation(),
            _ => Transform2D::identity(),
        };
        if parameters.len() != transform.num_parameters() {
            return None;
        }
        transform.set_parameters(parameters);
        Some(transform)
    }

    pub fn num_parameters(&self) -> usize {
        match self {
            Transform2D::Rigid2D(_) => Rigid2DTransform::NUM_PARAMETERS,
            Transform2D::Translation2D(_) => Translation2DTransform::NUM_PARAMETERS,
        }
    }

    pub fn parameters(&self) -> Vec<f64> {
        match self {
            Transform2D::Rigid2D(t) => t.parameters().to_vec(),
            Transform2D::Translation2D(t) => t.parameters().to_vec(),
        }
    }

    /// Overwrite all parameters.
    ///
    /// # Panics
    /// Panics if the length differs from [`Transform2D::num_parameters`].
    pub fn set_parameters(&mut self, parameters: &[f64]) {
        match self {
            Transform2D::Rigid2D(t) => t.set_parameters(parameters),
            Transform2D::Translation2D(t) => t.set_parameters(parameters),
        }
    }

    /// Copy of `self` carrying `parameters`.
    pub fn with_parameters(&self, parameters: &[f64]) -> Self {
        let mut out = *self;
        out.set_parameters(parameters);
        out
    }

    /// Which parameters the optimiser may move.
    ///
    /// The rigid centre of rotation stays fixed during optimisation.
    pub fn active_parameters(&self) -> Vec<bool> {
        match self {
            Transform2D::Rigid2D(_) => vec![true, false, false, true, true],
            Transform2D::Translation2D(_) => vec![true, true],
        }
    }

    /// Per-parameter gradient divisors for the step optimiser.
    pub fn default_scales(&self) -> Vec<f64> {
        match self {
            Transform2D::Rigid2D(_) => vec![DEFAULT_ANGLE_SCALE, 1.0, 1.0, 1.0, 1.0],
            Transform2D::Translation2D(_) => vec![1.0, 1.0],
        }
    }

    pub fn transform_point(&self, point: &Point2) -> Point2 {
        match self {
            Transform2D::Rigid2D(t) => t.transform_point(point),
            Transform2D::Translation2D(t) => t.transform_point(point),
        }
    }

    /// Whether the transform maps every point to itself.
    pub fn is_identity(&self) -> bool {
        match self {
            Transform2D::Rigid2D(t) => t.angle == 0.0 && t.translation == Vector2::zeros(),
            Transform2D::Translation2D(t) => t.offset == Vector2::zeros(),
        }
    }

    pub fn inverse(&self) -> Self {
        match self {
            Transform2D::Rigid2D(t) => Transform2D::Rigid2D(t.inverse()),
            Transform2D::Translation2D(t) => Transform2D::Translation2D(t.inverse()),
        }
    }

    /// The transform expressed as a rigid transform about `center`.
    pub fn to_rigid(&self, center: Point2) -> Rigid2DTransform {
        match self {
            Transform2D::Rigid2D(t) => *t,
            Transform2D::Translation2D(t) => Rigid2DTransform::new(0.0, center, t.offset),
        }
    }

    /// Compose two transforms.
    ///
    /// With `pre == true` the result applies `b` first and then `a`
    /// (`a ∘ b`); with `pre == false` it applies `a` first and then `b`.
    ///
    /// Composing with an identity returns the other operand unchanged,
    /// two translations compose to a translation and every other
    /// combination yields a rigid transform centred on the outer operand.
    pub fn compose(a: &Transform2D, b: &Transform2D, pre: bool) -> Transform2D {
        let (outer, inner) = if pre { (a, b) } else { (b, a) };
        if inner.is_identity() {
            return *outer;
        }
        if outer.is_identity() {
            return *inner;
        }
        match (outer, inner) {
            (Transform2D::Translation2D(o), Transform2D::Translation2D(i)) => {
                Transform2D::Translation2D(Translation2DTransform::new(o.offset + i.offset))
            }
            (Transform2D::Translation2D(_), Transform2D::Rigid2D(i)) => {
                let o = outer.to_rigid(i.center);
                Transform2D::Rigid2D(o.compose_after(i))
            }
            (Transform2D::Rigid2D(o), _) => {
                let i = inner.to_rigid(o.center);
                Transform2D::Rigid2D(o.compose_after(&i))
            }
        }
    }
}

impl<B: Backend> Transform<B> for Transform2D {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            Transform2D::Rigid2D(t) => t.transform_points(points),
            Transform2D::Translation2D(t) => t.transform_points(points),
        }
    }
}
