//! Metric trait for image similarity measurement.

use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use seqreg_core::{Image, Region, Transform2D};

use crate::error::Result;

/// Whether better alignment lowers or raises a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationDirection {
    Minimize,
    Maximize,
}

impl OptimizationDirection {
    /// `1.0` for maximisation, `-1.0` for minimisation.
    pub fn sign(&self) -> f64 {
        match self {
            OptimizationDirection::Minimize => -1.0,
            OptimizationDirection::Maximize => 1.0,
        }
    }

    /// Whether `candidate` is strictly better than `reference`.
    ///
    /// NaN is never better.
    pub fn is_better(&self, candidate: f64, reference: f64) -> bool {
        match self {
            OptimizationDirection::Minimize => candidate < reference,
            OptimizationDirection::Maximize => candidate > reference,
        }
    }
}

/// Metric trait for measuring similarity between images.
///
/// # Type Parameters
/// * `B` - The tensor backend
pub trait Metric<B: Backend>: Send + Sync {
    /// Evaluate the metric over `region` of the fixed image.
    ///
    /// # Arguments
    /// * `fixed` - The fixed (reference) image
    /// * `region` - Pixel region of `fixed` to sample; clamped to the image
    /// * `moving` - The moving image
    /// * `transform` - Maps fixed physical points into moving physical space
    fn evaluate(
        &self,
        fixed: &Image<B>,
        region: &Region,
        moving: &Image<B>,
        transform: &Transform2D,
    ) -> Result<f64>;

    /// Whether the optimiser should minimise or maximise this metric.
    fn direction(&self) -> OptimizationDirection;

    /// Get the name of this metric.
    fn name(&self) -> &'static str;

    /// Value and central-difference derivative at `transform`.
    ///
    /// Only parameters flagged in `active` are perturbed, by `±step`;
    /// inactive entries of the derivative are zero.
    fn value_and_derivative(
        &self,
        fixed: &Image<B>,
        region: &Region,
        moving: &Image<B>,
        transform: &Transform2D,
        active: &[bool],
        step: f64,
    ) -> Result<(f64, Vec<f64>)> {
        let value = self.evaluate(fixed, region, moving, transform)?;
        let parameters = transform.parameters();
        let mut derivative = vec![0.0; parameters.len()];

        for (i, _) in active.iter().enumerate().filter(|(_, a)| **a) {
            let mut forward = parameters.clone();
            forward[i] += step;
            let mut backward = parameters.clone();
            backward[i] -= step;

            let v_forward =
                self.evaluate(fixed, region, moving, &transform.with_parameters(&forward))?;
            let v_backward =
                self.evaluate(fixed, region, moving, &transform.with_parameters(&backward))?;
            derivative[i] = (v_forward - v_backward) / (2.0 * step);
        }

        Ok((value, derivative))
    }
}
