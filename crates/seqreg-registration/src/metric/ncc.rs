//! Normalized correlation metric implementation.

use burn::tensor::backend::Backend;
use seqreg_core::interpolation::LinearInterpolator;
use seqreg_core::{Image, Region, Transform2D};

use super::sampling::{accumulate_samples, SampleSums};
use super::trait_::{Metric, OptimizationDirection};
use crate::error::Result;

/// Denominators below this are treated as a flat signal.
const EPSILON: f64 = 1e-12;

/// Pearson correlation between fixed and resampled moving samples.
///
/// Ranges over `[-1, 1]` and is maximised. Flat signals yield `0`.
#[derive(Debug, Clone, Default)]
pub struct NormalizedCorrelation {
    interpolator: LinearInterpolator,
}

impl NormalizedCorrelation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Correlation coefficient from accumulated sums.
    pub fn from_sums(sums: &SampleSums) -> f64 {
        let n = sums.count as f64;
        let var_fixed = sums.sum_fixed_sq - sums.sum_fixed * sums.sum_fixed / n;
        let var_moving = sums.sum_moving_sq - sums.sum_moving * sums.sum_moving / n;
        let covariance = sums.sum_product - sums.sum_fixed * sums.sum_moving / n;
        let denominator = (var_fixed * var_moving).max(0.0).sqrt();
        if denominator <= EPSILON {
            0.0
        } else {
            (covariance / denominator).clamp(-1.0, 1.0)
        }
    }
}

impl<B: Backend> Metric<B> for NormalizedCorrelation {
    fn evaluate(
        &self,
        fixed: &Image<B>,
        region: &Region,
        moving: &Image<B>,
        transform: &Transform2D,
    ) -> Result<f64> {
        let sums = accumulate_samples(&self.interpolator, fixed, region, moving, transform)?;
        Ok(Self::from_sums(&sums))
    }

    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::Maximize
    }

    fn name(&self) -> &'static str {
        "NormalizedCorrelation"
    }
}
