//! Mean Squared Error metric implementation.

use burn::tensor::backend::Backend;
use seqreg_core::interpolation::LinearInterpolator;
use seqreg_core::{Image, Region, Transform2D};

use super::sampling::accumulate_samples;
use super::trait_::{Metric, OptimizationDirection};
use crate::error::Result;

/// Mean Squared Error Metric.
///
/// MSE = (1/N) * sum((Fixed(x) - Moving(T(x)))^2)
///
/// over the N fixed samples that map inside the moving image.
#[derive(Debug, Clone, Default)]
pub struct MeanSquaredError {
    interpolator: LinearInterpolator,
}

impl MeanSquaredError {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: Backend> Metric<B> for MeanSquaredError {
    fn evaluate(
        &self,
        fixed: &Image<B>,
        region: &Region,
        moving: &Image<B>,
        transform: &Transform2D,
    ) -> Result<f64> {
        let sums = accumulate_samples(&self.interpolator, fixed, region, moving, transform)?;
        Ok(sums.sum_squared_diff / sums.count as f64)
    }

    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::Minimize
    }

    fn name(&self) -> &'static str {
        "MeanSquaredError"
    }
}
