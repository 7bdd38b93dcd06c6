//! Intensity clamping and smoothing applied before registration.

use burn::tensor::backend::Backend;
use seqreg_core::filter::{GaussianFilter, ThresholdFilter};
use seqreg_core::Image;
use serde::{Deserialize, Serialize};

use crate::error::{RegistrationError, Result};

/// Optional clamp-then-smooth preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    pub enabled: bool,
    /// Intensities below this are raised to it.
    pub lower: f64,
    /// Intensities above this are lowered to it.
    pub upper: f64,
    /// Gaussian sigma in physical units; zero skips smoothing.
    pub sigma: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lower: 0.0,
            upper: 65535.0,
            sigma: 1.0,
        }
    }
}

impl PreprocessConfig {
    /// Enabled preprocessing with the given window and sigma.
    pub fn new(lower: f64, upper: f64, sigma: f64) -> Self {
        Self {
            enabled: true,
            lower,
            upper,
            sigma,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.lower <= self.upper) {
            return Err(RegistrationError::invalid_configuration(format!(
                "Intensity window is empty: [{}, {}]",
                self.lower, self.upper
            )));
        }
        if !(self.sigma >= 0.0) {
            return Err(RegistrationError::invalid_configuration(format!(
                "Smoothing sigma must be non-negative, got {}",
                self.sigma
            )));
        }
        Ok(())
    }

    /// Apply the preprocessing, or return a copy when disabled.
    pub fn apply<B: Backend>(&self, image: &Image<B>) -> Image<B> {
        if !self.enabled {
            return image.clone();
        }
        let clamped = ThresholdFilter::new(self.lower, self.upper).apply(image);
        if self.sigma > 0.0 {
            GaussianFilter::isotropic(self.sigma).apply(&clamped)
        } else {
            clamped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use seqreg_core::spatial::{Point2, Size2, Spacing2};

    #[test]
    fn test_clamp_without_smoothing() {
        let image = Image::<NdArray<f32>>::from_vec(
            vec![-1.0, 5.0, 20.0, 7.0],
            Size2::new(2, 2),
            Point2::origin(),
            Spacing2::new(1.0, 1.0),
            &Default::default(),
        );
        let out = PreprocessConfig::new(0.0, 10.0, 0.0).apply(&image);
        assert_eq!(out.to_vec(), vec![0.0, 5.0, 10.0, 7.0]);

        let untouched = PreprocessConfig::disabled().apply(&image);
        assert_eq!(untouched.to_vec(), image.to_vec());
    }

    #[test]
    fn test_validate() {
        assert!(PreprocessConfig::new(10.0, 0.0, 1.0).validate().is_err());
        assert!(PreprocessConfig::new(0.0, 10.0, -1.0).validate().is_err());
        assert!(PreprocessConfig::default().validate().is_ok());
    }
}
