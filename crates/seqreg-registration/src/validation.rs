//! Validation helpers shared by the configuration types.

use burn::tensor::backend::Backend;
use seqreg_core::Image;

use crate::error::{RegistrationError, Result};

/// Validate that an image has pixels and a usable spacing.
pub fn validate_image<B: Backend>(image: &Image<B>, role: &str) -> Result<()> {
    if image.size().is_empty() {
        return Err(RegistrationError::image_validation(format!(
            "{} image is empty",
            role
        )));
    }
    let spacing = image.spacing();
    if !(spacing.x > 0.0 && spacing.y > 0.0) {
        return Err(RegistrationError::image_validation(format!(
            "{} image spacing must be positive, got ({}, {})",
            role, spacing.x, spacing.y
        )));
    }
    Ok(())
}

/// Validate a strictly positive, finite value.
pub fn validate_positive(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(RegistrationError::invalid_configuration(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Validate the step length bounds of a step optimizer.
pub fn validate_step_lengths(max_step: f64, min_step: f64) -> Result<()> {
    validate_positive("Maximum step length", max_step)?;
    validate_positive("Minimum step length", min_step)?;
    if min_step > max_step {
        return Err(RegistrationError::invalid_configuration(format!(
            "Minimum step length {} exceeds maximum step length {}",
            min_step, max_step
        )));
    }
    Ok(())
}

/// Validate iteration count.
pub fn validate_iterations(iterations: usize) -> Result<()> {
    if iterations == 0 {
        return Err(RegistrationError::invalid_configuration(
            "Iterations must be positive",
        ));
    }
    if iterations > 1_000_000 {
        return Err(RegistrationError::invalid_configuration(format!(
            "Iterations too large: {}",
            iterations
        )));
    }
    Ok(())
}

/// Validate a step shrink factor, which must lie in `(0, 1)`.
pub fn validate_relaxation(factor: f64) -> Result<()> {
    if !(factor > 0.0 && factor < 1.0) {
        return Err(RegistrationError::invalid_configuration(format!(
            "Relaxation factor must be in (0, 1), got {}",
            factor
        )));
    }
    Ok(())
}

/// Validate per-parameter scales against the parameter count.
pub fn validate_scales(scales: &[f64], num_parameters: usize) -> Result<()> {
    if scales.len() != num_parameters {
        return Err(RegistrationError::ShapeMismatch {
            expected: vec![num_parameters],
            actual: vec![scales.len()],
        });
    }
    if let Some(bad) = scales.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
        return Err(RegistrationError::invalid_configuration(format!(
            "Parameter scales must be positive, got {}",
            bad
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use seqreg_core::spatial::{Point2, Size2, Spacing2};

    #[test]
    fn test_validate_step_lengths() {
        assert!(validate_step_lengths(4.0, 0.01).is_ok());
        assert!(validate_step_lengths(0.01, 4.0).is_err());
        assert!(validate_step_lengths(-1.0, 0.01).is_err());
        assert!(validate_step_lengths(f64::NAN, 0.01).is_err());
    }

    #[test]
    fn test_validate_iterations() {
        assert!(validate_iterations(100).is_ok());
        assert!(validate_iterations(0).is_err());
        assert!(validate_iterations(2_000_000).is_err());
    }

    #[test]
    fn test_validate_relaxation() {
        assert!(validate_relaxation(0.5).is_ok());
        assert!(validate_relaxation(1.0).is_err());
        assert!(validate_relaxation(0.0).is_err());
    }

    #[test]
    fn test_validate_scales() {
        assert!(validate_scales(&[1000.0, 1.0, 1.0, 1.0, 1.0], 5).is_ok());
        assert!(matches!(
            validate_scales(&[1.0], 2),
            Err(RegistrationError::ShapeMismatch { .. })
        ));
        assert!(validate_scales(&[1.0, 0.0], 2).is_err());
    }

    #[test]
    fn test_validate_image() {
        let image = Image::<NdArray<f32>>::from_vec(
            vec![0.0; 4],
            Size2::new(2, 2),
            Point2::origin(),
            Spacing2::new(1.0, 0.0),
            &Default::default(),
        );
        assert!(matches!(
            validate_image(&image, "Fixed"),
            Err(RegistrationError::ImageValidationError(_))
        ));
    }
}
