//! Error types for registration operations.
//!
//! Errors fall in two groups. Configuration errors mean the caller asked
//! for something that cannot run. Registration failures mean a single
//! unit (one pair, one location) could not be aligned; batch pipelines
//! record those and carry on.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistrationError {
    /// No sample of the fixed region mapped inside the moving image.
    #[error("No valid samples: {0}")]
    NoValidSamples(String),

    /// A region selected nothing after clamping to its image.
    #[error("Empty region: {0}")]
    EmptyRegion(String),

    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An image source could not produce a frame.
    #[error("Image {0} is not available from the source")]
    MissingImage(usize),

    #[error("Image validation error: {0}")]
    ImageValidationError(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    pub fn no_valid_samples(msg: impl Into<String>) -> Self {
        Self::NoValidSamples(msg.into())
    }

    pub fn empty_region(msg: impl Into<String>) -> Self {
        Self::EmptyRegion(msg.into())
    }

    pub fn numerical_instability(msg: impl Into<String>) -> Self {
        Self::NumericalInstability(msg.into())
    }

    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn image_validation(msg: impl Into<String>) -> Self {
        Self::ImageValidationError(msg.into())
    }

    /// True for failures of a single registration unit, as opposed to
    /// errors in how the registration was set up.
    pub fn is_registration_failure(&self) -> bool {
        matches!(
            self,
            Self::NoValidSamples(_)
                | Self::EmptyRegion(_)
                | Self::NumericalInstability(_)
                | Self::MissingImage(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = RegistrationError::no_valid_samples("all samples outside");
        assert_eq!(err.to_string(), "No valid samples: all samples outside");
        assert_eq!(
            RegistrationError::MissingImage(3).to_string(),
            "Image 3 is not available from the source"
        );
        let err = RegistrationError::ShapeMismatch {
            expected: vec![4],
            actual: vec![5],
        };
        assert_eq!(err.to_string(), "Shape mismatch: expected [4], got [5]");
    }

    #[test]
    fn test_failure_classification() {
        assert!(RegistrationError::empty_region("r").is_registration_failure());
        assert!(RegistrationError::MissingImage(0).is_registration_failure());
        assert!(!RegistrationError::invalid_configuration("c").is_registration_failure());
        assert!(!RegistrationError::image_validation("i").is_registration_failure());
    }
}
