//! Similarity metrics.
//!
//! Metrics compare a fixed region against the moving image resampled
//! through a transform. Only fixed samples that map inside the moving
//! image contribute.

pub mod mse;
pub mod ncc;
pub mod sampling;
pub mod trait_;

pub use mse::MeanSquaredError;
pub use ncc::NormalizedCorrelation;
pub use sampling::{accumulate_samples, SampleSums};
pub use trait_::{Metric, OptimizationDirection};
