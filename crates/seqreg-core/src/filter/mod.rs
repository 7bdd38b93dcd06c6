//! Image filters used for preprocessing, pyramids and resampling.

pub mod downsample;
pub mod gaussian;
pub mod pyramid;
pub mod resample;
pub mod threshold;

pub use downsample::DownsampleFilter;
pub use gaussian::GaussianFilter;
pub use pyramid::{blur_schedule, shrink_schedule, MultiResolutionPyramid, PyramidLevel};
pub use resample::ResampleImageFilter;
pub use threshold::ThresholdFilter;
