//! Interpolation of image values at continuous indices.

pub mod linear;
pub mod trait_;

pub use linear::LinearInterpolator;
pub use trait_::{inside_buffer_mask, Interpolator};
