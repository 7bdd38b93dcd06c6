use burn::tensor::backend::Backend;

use crate::image::Image;

/// Clamps intensities into `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdFilter {
    lower: f64,
    upper: f64,
}

impl ThresholdFilter {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn apply<B: Backend>(&self, image: &Image<B>) -> Image<B> {
        image.with_data(image.data().clone().clamp(self.lower, self.upper))
    }
}
