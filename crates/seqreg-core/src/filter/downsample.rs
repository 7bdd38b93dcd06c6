use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use crate::image::Image;

/// Downsample filter.
///
/// Reduces the image size by an integer factor by keeping every Nth pixel
/// starting at index 0. The origin is unchanged and the spacing grows by
/// the factor.
#[derive(Debug, Clone, Copy)]
pub struct DownsampleFilter {
    factor: usize,
}

impl DownsampleFilter {
    /// # Arguments
    /// * `factor` - Downsampling factor for both axes; values below 2 are a no-op.
    pub fn new(factor: usize) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn apply<B: Backend>(&self, image: &Image<B>) -> Image<B> {
        if self.factor <= 1 {
            return image.clone();
        }
        let mut data = image.data().clone();
        let device = data.device();
        let dims = data.dims();

        for (axis, &len) in dims.iter().enumerate() {
            let kept: Vec<i32> = (0..len).step_by(self.factor).map(|i| i as i32).collect();
            let indices = Tensor::<B, 1, Int>::from_ints(kept.as_slice(), &device);
            data = data.select(axis, indices);
        }

        let spacing = *image.spacing() * self.factor as f64;
        Image::new(data, *image.origin(), spacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Point2, Size2, Spacing2};
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_downsample_keeps_every_other_pixel() {
        let image = Image::<TestBackend>::from_vec(
            (0..20).map(|v| v as f32).collect(),
            Size2::new(5, 4),
            Point2::new(1.0, 2.0),
            Spacing2::new(0.5, 1.0),
            &Default::default(),
        );
        let out = DownsampleFilter::new(2).apply(&image);
        assert_eq!(out.size(), Size2::new(3, 2));
        assert_eq!(out.to_vec(), vec![0.0, 2.0, 4.0, 10.0, 12.0, 14.0]);
        assert_eq!(*out.spacing(), Spacing2::new(1.0, 2.0));
        assert_eq!(*out.origin(), Point2::new(1.0, 2.0));
    }
}
