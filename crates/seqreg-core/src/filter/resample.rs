//! Resample image filter.

use std::marker::PhantomData;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use tracing::debug;

use crate::image::{generate_grid, Image};
use crate::interpolation::{inside_buffer_mask, Interpolator};
use crate::spatial::{Point2, Size2, Spacing2};
use crate::transform::Transform;

/// Resample image filter.
///
/// For each output pixel the physical position is mapped through the
/// transform into the input image and interpolated there. Positions that
/// land outside the input receive the default pixel value.
///
/// The transform maps output physical space to input physical space.
/// A registration transform (fixed to moving) therefore resamples the
/// moving image onto the fixed grid.
pub struct ResampleImageFilter<B, T, I>
where
    B: Backend,
    T: Transform<B>,
    I: Interpolator<B>,
{
    size: Size2,
    origin: Point2,
    spacing: Spacing2,
    transform: T,
    interpolator: I,
    default_pixel_value: f64,
    _phantom: PhantomData<B>,
}

impl<B, T, I> ResampleImageFilter<B, T, I>
where
    B: Backend,
    T: Transform<B>,
    I: Interpolator<B>,
{
    /// # Arguments
    /// * `size` - Output image size (pixels)
    /// * `origin` - Output image origin (physical)
    /// * `spacing` - Output image spacing (physical)
    /// * `transform` - Transform from output space to input space
    /// * `interpolator` - Interpolator for input image sampling
    pub fn new(
        size: Size2,
        origin: Point2,
        spacing: Spacing2,
        transform: T,
        interpolator: I,
    ) -> Self {
        Self {
            size,
            origin,
            spacing,
            transform,
            interpolator,
            default_pixel_value: 0.0,
            _phantom: PhantomData,
        }
    }

    /// Output geometry copied from `reference`.
    pub fn new_from_reference(reference: &Image<B>, transform: T, interpolator: I) -> Self {
        Self::new(
            reference.size(),
            *reference.origin(),
            *reference.spacing(),
            transform,
            interpolator,
        )
    }

    pub fn with_default_pixel_value(mut self, value: f64) -> Self {
        self.default_pixel_value = value;
        self
    }

    pub fn apply(&self, input: &Image<B>) -> Image<B> {
        let device = input.device();
        let shape = [self.size.height, self.size.width];
        debug!(
            width = self.size.width,
            height = self.size.height,
            "resampling image"
        );

        let output = Image::new(Tensor::<B, 2>::zeros(shape, &device), self.origin, self.spacing);
        let indices = generate_grid::<B>(shape, &device);
        let points = output.index_to_world_tensor(indices);
        let input_points = self.transform.transform_points(points);
        let input_indices = input.world_to_index_tensor(input_points);

        let mask = inside_buffer_mask(input.shape(), input_indices.clone());
        let sampled = self.interpolator.interpolate(input.data(), input_indices);
        let fill = (mask.clone().neg() + 1.0) * self.default_pixel_value;
        let values = sampled * mask + fill;

        output.with_data(values.reshape(shape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::LinearInterpolator;
    use crate::spatial::Vector2;
    use crate::transform::Translation2DTransform;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_resample_translation() {
        let mut data = vec![0.0; 100];
        data[4 * 10 + 4] = 1.0;
        data[4 * 10 + 5] = 1.0;
        data[5 * 10 + 4] = 1.0;
        data[5 * 10 + 5] = 1.0;
        let image = Image::<TestBackend>::from_vec(
            data,
            Size2::new(10, 10),
            Point2::origin(),
            Spacing2::new(1.0, 1.0),
            &Default::default(),
        );

        // Output (x, y) samples input (x - 2, y - 1): the square moves by (+2, +1).
        let transform = Translation2DTransform::new(Vector2::new(-2.0, -1.0));
        let result = ResampleImageFilter::new_from_reference(&image, transform, LinearInterpolator)
            .with_default_pixel_value(-1.0)
            .apply(&image)
            .to_vec();

        assert!(result[5 * 10 + 6] > 0.9);
        assert!(result[5 * 10 + 7] > 0.9);
        assert!(result[6 * 10 + 6] > 0.9);
        assert!(result[6 * 10 + 7] > 0.9);
        assert!(result[4 * 10 + 4].abs() < 0.1);
        // Left columns map outside the input.
        assert_eq!(result[0], -1.0);
        assert_eq!(result[5 * 10 + 1], -1.0);
    }
}
