//! Interpolator trait for sampling values at continuous coordinates.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Samples a 2D image tensor at non-integer indices.
pub trait Interpolator<B: Backend> {
    /// Interpolate values from a tensor at given continuous indices.
    ///
    /// # Arguments
    /// * `data` - Image tensor `[height, width]`
    /// * `indices` - Continuous `(x, y)` indices `[N, 2]`
    ///
    /// # Returns
    /// Tensor of sampled values `[N]`
    fn interpolate(&self, data: &Tensor<B, 2>, indices: Tensor<B, 2>) -> Tensor<B, 1>;
}

/// `1.0` where an index lies inside the sampling domain of a
/// `[height, width]` buffer, `0.0` elsewhere.
///
/// The domain is `0 <= x <= width - 1` and `0 <= y <= height - 1`.
pub fn inside_buffer_mask<B: Backend>(shape: [usize; 2], indices: Tensor<B, 2>) -> Tensor<B, 1> {
    let [h, w] = shape;
    let x = indices.clone().narrow(1, 0, 1).squeeze::<1>(1);
    let y = indices.narrow(1, 1, 1).squeeze::<1>(1);

    let in_x = x.clone().greater_equal_elem(0.0).int() * x.lower_equal_elem((w as f32) - 1.0).int();
    let in_y = y.clone().greater_equal_elem(0.0).int() * y.lower_equal_elem((h as f32) - 1.0).int();

    (in_x * in_y).float()
}
