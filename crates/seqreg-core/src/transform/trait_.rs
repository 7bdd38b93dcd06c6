//! Transform trait for spatial coordinate transformations.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Maps batches of physical points from one space to another.
///
/// Implementations are plain parameter holders; the trait only covers the
/// batched tensor path used by metrics and resampling.
pub trait Transform<B: Backend> {
    /// Apply the transform to a batch of points.
    ///
    /// # Arguments
    /// * `points` - Tensor of shape `[N, 2]` containing `(x, y)` points
    ///
    /// # Returns
    /// Tensor of shape `[N, 2]` containing the transformed points
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2>;
}
