use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use crate::image::Region;

/// Generate the continuous indices of every pixel of a `[height, width]` grid.
///
/// Returns a tensor of shape `[N, 2]` with rows `(x, y)` in row-major order.
///
/// # Arguments
/// * `shape` - The image shape `[height, width]`
/// * `device` - The device to create the tensor on
pub fn generate_grid<B: Backend>(shape: [usize; 2], device: &B::Device) -> Tensor<B, 2> {
    let [h, w] = shape;
    let total = h * w;

    let y_range = Tensor::<B, 1, Int>::arange(0..h as i64, device);
    let x_range = Tensor::<B, 1, Int>::arange(0..w as i64, device);

    let y_grid = y_range.reshape([h, 1]).repeat(&[1, w]).reshape([total]).float();
    let x_grid = x_range.reshape([1, w]).repeat(&[h, 1]).reshape([total]).float();

    Tensor::cat(vec![x_grid.unsqueeze_dim(1), y_grid.unsqueeze_dim(1)], 1)
}

/// Generate the indices of the pixels covered by `region`, offset by its start.
///
/// The region is expected to be clamped and non-empty.
pub fn generate_region_grid<B: Backend>(region: &Region, device: &B::Device) -> Tensor<B, 2> {
    let local = generate_grid::<B>([region.size.height, region.size.width], device);
    let offset = Tensor::<B, 1>::from_floats(
        [region.index.x as f32, region.index.y as f32],
        device,
    )
    .reshape([1, 2]);
    local + offset
}
