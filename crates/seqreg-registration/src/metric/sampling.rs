//! Masked sample accumulation shared by the metrics.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use seqreg_core::image::generate_region_grid;
use seqreg_core::interpolation::{inside_buffer_mask, Interpolator};
use seqreg_core::transform::Transform;
use seqreg_core::{Image, Region, Transform2D};

use crate::error::{RegistrationError, Result};

/// Points per batch; bounds the size of intermediate tensors.
const CHUNK_SIZE: usize = 32768;

/// Sums over the fixed samples that mapped inside the moving image.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleSums {
    pub count: usize,
    pub sum_fixed: f64,
    pub sum_moving: f64,
    pub sum_fixed_sq: f64,
    pub sum_moving_sq: f64,
    pub sum_product: f64,
    pub sum_squared_diff: f64,
}

impl SampleSums {
    fn add(&mut self, values: &[f64]) {
        self.count += values[0].round() as usize;
        self.sum_fixed += values[1];
        self.sum_moving += values[2];
        self.sum_fixed_sq += values[3];
        self.sum_moving_sq += values[4];
        self.sum_product += values[5];
        self.sum_squared_diff += values[6];
    }
}

/// Sample `fixed` over `region` against `moving` mapped through `transform`.
///
/// Each fixed pixel index goes to physical space, through the transform,
/// and into the moving image's continuous index space. Samples landing
/// outside the moving buffer are dropped.
///
/// # Errors
/// * [`RegistrationError::EmptyRegion`] if the region misses the fixed image
/// * [`RegistrationError::NoValidSamples`] if no sample lands inside `moving`
pub fn accumulate_samples<B, I>(
    interpolator: &I,
    fixed: &Image<B>,
    region: &Region,
    moving: &Image<B>,
    transform: &Transform2D,
) -> Result<SampleSums>
where
    B: Backend,
    I: Interpolator<B>,
{
    let region = region.clamp_to(fixed.size());
    if region.is_empty() {
        return Err(RegistrationError::empty_region(format!(
            "fixed region at ({}, {}) does not overlap the {}x{} fixed image",
            region.index.x,
            region.index.y,
            fixed.size().width,
            fixed.size().height
        )));
    }

    let device = fixed.device();
    let n = region.num_pixels();
    let (x0, y0) = (region.index.x as usize, region.index.y as usize);
    let fixed_indices = generate_region_grid::<B>(&region, &device);
    let fixed_values = fixed
        .data()
        .clone()
        .slice([y0..y0 + region.size.height, x0..x0 + region.size.width])
        .reshape([n]);

    let mut sums = SampleSums::default();
    let mut start = 0;
    while start < n {
        let end = (start + CHUNK_SIZE).min(n);
        let chunk_indices = fixed_indices.clone().slice([start..end]);
        let points = fixed.index_to_world_tensor(chunk_indices);
        let moving_points = transform.transform_points(points);
        let moving_indices = moving.world_to_index_tensor(moving_points);

        let mask = inside_buffer_mask(moving.shape(), moving_indices.clone());
        let moving_values = interpolator.interpolate(moving.data(), moving_indices) * mask.clone();
        let fixed_chunk = fixed_values.clone().slice([start..end]) * mask.clone();
        let diff = moving_values.clone() - fixed_chunk.clone();

        let stats = Tensor::cat(
            vec![
                mask.sum(),
                fixed_chunk.clone().sum(),
                moving_values.clone().sum(),
                fixed_chunk.clone().powf_scalar(2.0).sum(),
                moving_values.clone().powf_scalar(2.0).sum(),
                (fixed_chunk * moving_values).sum(),
                diff.powf_scalar(2.0).sum(),
            ],
            0,
        );
        let values: Vec<f64> = stats.into_data().iter::<f64>().collect();
        sums.add(&values);
        start = end;
    }

    if sums.count == 0 {
        return Err(RegistrationError::no_valid_samples(format!(
            "none of the {} fixed samples map inside the moving image",
            n
        )));
    }
    Ok(sums)
}
