use burn::tensor::backend::Backend;
use burn::tensor::ops::ConvOptions;
use burn::tensor::Tensor;

use crate::image::Image;
use crate::spatial::Spacing2;

/// Gaussian smoothing filter.
///
/// Separable 1D convolutions with sigmas in physical units, so the pixel
/// footprint follows the image spacing. Each pass is divided by the
/// kernel mass that fell inside the image, which keeps flat regions flat
/// up to the border.
#[derive(Debug, Clone)]
pub struct GaussianFilter {
    sigmas: [f64; 2],
    max_kernel_width: usize,
}

impl GaussianFilter {
    /// Create a filter with per-axis standard deviations `(x, y)` in physical units.
    pub fn new(sigmas: [f64; 2]) -> Self {
        Self {
            sigmas,
            max_kernel_width: 32,
        }
    }

    /// Same standard deviation along both axes.
    pub fn isotropic(sigma: f64) -> Self {
        Self::new([sigma, sigma])
    }

    /// Set the maximum kernel width (radius * 2 + 1).
    pub fn with_max_kernel_width(mut self, width: usize) -> Self {
        self.max_kernel_width = width.max(1);
        self
    }

    pub fn sigmas(&self) -> [f64; 2] {
        self.sigmas
    }

    /// Apply the filter to an image.
    pub fn apply<B: Backend>(&self, image: &Image<B>) -> Image<B> {
        let data = self.apply_tensor(image.data().clone(), image.spacing());
        image.with_data(data)
    }

    /// Apply the filter to a `[height, width]` tensor with the given spacing.
    pub fn apply_tensor<B: Backend>(
        &self,
        input: Tensor<B, 2>,
        spacing: &Spacing2,
    ) -> Tensor<B, 2> {
        let mut data = input;
        for axis in 0..2 {
            let sigma = self.sigmas[axis];
            if sigma <= 1e-6 {
                continue;
            }
            let pixel_sigma = sigma / spacing[axis];
            let radius = (3.0 * pixel_sigma).ceil() as usize;
            let width = (2 * radius + 1).min(self.max_kernel_width);
            let actual_radius = (width - 1) / 2;
            if actual_radius == 0 {
                continue;
            }
            let kernel = generate_kernel(pixel_sigma, actual_radius);
            data = match axis {
                0 => convolve_rows(data, &kernel),
                _ => convolve_rows(data.transpose(), &kernel).transpose(),
            };
        }
        data
    }
}

fn generate_kernel(sigma: f64, radius: usize) -> Vec<f32> {
    let two_sigma2 = 2.0 * sigma * sigma;
    let raw: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / two_sigma2).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|v| (v / sum) as f32).collect()
}

/// Convolve every row of a `[rows, len]` tensor with `kernel`.
fn convolve_rows<B: Backend>(input: Tensor<B, 2>, kernel: &[f32]) -> Tensor<B, 2> {
    let [rows, len] = input.dims();
    let device = input.device();
    let k = kernel.len();
    let weights = Tensor::<B, 1>::from_floats(kernel, &device).reshape([1, 1, k]);
    let options = ConvOptions::new([1], [k / 2], [1], 1);

    let smoothed = burn::tensor::module::conv1d(
        input.reshape([rows, 1, len]),
        weights.clone(),
        None,
        options.clone(),
    );
    // Kernel mass inside the signal, per position.
    let mass = burn::tensor::module::conv1d(
        Tensor::<B, 3>::ones([1, 1, len], &device),
        weights,
        None,
        options,
    );

    (smoothed / mass).reshape([rows, len])
}
