use burn::tensor::backend::Backend;
use tracing::debug;

use super::downsample::DownsampleFilter;
use super::gaussian::GaussianFilter;
use crate::image::Image;

/// One level of a multi-resolution pyramid.
#[derive(Debug, Clone)]
pub struct PyramidLevel<B: Backend> {
    pub image: Image<B>,
    /// Integer shrink factor relative to the source image.
    pub shrink_factor: usize,
    /// Smoothing sigma in pixels of the source image.
    pub sigma: f64,
}

/// Multi-resolution image pyramid.
///
/// Every level is produced from the source image, ordered coarsest first.
#[derive(Debug, Clone)]
pub struct MultiResolutionPyramid<B: Backend> {
    levels: Vec<PyramidLevel<B>>,
}

impl<B: Backend> MultiResolutionPyramid<B> {
    /// Smooth-then-shrink pyramid.
    ///
    /// A level with shrink factor `f > 1` is smoothed with a Gaussian of
    /// variance `(f / 2)^2` pixels before keeping every `f`-th pixel.
    /// Full-resolution levels are passed through untouched.
    pub fn from_shrink_factors(input: &Image<B>, shrink_factors: &[usize]) -> Self {
        let levels = shrink_factors
            .iter()
            .map(|&factor| {
                let sigma = if factor > 1 { 0.5 * factor as f64 } else { 0.0 };
                debug!(factor, sigma, "building pyramid level");
                let smoothed = smooth_pixels(input, sigma);
                PyramidLevel {
                    image: DownsampleFilter::new(factor).apply(&smoothed),
                    shrink_factor: factor,
                    sigma,
                }
            })
            .collect();
        Self { levels }
    }

    /// Blur pyramid: every level keeps full resolution and is smoothed
    /// with the given sigma in pixels.
    pub fn from_blur_sigmas(input: &Image<B>, sigmas: &[f64]) -> Self {
        let levels = sigmas
            .iter()
            .map(|&sigma| {
                debug!(sigma, "building blur level");
                PyramidLevel {
                    image: smooth_pixels(input, sigma),
                    shrink_factor: 1,
                    sigma,
                }
            })
            .collect();
        Self { levels }
    }

    /// Get the level at `index`, coarsest first.
    pub fn get_level(&self, index: usize) -> Option<&PyramidLevel<B>> {
        self.levels.get(index)
    }

    /// Number of levels.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[PyramidLevel<B>] {
        &self.levels
    }
}

fn smooth_pixels<B: Backend>(input: &Image<B>, sigma: f64) -> Image<B> {
    if sigma <= 1e-6 {
        return input.clone();
    }
    let spacing = input.spacing();
    GaussianFilter::new([sigma * spacing.x, sigma * spacing.y]).apply(input)
}

/// Shrink factors for a pyramid of up to `levels` levels, coarsest first.
///
/// Starts at `max_shrink` and halves while the factor stays above
/// `min_shrink`; the final level is always `min_shrink`.
///
/// `levels = 4, max_shrink = 8, min_shrink = 1` gives `[8, 4, 2, 1]`.
pub fn shrink_schedule(levels: usize, max_shrink: usize, min_shrink: usize) -> Vec<usize> {
    if levels == 0 {
        return Vec::new();
    }
    let min_shrink = min_shrink.max(1);
    let mut factors = Vec::with_capacity(levels);
    let mut factor = max_shrink.max(min_shrink);
    while factor > min_shrink && factors.len() < levels - 1 {
        factors.push(factor);
        factor /= 2;
    }
    factors.push(min_shrink);
    factors
}

/// Sigmas for a same-resolution blur schedule, strongest first.
///
/// Decreases linearly from `max_sigma` to `min_sigma` over `levels` steps.
pub fn blur_schedule(levels: usize, max_sigma: f64, min_sigma: f64) -> Vec<f64> {
    match levels {
        0 => Vec::new(),
        1 => vec![min_sigma],
        n => {
            let step = (max_sigma - min_sigma) / (n - 1) as f64;
            (0..n).map(|i| max_sigma - step * i as f64).collect()
        }
    }
}
