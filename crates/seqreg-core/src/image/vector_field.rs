//! Dense 2D displacement fields.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};

use crate::image::Image;
use crate::spatial::{Index2, Point2, Size2, Spacing2};

/// A per-pixel 2-component vector image.
///
/// Data is laid out `[height, width, 2]` with components `(x, y)` in
/// physical units. Geometry follows the image the field was computed on.
#[derive(Debug, Clone)]
pub struct VectorField<B: Backend> {
    data: Tensor<B, 3>,
    origin: Point2,
    spacing: Spacing2,
}

impl<B: Backend> VectorField<B> {
    pub fn new(data: Tensor<B, 3>, origin: Point2, spacing: Spacing2) -> Self {
        assert_eq!(data.dims()[2], 2, "vector field must have 2 components");
        Self {
            data,
            origin,
            spacing,
        }
    }

    /// Zero field over the given geometry.
    pub fn zeros(size: Size2, origin: Point2, spacing: Spacing2, device: &B::Device) -> Self {
        let data = Tensor::<B, 3>::zeros([size.height, size.width, 2], device);
        Self::new(data, origin, spacing)
    }

    /// Zero field sharing the geometry of `image`.
    pub fn zeros_like(image: &Image<B>) -> Self {
        Self::zeros(image.size(), *image.origin(), *image.spacing(), &image.device())
    }

    /// Build a field from row-major `(x, y)` vectors.
    ///
    /// # Panics
    /// Panics if `vectors.len()` differs from `size.num_pixels()`.
    pub fn from_vectors(
        vectors: &[[f32; 2]],
        size: Size2,
        origin: Point2,
        spacing: Spacing2,
        device: &B::Device,
    ) -> Self {
        assert_eq!(vectors.len(), size.num_pixels(), "vector count does not match field size");
        let flat: Vec<f32> = vectors.iter().flat_map(|v| v.iter().copied()).collect();
        let data = Tensor::<B, 3>::from_data(
            TensorData::new(flat, Shape::new([size.height, size.width, 2])),
            device,
        );
        Self::new(data, origin, spacing)
    }

    pub fn data(&self) -> &Tensor<B, 3> {
        &self.data
    }

    pub fn origin(&self) -> &Point2 {
        &self.origin
    }

    pub fn spacing(&self) -> &Spacing2 {
        &self.spacing
    }

    pub fn size(&self) -> Size2 {
        let dims = self.data.dims();
        Size2::new(dims[1], dims[0])
    }

    /// Vector stored at `index`, or `None` outside the field.
    pub fn vector_at(&self, index: Index2) -> Option<[f64; 2]> {
        if !self.size().contains(index) {
            return None;
        }
        let (x, y) = (index.x as usize, index.y as usize);
        let values: Vec<f64> = self
            .data
            .clone()
            .slice([y..y + 1, x..x + 1, 0..2])
            .into_data()
            .iter::<f64>()
            .collect();
        Some([values[0], values[1]])
    }

    /// Split into x and y component images.
    pub fn components(&self) -> (Image<B>, Image<B>) {
        let [h, w, _] = self.data.dims();
        let x = self.data.clone().narrow(2, 0, 1).reshape([h, w]);
        let y = self.data.clone().narrow(2, 1, 1).reshape([h, w]);
        (
            Image::new(x, self.origin, self.spacing),
            Image::new(y, self.origin, self.spacing),
        )
    }

    /// Euclidean length of every vector.
    pub fn magnitude(&self) -> Image<B> {
        let [h, w, _] = self.data.dims();
        let norm = self
            .data
            .clone()
            .powf_scalar(2.0)
            .sum_dim(2)
            .sqrt()
            .reshape([h, w]);
        Image::new(norm, self.origin, self.spacing)
    }

    /// Row-major copy of the vectors.
    pub fn to_vec(&self) -> Vec<[f32; 2]> {
        let flat: Vec<f32> = self.data.clone().into_data().iter::<f32>().collect();
        flat.chunks_exact(2).map(|c| [c[0], c[1]]).collect()
    }
}
