//! Image type with physical metadata and coordinate transformations.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};

use crate::image::Region;
use crate::spatial::{Index2, Point2, Size2, Spacing2};

/// 2D grayscale image with physical metadata.
///
/// The pixel tensor is laid out `[height, width]`; indices and physical
/// coordinates are ordered `(x, y)`.
///
/// # Coordinate Systems
/// * **Index Space**: continuous pixel coordinates, `(0, 0)` is the first pixel centre
/// * **Physical Space**: `point = origin + index * spacing`
///
/// # Examples
/// ```rust
/// use seqreg_core::Image;
/// use seqreg_core::spatial::{Point2, Spacing2};
/// use burn::tensor::Tensor;
/// use burn_ndarray::NdArray;
///
/// type Backend = NdArray<f32>;
///
/// let device = Default::default();
/// let data = Tensor::<Backend, 2>::zeros([48, 64], &device);
/// let image = Image::new(data, Point2::origin(), Spacing2::new(0.5, 0.5));
/// assert_eq!(image.size().width, 64);
/// ```
#[derive(Debug, Clone)]
pub struct Image<B: Backend> {
    /// Pixel data, `[height, width]`.
    data: Tensor<B, 2>,
    /// Physical coordinate of pixel `(0, 0)`.
    origin: Point2,
    /// Physical distance between pixels along x and y.
    spacing: Spacing2,
}

impl<B: Backend> Image<B> {
    /// Create a new image with the given data and metadata.
    ///
    /// # Arguments
    /// * `data` - Pixel tensor of shape `[height, width]`
    /// * `origin` - Physical coordinate of the first pixel
    /// * `spacing` - Physical distance between pixels along x and y
    pub fn new(data: Tensor<B, 2>, origin: Point2, spacing: Spacing2) -> Self {
        Self {
            data,
            origin,
            spacing,
        }
    }

    /// Create an image from row-major pixel values.
    ///
    /// # Panics
    /// Panics if `values.len()` differs from `size.num_pixels()`.
    pub fn from_vec(
        values: Vec<f32>,
        size: Size2,
        origin: Point2,
        spacing: Spacing2,
        device: &B::Device,
    ) -> Self {
        assert_eq!(
            values.len(),
            size.num_pixels(),
            "pixel buffer length {} does not match {}x{}",
            values.len(),
            size.width,
            size.height
        );
        let data = Tensor::<B, 2>::from_data(
            TensorData::new(values, Shape::new([size.height, size.width])),
            device,
        );
        Self::new(data, origin, spacing)
    }

    /// Get the image data tensor.
    pub fn data(&self) -> &Tensor<B, 2> {
        &self.data
    }

    /// Consume the image, returning its pixel tensor.
    pub fn into_data(self) -> Tensor<B, 2> {
        self.data
    }

    /// Get the origin (physical coordinate of the first pixel).
    pub fn origin(&self) -> &Point2 {
        &self.origin
    }

    /// Get the spacing (physical distance between pixels).
    pub fn spacing(&self) -> &Spacing2 {
        &self.spacing
    }

    /// Tensor shape `[height, width]`.
    pub fn shape(&self) -> [usize; 2] {
        let dims = self.data.dims();
        [dims[0], dims[1]]
    }

    /// Pixel extent `(width, height)`.
    pub fn size(&self) -> Size2 {
        let [height, width] = self.shape();
        Size2::new(width, height)
    }

    pub fn device(&self) -> B::Device {
        self.data.device()
    }

    /// Largest region that fits inside the image.
    pub fn largest_region(&self) -> Region {
        Region::new(Index2::new(0, 0), self.size())
    }

    /// Convert a continuous physical point to a continuous index.
    ///
    /// `index = (point - origin) / spacing`
    pub fn transform_physical_point_to_continuous_index(&self, point: &Point2) -> Point2 {
        let diff = point - self.origin;
        Point2::new(diff.x / self.spacing.x, diff.y / self.spacing.y)
    }

    /// Convert a continuous index to a physical point.
    ///
    /// `point = origin + index * spacing`
    pub fn transform_continuous_index_to_physical_point(&self, index: &Point2) -> Point2 {
        Point2::new(
            self.origin.x + index.x * self.spacing.x,
            self.origin.y + index.y * self.spacing.y,
        )
    }

    /// Physical position of the centre of the pixel grid.
    pub fn physical_center(&self) -> Point2 {
        let size = self.size();
        let index = Point2::new(
            (size.width as f64 - 1.0) / 2.0,
            (size.height as f64 - 1.0) / 2.0,
        );
        self.transform_continuous_index_to_physical_point(&index)
    }

    /// Batch transform physical points to continuous indices.
    ///
    /// # Arguments
    /// * `points` - A tensor of shape `[N, 2]` containing physical `(x, y)` points
    ///
    /// # Returns
    /// A tensor of shape `[N, 2]` containing continuous indices
    pub fn world_to_index_tensor(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let (origin, spacing) = self.geometry_tensors(&points.device());
        (points - origin) / spacing
    }

    /// Batch transform continuous indices to physical points.
    ///
    /// # Arguments
    /// * `indices` - A tensor of shape `[N, 2]` containing `(x, y)` indices
    ///
    /// # Returns
    /// A tensor of shape `[N, 2]` containing physical points
    pub fn index_to_world_tensor(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let (origin, spacing) = self.geometry_tensors(&indices.device());
        indices * spacing + origin
    }

    fn geometry_tensors(&self, device: &B::Device) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let origin = Tensor::<B, 1>::from_floats(
            [self.origin.x as f32, self.origin.y as f32],
            device,
        )
        .reshape([1, 2]);
        let spacing = Tensor::<B, 1>::from_floats(
            [self.spacing.x as f32, self.spacing.y as f32],
            device,
        )
        .reshape([1, 2]);
        (origin, spacing)
    }

    /// Copy out the pixels covered by `region`.
    ///
    /// The region is clamped to the image first. The returned image keeps
    /// the physical position of every pixel, so its origin moves to the
    /// region start. Returns `None` when nothing of the region overlaps.
    pub fn extract_region(&self, region: &Region) -> Option<Image<B>> {
        let region = region.clamp_to(self.size());
        if region.is_empty() {
            return None;
        }
        let (x0, y0) = (region.index.x as usize, region.index.y as usize);
        let data = self.data.clone().slice([
            y0..y0 + region.size.height,
            x0..x0 + region.size.width,
        ]);
        let origin =
            self.transform_continuous_index_to_physical_point(&Point2::new(x0 as f64, y0 as f64));
        Some(Image::new(data, origin, self.spacing))
    }

    /// Row-major copy of the pixel values.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.clone().into_data().iter::<f32>().collect()
    }

    /// Pixel value at an integer index, or `None` outside the image.
    pub fn value_at(&self, index: Index2) -> Option<f32> {
        if !self.size().contains(index) {
            return None;
        }
        let (x, y) = (index.x as usize, index.y as usize);
        self.data
            .clone()
            .slice([y..y + 1, x..x + 1])
            .into_data()
            .iter::<f32>()
            .next()
    }

    /// Replace the pixel data, keeping the geometry.
    ///
    /// # Panics
    /// Panics if `data` has a different shape.
    pub fn with_data(&self, data: Tensor<B, 2>) -> Image<B> {
        assert_eq!(data.dims(), self.shape(), "replacement data shape mismatch");
        Image::new(data, self.origin, self.spacing)
    }
}
