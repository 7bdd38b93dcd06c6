//! Spatial types for representing points, vectors, spacing and pixel indices.
//!
//! Physical quantities are nalgebra `f64` types. Pixel indices and extents
//! are small integer structs ordered `(x, y)`.

pub mod index;

pub use index::{Index2, Size2};

/// A position in physical space.
pub type Point2 = nalgebra::Point2<f64>;
/// A displacement in physical space.
pub type Vector2 = nalgebra::Vector2<f64>;
/// Physical distance between adjacent pixels along x and y.
pub type Spacing2 = nalgebra::Vector2<f64>;
