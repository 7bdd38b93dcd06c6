//! Image types and operations.
//!
//! Images carry a 2D tensor plus physical origin and spacing. Regions select
//! rectangular sub-areas, image sources feed ordered frames to the
//! pipelines and vector fields hold dense displacement results.

pub mod grid;
#[allow(clippy::module_inception)]
pub mod image;
pub mod region;
pub mod source;
pub mod vector_field;

pub use grid::{generate_grid, generate_region_grid};
pub use image::Image;
pub use region::Region;
pub use source::{ImageSequence, ImageSource};
pub use vector_field::VectorField;
