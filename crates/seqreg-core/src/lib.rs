//! Core imaging types for microscopy sequence registration.
//!
//! Images are burn tensors laid out `[height, width]` with physical
//! origin and spacing. Transforms, interpolation and the filters used to
//! build resolution pyramids live here; optimisation lives in
//! `seqreg-registration`.

pub mod filter;
pub mod image;
pub mod interpolation;
pub mod spatial;
pub mod transform;

pub use image::{Image, ImageSequence, ImageSource, Region, VectorField};
pub use spatial::{Index2, Point2, Size2, Spacing2, Vector2};
pub use transform::{
    Rigid2DTransform, Transform, Transform2D, TransformGroup, Translation2DTransform,
};
