//! Transform types and operations.
//!
//! Parametric 2D transforms, their composition, and ordered groups of
//! frame-to-frame transforms.

pub mod group;
pub mod parametric;
pub mod rigid;
pub mod trait_;
pub mod translation;

pub use group::TransformGroup;
pub use parametric::Transform2D;
pub use rigid::Rigid2DTransform;
pub use trait_::Transform;
pub use translation::Translation2DTransform;
