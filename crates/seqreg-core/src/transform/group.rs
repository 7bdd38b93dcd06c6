//! Ordered frame-to-frame transforms.

use serde::{Deserialize, Serialize};

use super::parametric::Transform2D;

/// Transforms between consecutive frames of a sequence.
///
/// Entry `i` maps points of frame `i` into frame `i + 1`, so resampling
/// frame `i + 1` through it aligns that frame onto frame `i`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformGroup {
    transforms: Vec<Transform2D>,
}

impl TransformGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transforms(transforms: Vec<Transform2D>) -> Self {
        Self { transforms }
    }

    pub fn push(&mut self, transform: Transform2D) {
        self.transforms.push(transform);
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Transform2D> {
        self.transforms.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transform2D> {
        self.transforms.iter()
    }

    pub fn as_slice(&self) -> &[Transform2D] {
        &self.transforms
    }

    pub fn into_vec(self) -> Vec<Transform2D> {
        self.transforms
    }

    /// Transforms from frame 0 into every frame.
    ///
    /// Returns `len() + 1` entries; entry `k` maps frame-0 points into
    /// frame `k` and entry 0 is the identity.
    pub fn accumulated(&self) -> Vec<Transform2D> {
        let mut out = Vec::with_capacity(self.transforms.len() + 1);
        let mut current = Transform2D::identity();
        out.push(current);
        for transform in &self.transforms {
            current = Transform2D::compose(transform, &current, true);
            out.push(current);
        }
        out
    }
}

impl FromIterator<Transform2D> for TransformGroup {
    fn from_iter<I: IntoIterator<Item = Transform2D>>(iter: I) -> Self {
        Self::from_transforms(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TransformGroup {
    type Item = &'a Transform2D;
    type IntoIter = std::slice::Iter<'a, Transform2D>;

    fn into_iter(self) -> Self::IntoIter {
        self.transforms.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Point2, Vector2};
    use crate::transform::Rigid2DTransform;

    #[test]
    fn test_accumulated_chains_frames() {
        let t0 = Transform2D::Rigid2D(Rigid2DTransform::new(
            0.2,
            Point2::new(5.0, 5.0),
            Vector2::new(1.0, 0.0),
        ));
        let t1 = Transform2D::Rigid2D(Rigid2DTransform::new(
            -0.05,
            Point2::new(5.0, 5.0),
            Vector2::new(0.0, 2.0),
        ));
        let group: TransformGroup = vec![t0, t1].into_iter().collect();
        let acc = group.accumulated();
        assert_eq!(acc.len(), 3);
        assert!(acc[0].is_identity());
        assert_eq!(acc[1], t0);

        let p = Point2::new(3.0, 8.0);
        let expected = t1.transform_point(&t0.transform_point(&p));
        assert!((acc[2].transform_point(&p) - expected).norm() < 1e-10);
    }

    #[test]
    fn test_empty_group() {
        let group = TransformGroup::new();
        assert!(group.is_empty());
        assert_eq!(group.accumulated().len(), 1);
    }
}
