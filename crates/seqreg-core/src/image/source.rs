//! Ordered image sources.

use burn::tensor::backend::Backend;

use crate::image::Image;

/// An ordered, indexable collection of frames.
///
/// Implementations may load frames lazily; `get_image` returns `None` when
/// a frame cannot be produced. The cursor lets a host follow which frame a
/// pipeline is currently working on.
pub trait ImageSource<B: Backend> {
    /// Number of frames.
    fn count(&self) -> usize;

    /// Frame at `index`, or `None` if it is out of range or unavailable.
    fn get_image(&self, index: usize) -> Option<Image<B>>;

    /// Index of the current frame.
    fn current_index(&self) -> usize;

    /// Move the cursor to `index`.
    fn set_current_index(&mut self, index: usize);
}

/// In-memory image source.
#[derive(Debug, Clone)]
pub struct ImageSequence<B: Backend> {
    frames: Vec<Image<B>>,
    current: usize,
}

impl<B: Backend> ImageSequence<B> {
    pub fn new(frames: Vec<Image<B>>) -> Self {
        Self { frames, current: 0 }
    }

    pub fn frames(&self) -> &[Image<B>] {
        &self.frames
    }

    pub fn push(&mut self, frame: Image<B>) {
        self.frames.push(frame);
    }
}

impl<B: Backend> FromIterator<Image<B>> for ImageSequence<B> {
    fn from_iter<I: IntoIterator<Item = Image<B>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<B: Backend> ImageSource<B> for ImageSequence<B> {
    fn count(&self) -> usize {
        self.frames.len()
    }

    fn get_image(&self, index: usize) -> Option<Image<B>> {
        self.frames.get(index).cloned()
    }

    fn current_index(&self) -> usize {
        self.current
    }

    fn set_current_index(&mut self, index: usize) {
        self.current = index.min(self.frames.len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Point2, Size2, Spacing2};
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_sequence_access() {
        let device = Default::default();
        let mut sequence: ImageSequence<TestBackend> = (0..3)
            .map(|i| {
                Image::from_vec(
                    vec![i as f32; 4],
                    Size2::new(2, 2),
                    Point2::origin(),
                    Spacing2::new(1.0, 1.0),
                    &device,
                )
            })
            .collect();

        assert_eq!(sequence.count(), 3);
        assert_eq!(sequence.get_image(2).unwrap().to_vec(), vec![2.0; 4]);
        assert!(sequence.get_image(3).is_none());

        sequence.set_current_index(1);
        assert_eq!(sequence.current_index(), 1);
        sequence.set_current_index(10);
        assert_eq!(sequence.current_index(), 2);
    }
}
