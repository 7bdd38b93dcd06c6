//! Rectangular pixel regions.

use serde::{Deserialize, Serialize};

use crate::spatial::{Index2, Size2};

/// An axis-aligned pixel rectangle given by its start index and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub index: Index2,
    pub size: Size2,
}

impl Region {
    pub const fn new(index: Index2, size: Size2) -> Self {
        Self { index, size }
    }

    /// Square region of side `2 * radius + 1` centred on `center`.
    ///
    /// The result is not clamped and may extend past any image.
    pub fn centered(center: Index2, radius: usize) -> Self {
        let r = radius as i64;
        let side = 2 * radius + 1;
        Self::new(Index2::new(center.x - r, center.y - r), Size2::new(side, side))
    }

    /// Intersect with an image of the given extent.
    ///
    /// The start moves up to zero and the far edge down to the last pixel.
    /// A region lying past the far edge keeps its start and ends up with
    /// zero size rather than being shifted back inside.
    pub fn clamp_to(&self, extent: Size2) -> Region {
        let (x, width) = clamp_axis(self.index.x, self.size.width, extent.width);
        let (y, height) = clamp_axis(self.index.y, self.size.height, extent.height);
        Region::new(Index2::new(x, y), Size2::new(width, height))
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    pub fn num_pixels(&self) -> usize {
        self.size.num_pixels()
    }

    /// Whether `index` lies inside the region.
    pub fn contains(&self, index: Index2) -> bool {
        let local = Index2::new(index.x - self.index.x, index.y - self.index.y);
        self.size.contains(local)
    }
}

fn clamp_axis(start: i64, len: usize, extent: usize) -> (i64, usize) {
    let end = start + len as i64 - 1;
    let clamped_start = start.max(0);
    let clamped_end = end.min(extent as i64 - 1);
    let clamped_len = (clamped_end - clamped_start + 1).max(0) as usize;
    (clamped_start, clamped_len)
}
