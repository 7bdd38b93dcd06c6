//! Integer pixel indices and extents.

use serde::{Deserialize, Serialize};

/// A signed pixel index `(x, y)`.
///
/// Signed so that regions centred near the border can be expressed
/// before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Index2 {
    pub x: i64,
    pub y: i64,
}

impl Index2 {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// A pixel extent `(width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size2 {
    pub width: usize,
    pub height: usize,
}

impl Size2 {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether `index` addresses a pixel inside this extent.
    pub fn contains(&self, index: Index2) -> bool {
        index.x >= 0
            && index.y >= 0
            && (index.x as usize) < self.width
            && (index.y as usize) < self.height
    }
}
