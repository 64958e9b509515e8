//! Pyramid geometry.
//!
//! Level numbering runs from coarse to fine: level 0 is the most downsampled
//! image and level `num_levels - 1` is the full-resolution source.
//!
//! Level sizes are derived by repeatedly halving the next finer level with
//! integer floor division, starting from the original dimensions, exactly as
//! the builder produces them.

use serde::{Deserialize, Serialize};

/// Edge length of every tile, in pixels.
pub const TILE_SIZE: u32 = 128;

// =============================================================================
// Basic Types
// =============================================================================

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` if either side is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Total pixel count, without overflow.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Both sides halved with floor division.
    pub fn halved(&self) -> Self {
        Self::new(self.width / 2, self.height / 2)
    }

    /// `true` if both sides are no larger than `other`'s.
    pub fn fits_within(&self, other: Dimensions) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

/// Address of one tile: pyramid level plus row/column in that level's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Pyramid level (0 = coarsest)
    pub level: usize,

    /// Tile row (0-indexed from top)
    pub row: u32,

    /// Tile column (0-indexed from left)
    pub col: u32,
}

impl TileKey {
    pub const fn new(level: usize, row: u32, col: u32) -> Self {
        Self { level, row, col }
    }
}

// =============================================================================
// Level Math
// =============================================================================

/// Number of pyramid levels for an image of the given size.
///
/// Equals `ceil(log2(max(width, height) / TILE_SIZE)) + 1`, with a minimum of
/// one level. Integer arithmetic keeps exact powers of two exact: the result is
/// the smallest `k >= 0` with `TILE_SIZE * 2^k >= max(width, height)`, plus one.
pub fn level_count(width: u32, height: u32) -> usize {
    let max_dim = width.max(height) as u64;
    let mut covered = TILE_SIZE as u64;
    let mut halvings = 0usize;
    while covered < max_dim {
        covered *= 2;
        halvings += 1;
    }
    halvings + 1
}

/// Number of tiles along one axis of a level.
pub fn tiles_along(extent: u32) -> u32 {
    extent.div_ceil(TILE_SIZE)
}

// =============================================================================
// Level Layout
// =============================================================================

/// Geometry of a single pyramid level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelLayout {
    /// Index of this level (0 = coarsest)
    pub index: usize,

    /// Width of the level bitmap in pixels
    pub width: u32,

    /// Height of the level bitmap in pixels
    pub height: u32,

    /// Number of tile columns
    pub cols: u32,

    /// Number of tile rows
    pub rows: u32,

    /// Downsample factor relative to the original, `2^(num_levels - 1 - index)`
    pub scale: u64,
}

impl LevelLayout {
    /// World size of this level.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Number of tiles in this level.
    pub fn tile_count(&self) -> u64 {
        self.cols as u64 * self.rows as u64
    }

    /// `true` if `(row, col)` lies inside this level's grid.
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row < self.rows && col < self.cols
    }

    /// Pixel extent of the level bitmap covered by a tile.
    ///
    /// Interior tiles cover `TILE_SIZE x TILE_SIZE`; tiles on the right and
    /// bottom edges cover whatever remains. Returns `None` outside the grid.
    pub fn tile_extent(&self, row: u32, col: u32) -> Option<(u32, u32)> {
        if !self.contains(row, col) {
            return None;
        }
        let w = TILE_SIZE.min(self.width - col * TILE_SIZE);
        let h = TILE_SIZE.min(self.height - row * TILE_SIZE);
        Some((w, h))
    }
}

// =============================================================================
// Pyramid Layout
// =============================================================================

/// Geometry of a whole pyramid: the original size plus every level's grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidLayout {
    original: Dimensions,
    levels: Vec<LevelLayout>,
}

impl PyramidLayout {
    /// Derive the layout for a source of the given size.
    pub fn new(original: Dimensions) -> Self {
        let num_levels = level_count(original.width, original.height);

        // Finest first, so each level is the floor-half of the previous one.
        let mut levels = Vec::with_capacity(num_levels);
        let mut current = original;
        for index in (0..num_levels).rev() {
            levels.push(LevelLayout {
                index,
                width: current.width,
                height: current.height,
                cols: tiles_along(current.width),
                rows: tiles_along(current.height),
                scale: 1u64 << (num_levels - 1 - index),
            });
            current = current.halved();
        }
        levels.reverse();

        Self { original, levels }
    }

    /// Dimensions of the full-resolution source.
    pub fn original(&self) -> Dimensions {
        self.original
    }

    /// Number of levels (always at least 1).
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Index of the full-resolution level.
    pub fn finest_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Geometry of one level, or `None` if out of range.
    pub fn level(&self, index: usize) -> Option<&LevelLayout> {
        self.levels.get(index)
    }

    /// All levels, coarsest first.
    pub fn levels(&self) -> &[LevelLayout] {
        &self.levels
    }

    /// `true` if the key addresses a tile inside this pyramid.
    pub fn contains(&self, key: TileKey) -> bool {
        self.level(key.level)
            .is_some_and(|level| level.contains(key.row, key.col))
    }

    /// Total number of tiles across all levels.
    pub fn total_tiles(&self) -> u64 {
        self.levels.iter().map(LevelLayout::tile_count).sum()
    }
}

// =============================================================================
// Tests
// =============================================================================
