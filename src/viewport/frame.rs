//! Visible tile window.
//!
//! Given a level and a pan offset, work out which tiles intersect the frame and
//! where each one lands on screen. All tiles of a frame share the same
//! fractional part of the pan, so flooring every screen position moves them by
//! the same amount and adjacent tiles never open a seam.

use std::ops::Range;

use crate::pyramid::{LevelLayout, TileKey, TILE_SIZE};

use super::state::ViewportState;

/// Where one tile is drawn in the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    /// Tile to draw
    pub key: TileKey,

    /// Screen x of the tile's top-left corner
    pub x: i64,

    /// Screen y of the tile's top-left corner
    pub y: i64,
}

/// Rows and columns of one level that intersect the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleWindow {
    pub level: usize,
    pub rows: Range<u32>,
    pub cols: Range<u32>,
}

impl VisibleWindow {
    /// Compute the window for `state` over `level`.
    ///
    /// Rows are `[floor(pan.y / T), ceil((pan.y + height) / T))` intersected
    /// with the level's grid, and columns likewise. A negative (centering) pan
    /// simply starts the window at row/column 0.
    pub fn new(level: &LevelLayout, state: &ViewportState) -> Self {
        Self {
            level: level.index,
            rows: axis_range(state.pan.y, state.viewport.height, level.rows),
            cols: axis_range(state.pan.x, state.viewport.width, level.cols),
        }
    }

    /// Number of tiles in the window.
    pub fn len(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    /// `true` if no tile is visible.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.cols.is_empty()
    }

    /// Keys in the window, row by row.
    pub fn keys(&self) -> impl Iterator<Item = TileKey> + '_ {
        self.rows.clone().flat_map(move |row| {
            self.cols
                .clone()
                .map(move |col| TileKey::new(self.level, row, col))
        })
    }
}

fn axis_range(pan: f64, view: u32, tiles: u32) -> Range<u32> {
    let tile = TILE_SIZE as f64;
    let first = (pan / tile).floor().max(0.0);
    let end = ((pan + view as f64) / tile).ceil().max(0.0);

    let first = (first as u32).min(tiles);
    let end = (end as u32).min(tiles);
    first..end.max(first)
}

/// Screen position of a tile's top-left corner for a given pan.
pub fn tile_position(key: TileKey, state: &ViewportState) -> (i64, i64) {
    let x = (key.col as f64 * TILE_SIZE as f64 - state.pan.x).floor() as i64;
    let y = (key.row as f64 * TILE_SIZE as f64 - state.pan.y).floor() as i64;
    (x, y)
}

/// Every visible tile of the frame with its screen position.
pub fn plan_frame(level: &LevelLayout, state: &ViewportState) -> Vec<TilePlacement> {
    VisibleWindow::new(level, state)
        .keys()
        .map(|key| {
            let (x, y) = tile_position(key, state);
            TilePlacement { key, x, y }
        })
        .collect()
}
