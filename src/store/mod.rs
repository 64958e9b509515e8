//! Tile stores.
//!
//! A tile store hands out encoded tile bytes by `(level, row, col)`. The
//! viewport renderer only talks to the [`TileStore`] trait, so it does not care
//! whether tiles come from a pyramid built moments ago or from a tile set that
//! was persisted earlier.
//!
//! ```text
//!                 ┌────────────────────────┐
//!                 │    ViewportRenderer    │
//!                 └───────────┬────────────┘
//!                             │ get(key)
//!                             ▼
//!                 ┌────────────────────────┐
//!                 │    TileStore trait     │
//!                 └───────────┬────────────┘
//!                ┌────────────┴────────────┐
//!                ▼                         ▼
//!     ┌─────────────────────┐   ┌──────────────────────┐
//!     │   MemoryTileStore   │   │  DirectoryTileStore  │
//!     │ (Arc<Pyramid>)      │   │ (manifest + PNGs)    │
//!     └─────────────────────┘   └──────────────────────┘
//! ```

mod directory;
mod manifest;
mod memory;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::pyramid::{PyramidLayout, TileKey};

pub use directory::{write_tile_set, DirectoryTileStore};
pub use manifest::{
    parse_tile_path, tile_path, Manifest, MANIFEST_FILE, TILES_DIR, TILE_EXTENSION,
};
pub use memory::MemoryTileStore;

/// Source of encoded tiles for one pyramid.
///
/// Implementations must be safe to call concurrently: the renderer keeps
/// several fetches in flight and does not order their completions.
#[async_trait]
pub trait TileStore: Send + Sync {
    /// Geometry of the pyramid this store serves.
    fn layout(&self) -> &PyramidLayout;

    /// Fetch the encoded bytes of one tile.
    ///
    /// # Errors
    ///
    /// - [`StoreError::TileOutOfBounds`] if the key is outside the pyramid
    /// - [`StoreError::TileNotFound`] if the key is valid but has no data
    /// - [`StoreError::Io`] if the backing storage fails
    async fn get(&self, key: TileKey) -> Result<Bytes, StoreError>;
}

/// Reject keys that fall outside `layout`.
pub(crate) fn check_bounds(layout: &PyramidLayout, key: TileKey) -> Result<(), StoreError> {
    if layout.contains(key) {
        Ok(())
    } else {
        Err(StoreError::TileOutOfBounds {
            level: key.level,
            row: key.row,
            col: key.col,
        })
    }
}
