//! Tile store over a pyramid held in memory.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::pyramid::{Pyramid, PyramidLayout, TileKey};

use super::{check_bounds, TileStore};

/// Serves tiles straight out of a freshly built [`Pyramid`].
#[derive(Debug, Clone)]
pub struct MemoryTileStore {
    pyramid: Arc<Pyramid>,
}

impl MemoryTileStore {
    pub fn new(pyramid: Arc<Pyramid>) -> Self {
        Self { pyramid }
    }

    /// The pyramid backing this store.
    pub fn pyramid(&self) -> &Arc<Pyramid> {
        &self.pyramid
    }
}

#[async_trait]
impl TileStore for MemoryTileStore {
    fn layout(&self) -> &PyramidLayout {
        self.pyramid.layout()
    }

    async fn get(&self, key: TileKey) -> Result<Bytes, StoreError> {
        check_bounds(self.pyramid.layout(), key)?;
        self.pyramid
            .tile(key)
            .cloned()
            .ok_or(StoreError::TileNotFound {
                level: key.level,
                row: key.row,
                col: key.col,
            })
    }
}
