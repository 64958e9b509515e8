//! Decoded tile cache.
//!
//! Holds tiles that have already been fetched and decoded, keyed by
//! `(level, row, col)`, plus the set of keys with a fetch in flight.
//!
//! # No Eviction
//!
//! The cache lives exactly as long as one source image. It is never trimmed
//! while that source is shown and is cleared wholesale when the source changes.
//!
//! # Ownership
//!
//! The cache belongs to the renderer and is only touched from the renderer's
//! task, so it needs no locking. Fetch tasks never write to it directly; their
//! results are handed back through the renderer's completion channel.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use image::RgbaImage;

use crate::pyramid::TileKey;

/// Cache of decoded tiles for one source.
#[derive(Debug, Default)]
pub struct TileCache {
    tiles: HashMap<TileKey, Arc<RgbaImage>>,
    in_flight: HashSet<TileKey>,
}

impl TileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a decoded tile.
    pub fn get(&self, key: &TileKey) -> Option<Arc<RgbaImage>> {
        self.tiles.get(key).cloned()
    }

    /// Check if a tile is cached.
    pub fn contains(&self, key: &TileKey) -> bool {
        self.tiles.contains_key(key)
    }

    /// Store a decoded tile. Replacing an existing entry is harmless: keys
    /// address immutable pyramid tiles.
    pub fn put(&mut self, key: TileKey, tile: Arc<RgbaImage>) {
        self.tiles.insert(key, tile);
    }

    /// Mark a key as being fetched. Returns `false` if it already was.
    pub fn begin_fetch(&mut self, key: TileKey) -> bool {
        self.in_flight.insert(key)
    }

    /// Clear the in-flight mark, whatever the fetch outcome.
    pub fn end_fetch(&mut self, key: &TileKey) {
        self.in_flight.remove(key);
    }

    /// `true` while a fetch for `key` is outstanding.
    pub fn is_in_flight(&self, key: &TileKey) -> bool {
        self.in_flight.contains(key)
    }

    /// Number of outstanding fetches.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of cached tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Drop every cached tile and in-flight mark.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.in_flight.clear();
    }
}
