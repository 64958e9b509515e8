//! Test utilities for integration tests.
//!
//! This module provides synthetic source images, wrapper stores that count or
//! fail requests, and helpers for building tile set fixtures on disk.

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, Rgba, RgbaImage};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use pyramid_viewer::error::StoreError;
use pyramid_viewer::pyramid::{Pyramid, PyramidBuilder, PyramidLayout, TileKey};
use pyramid_viewer::store::{write_tile_set, DirectoryTileStore, MemoryTileStore, TileStore};

// =============================================================================
// Synthetic Images
// =============================================================================

/// Opaque image whose every pixel encodes its own coordinates.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x / 256 + y / 256) % 256) as u8, 255])
    });
    DynamicImage::ImageRgba8(img)
}

/// Opaque single-color image.
pub fn solid_image(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
}

/// Build a pyramid with default options.
pub fn build_pyramid(source: DynamicImage) -> Arc<Pyramid> {
    Arc::new(PyramidBuilder::new().build(source).unwrap())
}

/// In-memory store over a freshly built pyramid.
pub fn memory_store(source: DynamicImage) -> MemoryTileStore {
    MemoryTileStore::new(build_pyramid(source))
}

/// Build a pyramid, persist it to a temporary directory and open it.
///
/// The returned `TempDir` must be kept alive for as long as the store is used.
pub async fn directory_fixture(source: DynamicImage) -> (TempDir, DirectoryTileStore) {
    let dir = tempfile::tempdir().unwrap();
    let pyramid = build_pyramid(source);
    write_tile_set(&pyramid, dir.path()).await.unwrap();
    let store = DirectoryTileStore::open(dir.path()).await.unwrap();
    (dir, store)
}

// =============================================================================
// Counting Store
// =============================================================================

/// Store wrapper that records every request.
pub struct CountingStore<S> {
    inner: S,
    total: AtomicUsize,
    per_key: Mutex<HashMap<TileKey, usize>>,
}

impl<S: TileStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            total: AtomicUsize::new(0),
            per_key: Mutex::new(HashMap::new()),
        }
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn count(&self, key: TileKey) -> usize {
        self.per_key.lock().unwrap().get(&key).copied().unwrap_or(0)
    }

    pub fn max_per_key(&self) -> usize {
        self.per_key
            .lock()
            .unwrap()
            .values()
            .copied()
            .max()
            .unwrap_or(0)
    }
}

#[async_trait]
impl<S: TileStore> TileStore for CountingStore<S> {
    fn layout(&self) -> &PyramidLayout {
        self.inner.layout()
    }

    async fn get(&self, key: TileKey) -> Result<Bytes, StoreError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.per_key.lock().unwrap().entry(key).or_insert(0) += 1;
        self.inner.get(key).await
    }
}

// =============================================================================
// Failing Store
// =============================================================================

/// Store wrapper that fails requests for selected keys until healed.
pub struct FailingStore<S> {
    inner: S,
    failing: Mutex<HashSet<TileKey>>,
    corrupt: Mutex<HashSet<TileKey>>,
}

impl<S: TileStore> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
            corrupt: Mutex::new(HashSet::new()),
        }
    }

    /// Make requests for `key` fail with an I/O error.
    pub fn fail(&self, key: TileKey) {
        self.failing.lock().unwrap().insert(key);
    }

    /// Make requests for `key` return bytes that are not a PNG.
    pub fn corrupt(&self, key: TileKey) {
        self.corrupt.lock().unwrap().insert(key);
    }

    /// Serve every key normally again.
    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
        self.corrupt.lock().unwrap().clear();
    }
}

#[async_trait]
impl<S: TileStore> TileStore for FailingStore<S> {
    fn layout(&self) -> &PyramidLayout {
        self.inner.layout()
    }

    async fn get(&self, key: TileKey) -> Result<Bytes, StoreError> {
        if self.failing.lock().unwrap().contains(&key) {
            return Err(StoreError::Io {
                path: format!("{}/{}_{}", key.level, key.row, key.col),
                message: "simulated failure".to_string(),
            });
        }
        if self.corrupt.lock().unwrap().contains(&key) {
            return Ok(Bytes::from_static(b"definitely not a png"));
        }
        self.inner.get(key).await
    }
}
