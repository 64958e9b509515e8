//! Tile store over an unpacked persisted tile set.
//!
//! Opening validates the manifest before anything else, so a renderer can never
//! be created against a tile set whose shape is unknown. Tile files are read
//! lazily, one per request.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::pyramid::{Pyramid, PyramidLayout, TileKey};

use super::manifest::{tile_path, Manifest, MANIFEST_FILE, TILES_DIR};
use super::{check_bounds, TileStore};

/// Serves tiles from a directory holding `manifest.json` and `tiles/`.
#[derive(Debug, Clone)]
pub struct DirectoryTileStore {
    root: PathBuf,
    manifest: Manifest,
    layout: PyramidLayout,
}

impl DirectoryTileStore {
    /// Open a tile set rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidManifest`] if `manifest.json` is missing,
    /// unparseable, lacks required fields, or is inconsistent.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let manifest_path = root.join(MANIFEST_FILE);

        let data = tokio::fs::read(&manifest_path)
            .await
            .map_err(|e| StoreError::InvalidManifest {
                message: format!("cannot read {}: {}", manifest_path.display(), e),
            })?;
        let manifest = Manifest::parse(&data)?;
        let layout = manifest.layout();

        info!(
            root = %root.display(),
            width = manifest.original_dimensions.width,
            height = manifest.original_dimensions.height,
            levels = manifest.num_levels,
            "Opened tile set"
        );

        Ok(Self {
            root,
            manifest,
            layout,
        })
    }

    /// Root directory of the tile set.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parsed manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Absolute path of a tile file.
    pub fn tile_file(&self, key: TileKey) -> PathBuf {
        self.root.join(tile_path(key))
    }
}

#[async_trait]
impl TileStore for DirectoryTileStore {
    fn layout(&self) -> &PyramidLayout {
        &self.layout
    }

    async fn get(&self, key: TileKey) -> Result<Bytes, StoreError> {
        check_bounds(&self.layout, key)?;

        let path = self.tile_file(key);
        debug!(path = %path.display(), "Reading tile");
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::TileNotFound {
                level: key.level,
                row: key.row,
                col: key.col,
            }),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

/// Persist a built pyramid as a tile set under `root`.
///
/// Writes every tile first and the manifest last, so a reader never sees a
/// manifest for a tile set that is still being written.
pub async fn write_tile_set(pyramid: &Pyramid, root: &Path) -> Result<(), StoreError> {
    for level in pyramid.layout().levels() {
        let dir = root.join(TILES_DIR).join(level.index.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(&dir, e))?;
    }

    for (key, bytes) in pyramid.tiles() {
        let path = root.join(tile_path(*key));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| io_error(&path, e))?;
    }

    let manifest_path = root.join(MANIFEST_FILE);
    tokio::fs::write(&manifest_path, pyramid.manifest().to_json()?)
        .await
        .map_err(|e| io_error(&manifest_path, e))?;

    info!(
        root = %root.display(),
        tiles = pyramid.tile_count(),
        "Wrote tile set"
    );
    Ok(())
}

fn io_error(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
