//! Persisted tile set format.
//!
//! A persisted tile set is a manifest plus one PNG per tile:
//!
//! ```text
//! manifest.json
//! tiles/
//!   0/0_0.png
//!   1/0_0.png  1/0_1.png  ...
//!   <level>/<row>_<col>.png
//! ```
//!
//! The manifest is the interop contract with offline builders:
//!
//! ```json
//! {"originalDimensions": {"width": 4000, "height": 3000}, "numLevels": 6}
//! ```
//!
//! Any builder must agree on `numLevels` and on every level's grid size. Pixel
//! values of downsampled levels are not part of the contract.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::pyramid::{level_count, Dimensions, PyramidLayout, TileKey};

/// File name of the manifest at the root of a tile set.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Directory holding the per-level tile folders.
pub const TILES_DIR: &str = "tiles";

/// Extension of every tile file.
pub const TILE_EXTENSION: &str = "png";

/// Manifest record of a persisted tile set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Size of the full-resolution source
    pub original_dimensions: Dimensions,

    /// Number of pyramid levels
    pub num_levels: usize,
}

impl Manifest {
    pub fn new(original_dimensions: Dimensions, num_levels: usize) -> Self {
        Self {
            original_dimensions,
            num_levels,
        }
    }

    /// Parse and validate a manifest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidManifest`] if the JSON is malformed, a
    /// required field is absent, or the record is inconsistent.
    pub fn parse(data: &[u8]) -> Result<Self, StoreError> {
        let manifest: Manifest =
            serde_json::from_slice(data).map_err(|e| StoreError::InvalidManifest {
                message: e.to_string(),
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::InvalidManifest {
            message: e.to_string(),
        })
    }

    /// Check that the record describes a pyramid this crate would build.
    pub fn validate(&self) -> Result<(), StoreError> {
        let dims = self.original_dimensions;
        if dims.is_empty() {
            return Err(StoreError::InvalidManifest {
                message: format!(
                    "originalDimensions must be non-zero, got {}x{}",
                    dims.width, dims.height
                ),
            });
        }

        let expected = level_count(dims.width, dims.height);
        if self.num_levels != expected {
            return Err(StoreError::InvalidManifest {
                message: format!(
                    "numLevels is {} but a {}x{} image has {} levels",
                    self.num_levels, dims.width, dims.height, expected
                ),
            });
        }

        Ok(())
    }

    /// Layout described by this manifest.
    pub fn layout(&self) -> PyramidLayout {
        PyramidLayout::new(self.original_dimensions)
    }
}

/// Relative path of a tile inside a tile set, e.g. `tiles/3/2_5.png`.
pub fn tile_path(key: TileKey) -> String {
    format!(
        "{}/{}/{}_{}.{}",
        TILES_DIR, key.level, key.row, key.col, TILE_EXTENSION
    )
}

/// Parse a tile path like `tiles/3/2_5.png` back into its key.
pub fn parse_tile_path(path: &str) -> Option<TileKey> {
    let rest = path.strip_prefix(TILES_DIR)?.strip_prefix('/')?;
    let (level, file) = rest.split_once('/')?;
    let name = file.strip_suffix(TILE_EXTENSION)?.strip_suffix('.')?;

    let (row, col) = name.split_once('_')?;
    Some(TileKey::new(
        parse_index(level)?,
        parse_index(row)?,
        parse_index(col)?,
    ))
}

/// Plain decimal digits only; `str::parse` would also take a leading `+`.
fn parse_index<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
