//! Pyramid builder.
//!
//! Turns a decoded source bitmap into a [`Pyramid`]: every level from full
//! resolution down to the coarsest, each cut into fixed-size PNG tiles.
//!
//! ```text
//!   source (RGBA8)                     level n-1  ──tile──▶ tiles (n-1, r, c)
//!        │                                 │
//!        └──────────────────────────▶  resize ½
//!                                          │
//!                                      level n-2  ──tile──▶ tiles (n-2, r, c)
//!                                          │
//!                                         ...
//!                                          │
//!                                      level 0    ──tile──▶ tiles (0, r, c)
//! ```
//!
//! Only two level bitmaps are alive at any time: the one being tiled and the
//! downsampled one replacing it. Tiles of one level are encoded in parallel on
//! the rayon pool.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageError, ImageReader, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::BuildError;
use crate::store::Manifest;

use super::codec::{encode_tile, extract_tile};
use super::layout::{Dimensions, LevelLayout, PyramidLayout, TileKey, TILE_SIZE};

/// Default pixel budget for an in-process build (a 16384 x 16384 bitmap).
pub const DEFAULT_MAX_PIXELS: u64 = 16_384 * 16_384;

/// Default maximum side length for an in-process build.
pub const DEFAULT_MAX_DIMENSION: u32 = 65_535;

// =============================================================================
// Pyramid
// =============================================================================

/// A fully built image pyramid.
///
/// Immutable once constructed. Tiles are PNG-encoded `TILE_SIZE x TILE_SIZE`
/// images keyed by `(level, row, col)`.
#[derive(Debug, Clone)]
pub struct Pyramid {
    layout: PyramidLayout,
    tiles: HashMap<TileKey, Bytes>,
}

impl Pyramid {
    /// Geometry of this pyramid.
    pub fn layout(&self) -> &PyramidLayout {
        &self.layout
    }

    /// Number of levels.
    pub fn num_levels(&self) -> usize {
        self.layout.num_levels()
    }

    /// Size of the full-resolution source.
    pub fn original_dimensions(&self) -> Dimensions {
        self.layout.original()
    }

    /// Manifest record describing this pyramid for persistence.
    pub fn manifest(&self) -> Manifest {
        Manifest::new(self.layout.original(), self.layout.num_levels())
    }

    /// Encoded bytes of one tile.
    pub fn tile(&self, key: TileKey) -> Option<&Bytes> {
        self.tiles.get(&key)
    }

    /// Number of encoded tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// All tiles, in no particular order.
    pub fn tiles(&self) -> impl Iterator<Item = (&TileKey, &Bytes)> {
        self.tiles.iter()
    }
}

// =============================================================================
// Options & Progress
// =============================================================================

/// Settings for a pyramid build.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    /// Resampling filter used for each halving step
    pub filter: FilterType,

    /// Largest source area (in pixels) the builder will accept
    pub max_pixels: u64,

    /// Largest source side (in pixels) the builder will accept
    pub max_dimension: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
            max_pixels: DEFAULT_MAX_PIXELS,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

impl BuildOptions {
    /// Reject sources that are empty or exceed the configured limits.
    pub fn check_source(&self, dims: Dimensions) -> Result<(), BuildError> {
        if dims.is_empty() {
            return Err(BuildError::EmptySource);
        }

        if dims.width > self.max_dimension || dims.height > self.max_dimension {
            return Err(BuildError::ResourceExhausted {
                width: dims.width,
                height: dims.height,
                reason: format!("a side exceeds the {} pixel limit", self.max_dimension),
            });
        }

        if dims.area() > self.max_pixels {
            return Err(BuildError::ResourceExhausted {
                width: dims.width,
                height: dims.height,
                reason: format!(
                    "{} pixels exceeds the {} pixel budget",
                    dims.area(),
                    self.max_pixels
                ),
            });
        }

        Ok(())
    }
}

/// Progress report emitted after each level has been tiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProgress {
    /// Level that was just completed
    pub level: usize,

    /// Total number of levels in the pyramid
    pub total_levels: usize,
}

impl BuildProgress {
    /// Number of levels finished so far (levels are built finest first).
    pub fn completed_levels(&self) -> usize {
        self.total_levels - self.level
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds pyramids from source bitmaps.
///
/// The builder is stateless between builds; it only carries its options and
/// an optional cancellation flag shared with whoever started the build.
#[derive(Debug, Clone, Default)]
pub struct PyramidBuilder {
    options: BuildOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl PyramidBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with the given options.
    pub fn with_options(options: BuildOptions) -> Self {
        Self {
            options,
            cancel: None,
        }
    }

    /// Abort the build with [`BuildError::Cancelled`] once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Options this builder runs with.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Build a pyramid without progress reporting.
    pub fn build(&self, source: DynamicImage) -> Result<Pyramid, BuildError> {
        self.build_with_progress(source, |_| {})
    }

    /// Build a pyramid, calling `on_progress` after each level is tiled.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The source is empty or exceeds the configured limits
    /// - A tile fails to encode
    /// - The cancel flag is raised during the build
    ///
    /// No partial pyramid is ever returned.
    pub fn build_with_progress<F>(
        &self,
        source: DynamicImage,
        mut on_progress: F,
    ) -> Result<Pyramid, BuildError>
    where
        F: FnMut(BuildProgress),
    {
        let original = Dimensions::new(source.width(), source.height());
        self.options.check_source(original)?;

        let layout = PyramidLayout::new(original);
        let total_levels = layout.num_levels();
        info!(
            width = original.width,
            height = original.height,
            levels = total_levels,
            tiles = layout.total_tiles(),
            "Building pyramid"
        );

        // Edge tiles need transparent padding, so work in RGBA from here on.
        let mut current = source.into_rgba8();
        let mut tiles = HashMap::with_capacity(layout.total_tiles() as usize);

        for level in layout.levels().iter().rev() {
            self.check_cancelled()?;

            let level_tiles = self.tile_level(&current, level)?;
            debug!(
                level = level.index,
                width = level.width,
                height = level.height,
                tiles = level_tiles.len(),
                "Tiled level"
            );
            tiles.extend(level_tiles);

            on_progress(BuildProgress {
                level: level.index,
                total_levels,
            });

            if level.index > 0 {
                current = downsample(&current, self.options.filter);
            }
        }

        info!(tiles = tiles.len(), "Pyramid complete");
        Ok(Pyramid { layout, tiles })
    }

    /// Cut one level bitmap into encoded tiles.
    fn tile_level(
        &self,
        bitmap: &RgbaImage,
        level: &LevelLayout,
    ) -> Result<Vec<(TileKey, Bytes)>, BuildError> {
        let per_row: Vec<Vec<(TileKey, Bytes)>> = (0..level.rows)
            .into_par_iter()
            .map(|row| {
                self.check_cancelled()?;
                (0..level.cols)
                    .map(|col| {
                        let (w, h) = (
                            TILE_SIZE.min(level.width - col * TILE_SIZE),
                            TILE_SIZE.min(level.height - row * TILE_SIZE),
                        );
                        let tile = extract_tile(bitmap, col * TILE_SIZE, row * TILE_SIZE, w, h);
                        let bytes = encode_tile(&tile)?;
                        Ok((TileKey::new(level.index, row, col), bytes))
                    })
                    .collect::<Result<Vec<_>, BuildError>>()
            })
            .collect::<Result<_, _>>()?;

        Ok(per_row.into_iter().flatten().collect())
    }

    fn check_cancelled(&self) -> Result<(), BuildError> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(BuildError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Halve a bitmap to `floor(w/2) x floor(h/2)`.
///
/// Once an axis reaches zero there is nothing left to resample; the result is
/// an empty bitmap of the target size.
pub fn downsample(bitmap: &RgbaImage, filter: FilterType) -> RgbaImage {
    let (width, height) = (bitmap.width() / 2, bitmap.height() / 2);
    if width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }
    imageops::resize(bitmap, width, height, filter)
}

// =============================================================================
// Source Loading
// =============================================================================

/// Decode a source image file, enforcing the builder's limits.
///
/// The decoder's own allocation limits are lifted so that our explicit budget
/// decides what is too large; decoder limit errors still map to
/// [`BuildError::ResourceExhausted`].
pub fn load_source(path: &Path, options: &BuildOptions) -> Result<DynamicImage, BuildError> {
    let decode_error = |e: std::io::Error| BuildError::Decode {
        message: format!("{}: {}", path.display(), e),
    };

    let (width, height) = ImageReader::open(path)
        .map_err(decode_error)?
        .with_guessed_format()
        .map_err(decode_error)?
        .into_dimensions()
        .map_err(|e| map_image_error(e, 0, 0))?;
    options.check_source(Dimensions::new(width, height))?;

    let mut reader = ImageReader::open(path)
        .map_err(decode_error)?
        .with_guessed_format()
        .map_err(decode_error)?;
    reader.no_limits();

    reader.decode().map_err(|e| map_image_error(e, width, height))
}

fn map_image_error(err: ImageError, width: u32, height: u32) -> BuildError {
    match err {
        ImageError::Limits(limits) => BuildError::ResourceExhausted {
            width,
            height,
            reason: limits.to_string(),
        },
        other => BuildError::Decode {
            message: other.to_string(),
        },
    }
}

// =============================================================================
// Tests
// =============================================================================
