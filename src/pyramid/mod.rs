//! Pyramid construction.
//!
//! This module derives the level stack and tile slices for a source image.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        spawn_build / BuildHandle        │
//! │   (blocking pool, progress + cancel)    │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             PyramidBuilder              │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ PyramidLayout│  │   PNG codec     │  │
//! │  │ (level/grid  │  │ (crop → pad →   │  │
//! │  │  geometry)   │  │  encode)        │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//!               Pyramid (immutable)
//! ```
//!
//! # Components
//!
//! - [`PyramidLayout`]: level count, per-level sizes and tile grids
//! - [`PyramidBuilder`]: synchronous builder with progress and cancellation
//! - [`spawn_build`]: runs the builder in the background and streams [`BuildEvent`]s
//! - [`Pyramid`]: the finished level stack with PNG tiles keyed by [`TileKey`]
//!
//! # Example
//!
//! ```
//! use image::{DynamicImage, RgbaImage};
//! use pyramid_viewer::pyramid::{PyramidBuilder, TileKey, TILE_SIZE};
//!
//! let source = DynamicImage::ImageRgba8(RgbaImage::new(1024, 1024));
//! let pyramid = PyramidBuilder::new().build(source).unwrap();
//!
//! assert_eq!(pyramid.num_levels(), 4);
//! assert!(pyramid.tile(TileKey::new(3, 7, 7)).is_some());
//! assert_eq!(pyramid.layout().level(0).unwrap().width, TILE_SIZE);
//! ```

mod builder;
mod codec;
mod layout;
mod task;

pub use builder::{
    downsample, load_source, BuildOptions, BuildProgress, Pyramid, PyramidBuilder,
    DEFAULT_MAX_DIMENSION, DEFAULT_MAX_PIXELS,
};
pub use codec::{decode_tile, encode_tile, extract_tile, tile_dimensions};
pub use layout::{
    level_count, tiles_along, Dimensions, LevelLayout, PyramidLayout, TileKey, TILE_SIZE,
};
pub use task::{spawn_build, BuildEvent, BuildHandle};
