//! # Pyramid Viewer
//!
//! Multi-resolution tile pyramids for very large images, and a pan/zoom
//! viewport that renders from those tiles alone.
//!
//! An image too large to show or hold decoded at once is turned into a stack of
//! progressively halved levels, each cut into fixed-size PNG tiles. A viewport
//! then only ever fetches and composites the tiles it can see.
//!
//! ## Features
//!
//! - **Parallel tiling**: each level is sliced row by row across a rayon pool
//! - **Background builds**: progress events, a single terminal result and cancellation
//! - **Pluggable storage**: in-memory pyramids or an on-disk tile directory
//! - **Async rendering**: unordered concurrent fetches drained by a single owner
//!
//! ## Architecture
//!
//! - [`pyramid`] - Level layout, tile codec, builder and background build job
//! - [`store`] - Tile store trait, manifest format, memory and directory stores
//! - [`viewport`] - Zoom/pan state machine, tile cache and renderer
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pyramid_viewer::{Dimensions, DirectoryTileStore, ViewportRenderer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(DirectoryTileStore::open("tiles").await?);
//!     let mut renderer = ViewportRenderer::fit_to_display(store, Dimensions::new(1280, 800));
//!
//!     renderer.render();
//!     renderer.settle().await;
//!     renderer.surface().save("frame.png")?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pyramid;
pub mod store;
pub mod viewport;

// Re-export commonly used types
pub use config::{BuildConfig, Cli, Command, InspectConfig, RenderConfig};
pub use error::{BuildError, StoreError, TileError};
pub use pyramid::{
    load_source, spawn_build, BuildEvent, BuildHandle, BuildOptions, BuildProgress, Dimensions,
    Pyramid, PyramidBuilder, PyramidLayout, TileKey, TILE_SIZE,
};
pub use store::{write_tile_set, DirectoryTileStore, Manifest, MemoryTileStore, TileStore};
pub use viewport::{
    ClickAction, FrameStats, PanDirection, Point, TileCache, Viewport, ViewportRenderer,
    ViewportState,
};
