//! Pan/zoom viewport over a tile pyramid.
//!
//! This module turns a [`TileStore`](crate::store::TileStore) into composed
//! frames. It never reads source images, only tiles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │       gestures (click, pan, resize)     │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            ViewportRenderer             │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │   Viewport   │  │    TileCache    │  │
//! │  │ (zoom, pan,  │  │ (decoded tiles, │  │
//! │  │  generation) │  │   in-flight)    │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │                TileStore                │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`Viewport`]: zoom/pan state machine with clamping and zoom-about-point
//! - [`VisibleWindow`]: tiles of a level intersecting the frame
//! - [`TileCache`]: unbounded cache of decoded tiles for the current source
//! - [`ViewportRenderer`]: drives fetches and composites the frame
//!
//! # Example
//!
//! ```
//! use pyramid_viewer::pyramid::{Dimensions, PyramidLayout};
//! use pyramid_viewer::viewport::{Point, Viewport};
//!
//! let layout = PyramidLayout::new(Dimensions::new(4000, 3000));
//! let mut viewport = Viewport::with_size(layout, Dimensions::new(600, 400));
//!
//! let state = viewport.state().unwrap();
//! assert_eq!(state.zoom_index, 2);
//! assert_eq!(state.pan, Point::new(-50.0, -12.5));
//!
//! assert!(viewport.zoom_in_at(Point::new(300.0, 200.0)));
//! assert_eq!(viewport.zoom_factor(), 2);
//! ```

mod cache;
mod frame;
mod geometry;
mod renderer;
mod state;

pub use cache::TileCache;
pub use frame::{plan_frame, tile_position, TilePlacement, VisibleWindow};
pub use geometry::{
    clamp_axis, clamp_pan, fit_viewport, PanDirection, Point, PAN_STEP, VIEWPORT_FILL,
};
pub use renderer::{CompletionOutcome, FrameStats, ViewportRenderer};
pub use state::{zoom_pan, ClickAction, Viewport, ViewportState};
