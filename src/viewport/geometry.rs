//! Coordinate helpers shared by the viewport state machine and the renderer.
//!
//! Three coordinate spaces are involved:
//!
//! - **Screen space**: pixels of the viewport frame, origin at its top-left.
//! - **World space**: pixels of the current level's full bitmap. The viewport
//!   shows world space translated by `pan`, so `world = pan + screen`.
//! - **Tile-grid space**: `(row, col)` cells of `TILE_SIZE` world pixels.

use crate::pyramid::Dimensions;

/// Fraction of the available display area the viewport may occupy per axis.
pub const VIEWPORT_FILL: f64 = 0.95;

/// Fraction of the viewport size moved by one discrete pan step.
pub const PAN_STEP: f64 = 0.25;

/// A point or offset in screen or world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Direction of a discrete pan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanDirection {
    Left,
    Right,
    Up,
    Down,
}

impl PanDirection {
    /// `true` for left/right.
    pub fn is_horizontal(&self) -> bool {
        matches!(self, PanDirection::Left | PanDirection::Right)
    }

    /// Pan offset of one step for a viewport of the given size.
    pub fn step(&self, viewport: Dimensions) -> Point {
        let dx = viewport.width as f64 * PAN_STEP;
        let dy = viewport.height as f64 * PAN_STEP;
        match self {
            PanDirection::Left => Point::new(-dx, 0.0),
            PanDirection::Right => Point::new(dx, 0.0),
            PanDirection::Up => Point::new(0.0, -dy),
            PanDirection::Down => Point::new(0.0, dy),
        }
    }
}

/// Clamp one pan axis.
///
/// A world narrower than the view is centered, which yields a negative
/// offset; otherwise the pan stays within `[0, world - view]`.
pub fn clamp_axis(pan: f64, world: u32, view: u32) -> f64 {
    let (world, view) = (world as f64, view as f64);
    if world < view {
        (world - view) / 2.0
    } else {
        pan.clamp(0.0, world - view)
    }
}

/// Clamp a pan offset against a world of size `world` seen through `view`.
pub fn clamp_pan(pan: Point, world: Dimensions, view: Dimensions) -> Point {
    Point::new(
        clamp_axis(pan.x, world.width, view.width),
        clamp_axis(pan.y, world.height, view.height),
    )
}

/// Size of the viewport frame for an image shown in `available` display space.
///
/// The frame takes at most 95% of each axis and keeps the image's aspect ratio,
/// letterboxed to whichever axis is tighter.
pub fn fit_viewport(available: Dimensions, image: Dimensions) -> Dimensions {
    if available.is_empty() || image.is_empty() {
        return Dimensions::default();
    }

    let max_w = (available.width as f64 * VIEWPORT_FILL).floor();
    let max_h = (available.height as f64 * VIEWPORT_FILL).floor();
    let aspect = image.width as f64 / image.height as f64;

    let (w, h) = if max_w / aspect <= max_h {
        (max_w, (max_w / aspect).floor())
    } else {
        ((max_h * aspect).floor(), max_h)
    };

    Dimensions::new(w as u32, h as u32)
}
