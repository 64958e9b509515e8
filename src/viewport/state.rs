//! Viewport state machine.
//!
//! ```text
//!                 resize(nonzero)
//!  Uninitialized ────────────────▶ Ready ──┐ zoom_to / pan_by / click
//!        ▲                           │  ◀──┘
//!        └───────────────────────────┘
//!          resize / zoom_out_fully
//!          (re-initializes at once when the frame is nonzero)
//! ```
//!
//! Every committed change bumps a generation counter. The renderer stamps tile
//! fetches with it, so a completion that arrives after the view has moved on
//! can be recognized and left undrawn.

use crate::pyramid::{Dimensions, PyramidLayout};

use super::geometry::{clamp_pan, PanDirection, Point};

/// Snapshot of a ready viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    /// Current level
    pub zoom_index: usize,

    /// Most zoomed-out level that still fits the frame
    pub min_zoom_index: usize,

    /// Top-left of the frame in current-level world pixels
    pub pan: Point,

    /// Size of the frame in screen pixels
    pub viewport: Dimensions,

    /// Bumped on every committed mutation
    pub generation: u64,
}

/// What a click does at the current zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    ZoomIn,
    ZoomOut,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Uninitialized,
    Ready(ViewportState),
}

/// Pan/zoom state over one pyramid.
#[derive(Debug, Clone)]
pub struct Viewport {
    layout: PyramidLayout,
    viewport: Dimensions,
    phase: Phase,
    generation: u64,
}

impl Viewport {
    /// Create an uninitialized viewport; call [`resize`](Self::resize) to make it ready.
    pub fn new(layout: PyramidLayout) -> Self {
        Self {
            layout,
            viewport: Dimensions::default(),
            phase: Phase::Uninitialized,
            generation: 0,
        }
    }

    /// Create a viewport and initialize it for a frame of the given size.
    pub fn with_size(layout: PyramidLayout, viewport: Dimensions) -> Self {
        let mut vp = Self::new(layout);
        vp.resize(viewport);
        vp
    }

    /// Pyramid geometry.
    pub fn layout(&self) -> &PyramidLayout {
        &self.layout
    }

    /// Current frame size.
    pub fn size(&self) -> Dimensions {
        self.viewport
    }

    /// State snapshot, or `None` while uninitialized.
    pub fn state(&self) -> Option<ViewportState> {
        match self.phase {
            Phase::Ready(state) => Some(state),
            Phase::Uninitialized => None,
        }
    }

    /// `true` once the viewport has a nonzero frame.
    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready(_))
    }

    /// Generation counter of the last committed change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// World size of a level.
    pub fn world_size(&self, level: usize) -> Dimensions {
        self.layout
            .level(level)
            .map(|l| l.dimensions())
            .unwrap_or_default()
    }

    /// Downsample factor of a level, `2^(num_levels - 1 - level)`.
    pub fn scale(&self, level: usize) -> f64 {
        let shift = self.layout.finest_level().saturating_sub(level);
        (1u64 << shift) as f64
    }

    /// Most zoomed-out level whose world fits inside `viewport` on both axes.
    ///
    /// Falls back to level 0 when even the coarsest level does not fit.
    pub fn base_index(&self, viewport: Dimensions) -> usize {
        self.layout
            .levels()
            .iter()
            .take_while(|level| level.dimensions().fits_within(viewport))
            .last()
            .map(|level| level.index)
            .unwrap_or(0)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Set a new frame size. Always re-initializes zoom and pan.
    pub fn resize(&mut self, viewport: Dimensions) {
        self.viewport = viewport;
        self.phase = Phase::Uninitialized;
        self.initialize();
    }

    /// Return to the most zoomed-out view for the current frame.
    pub fn zoom_out_fully(&mut self) {
        self.phase = Phase::Uninitialized;
        self.initialize();
    }

    fn initialize(&mut self) {
        if self.viewport.is_empty() {
            self.bump();
            return;
        }

        let base = self.base_index(self.viewport);
        let pan = clamp_pan(Point::default(), self.world_size(base), self.viewport);
        self.commit(ViewportState {
            zoom_index: base,
            min_zoom_index: base,
            pan,
            viewport: self.viewport,
            generation: 0,
        });
    }

    /// Zoom to `target` keeping the world pixel under `screen` in place.
    ///
    /// The target is clamped to `[min_zoom_index, num_levels - 1]`. Returns
    /// `false` without touching state if that equals the current level or the
    /// viewport is not ready.
    pub fn zoom_to(&mut self, target: usize, screen: Point) -> bool {
        let Some(state) = self.state() else {
            return false;
        };

        let target = target.clamp(state.min_zoom_index, self.layout.finest_level());
        if target == state.zoom_index {
            return false;
        }

        let pan = zoom_pan(
            state.pan,
            screen,
            self.scale(state.zoom_index),
            self.scale(target),
        );
        let pan = clamp_pan(pan, self.world_size(target), state.viewport);

        self.commit(ViewportState {
            zoom_index: target,
            pan,
            ..state
        });
        true
    }

    /// Zoom in one level about `screen`.
    pub fn zoom_in_at(&mut self, screen: Point) -> bool {
        match self.state() {
            Some(state) => self.zoom_to(state.zoom_index + 1, screen),
            None => false,
        }
    }

    /// Zoom out one level about `screen`.
    pub fn zoom_out_at(&mut self, screen: Point) -> bool {
        match self.state() {
            Some(state) if state.zoom_index > state.min_zoom_index => {
                self.zoom_to(state.zoom_index - 1, screen)
            }
            _ => false,
        }
    }

    /// `true` if panning in `direction` is possible at all on this level.
    ///
    /// Panning is disabled on an axis where the world is no larger than the frame.
    pub fn can_pan(&self, direction: PanDirection) -> bool {
        let Some(state) = self.state() else {
            return false;
        };
        let world = self.world_size(state.zoom_index);
        if direction.is_horizontal() {
            world.width > state.viewport.width
        } else {
            world.height > state.viewport.height
        }
    }

    /// Move a quarter of the frame in `direction`. Returns `true` if the pan changed.
    pub fn pan_by(&mut self, direction: PanDirection) -> bool {
        if !self.can_pan(direction) {
            return false;
        }
        let Some(state) = self.state() else {
            return false;
        };

        let step = direction.step(state.viewport);
        let pan = clamp_pan(
            Point::new(state.pan.x + step.x, state.pan.y + step.y),
            self.world_size(state.zoom_index),
            state.viewport,
        );
        if pan == state.pan {
            return false;
        }

        self.commit(ViewportState { pan, ..state });
        true
    }

    /// Action a click would perform, for cursor feedback.
    ///
    /// `modifier` selects zoom-out (e.g. shift held).
    pub fn click_affordance(&self, modifier: bool) -> Option<ClickAction> {
        let state = self.state()?;
        if modifier {
            (state.zoom_index > state.min_zoom_index).then_some(ClickAction::ZoomOut)
        } else {
            (state.zoom_index < self.layout.finest_level()).then_some(ClickAction::ZoomIn)
        }
    }

    /// Handle a click at `screen`. Returns the action taken, if any.
    pub fn click(&mut self, screen: Point, modifier: bool) -> Option<ClickAction> {
        let action = self.click_affordance(modifier)?;
        let applied = match action {
            ClickAction::ZoomIn => self.zoom_in_at(screen),
            ClickAction::ZoomOut => self.zoom_out_at(screen),
        };
        applied.then_some(action)
    }

    /// Zoom factor shown to the user, `2^(zoom_index - min_zoom_index)`.
    pub fn zoom_factor(&self) -> u64 {
        self.state()
            .map(|s| 1u64 << (s.zoom_index - s.min_zoom_index))
            .unwrap_or(1)
    }

    fn bump(&mut self) {
        self.generation += 1;
    }

    fn commit(&mut self, state: ViewportState) {
        self.bump();
        self.phase = Phase::Ready(ViewportState {
            generation: self.generation,
            ..state
        });
    }
}

/// Pan that keeps the world point under `screen` fixed across a scale change.
///
/// `world = pan + screen` at the old level maps to `world * old/new` at the new
/// level; subtracting `screen` again gives the new pan.
pub fn zoom_pan(pan: Point, screen: Point, old_scale: f64, new_scale: f64) -> Point {
    let ratio = old_scale / new_scale;
    Point::new(
        (pan.x + screen.x) * ratio - screen.x,
        (pan.y + screen.y) * ratio - screen.y,
    )
}
