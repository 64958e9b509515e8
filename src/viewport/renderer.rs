//! Viewport renderer.
//!
//! Composites the visible tiles of the current level onto an RGBA surface.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       ViewportRenderer                          │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                      render()                           │    │
//! │  │  1. Plan visible tiles    3. Miss: spawn fetch task     │    │
//! │  │  2. Hit: draw now         4. Completion: cache & draw   │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    ▲           │
//! │           ▼                    ▼                    │           │
//! │    ┌───────────┐      ┌──────────────┐    ┌──────────────────┐  │
//! │    │ TileCache │      │  TileStore   │───▶│ completion queue │  │
//! │    └───────────┘      │ (fetch task) │    │     (mpsc)       │  │
//! │                       └──────────────┘    └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Fetch tasks run concurrently and finish in any order. Each one fetches and
//! decodes its tile, then sends the result down a single-consumer channel. Only
//! the renderer itself drains that channel, so the viewport state, the cache
//! and the surface have exactly one writer.
//!
//! Fetches are never cancelled. A completion stamped with the current
//! generation is drawn where it was planned; an older one is still cached, and
//! drawn only if its tile is visible in the current frame.

use std::sync::Arc;

use image::{imageops, RgbaImage};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::TileError;
use crate::pyramid::{decode_tile, Dimensions, TileKey};
use crate::store::TileStore;

use super::cache::TileCache;
use super::frame::{plan_frame, tile_position, VisibleWindow};
use super::geometry::{fit_viewport, PanDirection, Point};
use super::state::{ClickAction, Viewport};

// =============================================================================
// Frame Results
// =============================================================================

/// Summary of one composed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Tiles intersecting the frame
    pub visible: usize,

    /// Tiles drawn from cache during this call
    pub drawn: usize,

    /// New fetches started by this call
    pub requested: usize,

    /// Visible tiles whose fetch was already in flight
    pub pending: usize,
}

/// What happened to one fetch completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Cached and drawn on the current frame
    Drawn,

    /// Cached, but the tile is no longer visible
    Stale,

    /// The fetch failed; nothing was cached and the key can be fetched again
    Failed,

    /// Belonged to a store that has since been replaced; ignored
    Discarded,
}

/// Result of one tile fetch, as sent back to the renderer.
struct TileCompletion {
    key: TileKey,
    session: u64,
    generation: u64,
    position: (i64, i64),
    result: Result<Arc<RgbaImage>, TileError>,
}

// =============================================================================
// Renderer
// =============================================================================

/// Renders a pan/zoom viewport from any [`TileStore`].
///
/// # Example
///
/// ```ignore
/// use pyramid_viewer::store::DirectoryTileStore;
/// use pyramid_viewer::viewport::ViewportRenderer;
///
/// let store = Arc::new(DirectoryTileStore::open("tiles/").await?);
/// let mut renderer = ViewportRenderer::fit_to_display(store, Dimensions::new(1280, 800));
///
/// renderer.render();
/// renderer.settle().await;
/// renderer.surface().save("frame.png")?;
/// ```
pub struct ViewportRenderer<S: TileStore + 'static> {
    store: Arc<S>,
    viewport: Viewport,
    /// Display area the frame is fitted into, if it was fitted at all
    display: Option<Dimensions>,
    cache: TileCache,
    surface: RgbaImage,
    session: u64,
    completions_tx: mpsc::UnboundedSender<TileCompletion>,
    completions_rx: mpsc::UnboundedReceiver<TileCompletion>,
}

impl<S: TileStore + 'static> ViewportRenderer<S> {
    /// Create a renderer with a frame of exactly `viewport` pixels.
    pub fn new(store: Arc<S>, viewport: Dimensions) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            viewport: Viewport::with_size(store.layout().clone(), viewport),
            store,
            display: None,
            cache: TileCache::new(),
            surface: RgbaImage::new(viewport.width, viewport.height),
            session: 0,
            completions_tx,
            completions_rx,
        }
    }

    /// Create a renderer whose frame is fitted into `available` display space.
    pub fn fit_to_display(store: Arc<S>, available: Dimensions) -> Self {
        let frame = fit_viewport(available, store.layout().original());
        let mut renderer = Self::new(store, frame);
        renderer.display = Some(available);
        renderer
    }

    /// Pan/zoom state.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Decoded tile cache.
    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// The store tiles are fetched from.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The composed frame.
    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    // =========================================================================
    // Composition
    // =========================================================================

    /// Compose the current frame.
    ///
    /// Cached tiles are drawn immediately. Missing tiles are requested from the
    /// store and drawn when their completion is processed.
    pub fn render(&mut self) -> FrameStats {
        let size = self.viewport.size();
        if self.surface.dimensions() != (size.width, size.height) {
            self.surface = RgbaImage::new(size.width, size.height);
        } else {
            self.surface.pixels_mut().for_each(|p| p.0 = [0, 0, 0, 0]);
        }

        let Some(state) = self.viewport.state() else {
            return FrameStats::default();
        };
        let Some(level) = self.viewport.layout().level(state.zoom_index).copied() else {
            return FrameStats::default();
        };

        let placements = plan_frame(&level, &state);
        let mut stats = FrameStats {
            visible: placements.len(),
            ..FrameStats::default()
        };

        for placement in placements {
            if let Some(tile) = self.cache.get(&placement.key) {
                imageops::overlay(&mut self.surface, &*tile, placement.x, placement.y);
                stats.drawn += 1;
            } else if self.cache.begin_fetch(placement.key) {
                self.spawn_fetch(placement.key, state.generation, (placement.x, placement.y));
                stats.requested += 1;
            } else {
                stats.pending += 1;
            }
        }

        debug!(
            level = state.zoom_index,
            generation = state.generation,
            visible = stats.visible,
            drawn = stats.drawn,
            requested = stats.requested,
            pending = stats.pending,
            "Rendered frame"
        );
        stats
    }

    fn spawn_fetch(&self, key: TileKey, generation: u64, position: (i64, i64)) {
        let store = Arc::clone(&self.store);
        let tx = self.completions_tx.clone();
        let session = self.session;

        tokio::spawn(async move {
            let result = match store.get(key).await {
                Ok(bytes) => decode_tile(&bytes).map(Arc::new),
                Err(e) => Err(TileError::from(e)),
            };
            // The renderer may be gone; then nobody needs this tile.
            let _ = tx.send(TileCompletion {
                key,
                session,
                generation,
                position,
                result,
            });
        });
    }

    fn apply_completion(&mut self, completion: TileCompletion) -> CompletionOutcome {
        if completion.session != self.session {
            return CompletionOutcome::Discarded;
        }
        self.cache.end_fetch(&completion.key);

        let tile = match completion.result {
            Ok(tile) => tile,
            Err(e) => {
                warn!(
                    level = completion.key.level,
                    row = completion.key.row,
                    col = completion.key.col,
                    "Tile fetch failed: {}",
                    e
                );
                return CompletionOutcome::Failed;
            }
        };
        self.cache.put(completion.key, Arc::clone(&tile));

        let Some(state) = self.viewport.state() else {
            return CompletionOutcome::Stale;
        };

        let position = if completion.generation == state.generation {
            completion.position
        } else {
            let visible = completion.key.level == state.zoom_index
                && self
                    .viewport
                    .layout()
                    .level(state.zoom_index)
                    .map(|level| {
                        let window = VisibleWindow::new(level, &state);
                        window.rows.contains(&completion.key.row)
                            && window.cols.contains(&completion.key.col)
                    })
                    .unwrap_or(false);
            if !visible {
                debug!(
                    level = completion.key.level,
                    row = completion.key.row,
                    col = completion.key.col,
                    fetched_at = completion.generation,
                    current = state.generation,
                    "Stale tile completion"
                );
                return CompletionOutcome::Stale;
            }
            tile_position(completion.key, &state)
        };

        imageops::overlay(&mut self.surface, &*tile, position.0, position.1);
        CompletionOutcome::Drawn
    }

    /// Wait for the next fetch completion and apply it.
    ///
    /// Returns `None` if no fetch is outstanding.
    pub async fn next_completion(&mut self) -> Option<CompletionOutcome> {
        if self.cache.in_flight_count() == 0 {
            return None;
        }
        loop {
            let completion = self.completions_rx.recv().await?;
            let outcome = self.apply_completion(completion);
            if outcome != CompletionOutcome::Discarded {
                return Some(outcome);
            }
        }
    }

    /// Apply every completion that has already arrived, without waiting.
    ///
    /// Returns how many completions were applied.
    pub fn drain_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            if self.apply_completion(completion) != CompletionOutcome::Discarded {
                applied += 1;
            }
        }
        applied
    }

    /// Wait until every outstanding fetch has completed.
    pub async fn settle(&mut self) {
        while self.next_completion().await.is_some() {}
    }

    // =========================================================================
    // Gestures
    // =========================================================================

    /// Zoom to a level about a screen point; re-renders if anything changed.
    pub fn zoom_to(&mut self, target: usize, screen: Point) -> bool {
        let changed = self.viewport.zoom_to(target, screen);
        if changed {
            self.render();
        }
        changed
    }

    /// Click at a screen point; `modifier` zooms out instead of in.
    pub fn click(&mut self, screen: Point, modifier: bool) -> Option<ClickAction> {
        let action = self.viewport.click(screen, modifier);
        if action.is_some() {
            self.render();
        }
        action
    }

    /// Pan one step; re-renders if the pan changed.
    pub fn pan_by(&mut self, direction: PanDirection) -> bool {
        let changed = self.viewport.pan_by(direction);
        if changed {
            self.render();
        }
        changed
    }

    /// Resize the frame, resetting zoom and pan.
    ///
    /// The frame is taken as given; it is no longer fitted to a display area.
    pub fn resize(&mut self, viewport: Dimensions) {
        self.display = None;
        self.viewport.resize(viewport);
        self.render();
    }

    /// Re-fit the frame into a new display area, resetting zoom and pan.
    pub fn resize_display(&mut self, available: Dimensions) {
        let frame = fit_viewport(available, self.store.layout().original());
        self.display = Some(available);
        self.viewport.resize(frame);
        self.render();
    }

    /// Return to the most zoomed-out view.
    pub fn zoom_out_fully(&mut self) {
        self.viewport.zoom_out_fully();
        self.render();
    }

    /// Switch to another source. The cache is dropped wholesale and results of
    /// fetches still in flight for the old store are ignored.
    ///
    /// A frame fitted to a display area is re-fitted to the new source's
    /// aspect ratio.
    pub fn replace_store(&mut self, store: Arc<S>) {
        self.session += 1;
        self.cache.clear();
        let frame = match self.display {
            Some(available) => fit_viewport(available, store.layout().original()),
            None => self.viewport.size(),
        };
        self.viewport = Viewport::with_size(store.layout().clone(), frame);
        self.store = store;
        self.render();
    }
}

// =============================================================================
// Tests
// =============================================================================
