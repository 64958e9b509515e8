//! Background pyramid builds.
//!
//! Building is CPU and memory heavy, so interactive callers run it on tokio's
//! blocking pool and watch a stream of events instead of waiting on the
//! builder directly:
//!
//! ```text
//! Progress { level: n-1 } ─▶ Progress { level: n-2 } ─▶ ... ─▶ Done(pyramid)
//!                                                         └──▶ Failed { message }
//! ```
//!
//! The job shares nothing mutable with the caller except the cancel flag.
//! Dropping the [`BuildHandle`] raises that flag, so abandoning a build (for
//! example when a new source is chosen) needs no extra bookkeeping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::DynamicImage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::BuildError;

use super::builder::{BuildOptions, Pyramid, PyramidBuilder};

/// Event emitted by a background build.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// A level has been fully tiled
    Progress { level: usize, total_levels: usize },

    /// The build finished; always the last event on success
    Done(Arc<Pyramid>),

    /// The build failed; always the last event on failure
    Failed { message: String },
}

impl BuildEvent {
    /// `true` for `Done` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BuildEvent::Progress { .. })
    }
}

/// Handle to a running background build.
pub struct BuildHandle {
    events: mpsc::UnboundedReceiver<BuildEvent>,
    cancel: Arc<AtomicBool>,
    task: Option<JoinHandle<Result<Arc<Pyramid>, BuildError>>>,
}

/// Start building a pyramid on the blocking thread pool.
///
/// Must be called from within a tokio runtime.
pub fn spawn_build(source: DynamicImage, options: BuildOptions) -> BuildHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let builder = PyramidBuilder::with_options(options).with_cancel_flag(cancel.clone());

    let task = tokio::task::spawn_blocking(move || {
        let progress_tx = tx.clone();
        let result = builder
            .build_with_progress(source, |p| {
                // A closed channel just means nobody is watching progress.
                let _ = progress_tx.send(BuildEvent::Progress {
                    level: p.level,
                    total_levels: p.total_levels,
                });
            })
            .map(Arc::new);

        let terminal = match &result {
            Ok(pyramid) => BuildEvent::Done(pyramid.clone()),
            Err(e) => BuildEvent::Failed {
                message: e.to_string(),
            },
        };
        let _ = tx.send(terminal);
        result
    });

    BuildHandle {
        events: rx,
        cancel,
        task: Some(task),
    }
}

impl BuildHandle {
    /// Wait for the next event. Returns `None` after the terminal event.
    pub async fn next_event(&mut self) -> Option<BuildEvent> {
        self.events.recv().await
    }

    /// Ask the build to stop. It ends with a `Failed` event.
    pub fn cancel(&self) {
        debug!("Cancelling pyramid build");
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Wait for the build to finish, discarding progress events.
    pub async fn finish(mut self) -> Result<Arc<Pyramid>, BuildError> {
        let Some(task) = self.task.take() else {
            return Err(BuildError::Worker {
                message: "build result already taken".to_string(),
            });
        };

        match task.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Pyramid build task failed: {}", e);
                Err(BuildError::Worker {
                    message: e.to_string(),
                })
            }
        }
    }
}

impl Drop for BuildHandle {
    fn drop(&mut self) {
        // Only matters if the job is still running; harmless otherwise.
        if self.task.is_some() {
            self.cancel.store(true, Ordering::Relaxed);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
