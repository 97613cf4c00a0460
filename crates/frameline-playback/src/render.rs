//! The render-pipeline seam.
//!
//! The actual compositing/decoding pipeline is a collaborator injected
//! into the model thread. The scheduler only ever asks two things of it:
//! start rendering a play-head position, and (later) whether that render
//! has finished. Completion is communicated through a handle/completion
//! pair rather than a future so the timing thread can poll without an
//! async runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// How a render request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Completed,
    Failed(String),
    /// The pipeline abandoned the request (shutdown, seek). Benign.
    Cancelled,
}

#[derive(Debug)]
struct RenderShared {
    finished: AtomicBool,
    outcome: Mutex<Option<RenderOutcome>>,
    started: Instant,
    duration: Mutex<Option<Duration>>,
}

impl RenderShared {
    fn complete(&self, outcome: RenderOutcome) {
        let mut slot = self.outcome.lock();
        if slot.is_some() {
            return;
        }
        *slot = Some(outcome);
        *self.duration.lock() = Some(self.started.elapsed());
        self.finished.store(true, Ordering::Release);
    }
}

/// Polling half of a render request, held by the scheduler.
#[derive(Debug, Clone)]
pub struct RenderHandle {
    shared: Arc<RenderShared>,
}

impl RenderHandle {
    /// Create a handle/completion pair for a render starting now.
    pub fn pair() -> (RenderHandle, RenderCompletion) {
        let shared = Arc::new(RenderShared {
            finished: AtomicBool::new(false),
            outcome: Mutex::new(None),
            started: Instant::now(),
            duration: Mutex::new(None),
        });
        (
            RenderHandle {
                shared: Arc::clone(&shared),
            },
            RenderCompletion { shared },
        )
    }

    /// A handle that is already complete, for pipelines that render
    /// synchronously inside `begin_render`.
    pub fn completed() -> RenderHandle {
        let (handle, completion) = Self::pair();
        completion.finish(RenderOutcome::Completed);
        handle
    }

    /// Whether the pipeline has finished (in any way) with this request.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    /// The outcome, once finished.
    pub fn outcome(&self) -> Option<RenderOutcome> {
        self.shared.outcome.lock().clone()
    }

    /// Wall-clock duration of the render, once finished. Diagnostic only.
    pub fn render_duration(&self) -> Option<Duration> {
        *self.shared.duration.lock()
    }
}

/// Completing half of a render request, held by the pipeline.
///
/// Dropping it unfinished records a cancellation.
#[derive(Debug)]
pub struct RenderCompletion {
    shared: Arc<RenderShared>,
}

impl RenderCompletion {
    /// Mark the render finished. Later calls on an already-finished
    /// request are ignored.
    pub fn finish(self, outcome: RenderOutcome) {
        self.shared.complete(outcome);
    }
}

impl Drop for RenderCompletion {
    fn drop(&mut self) {
        self.shared.complete(RenderOutcome::Cancelled);
    }
}

/// The render pipeline collaborator.
///
/// Called only from the model thread. `begin_render` must not block on
/// the render itself; long work happens elsewhere and finishes the
/// completion when done.
pub trait RenderPipeline: Send {
    /// Start rendering the frame at the given play-head tick.
    fn begin_render(&mut self, play_head: i64) -> RenderHandle;
}

/// A pipeline that completes every request instantly. Useful as a
/// placeholder and in tests.
#[derive(Debug, Default)]
pub struct NoopRenderPipeline {
    pub requests: Vec<i64>,
}

impl RenderPipeline for NoopRenderPipeline {
    fn begin_render(&mut self, play_head: i64) -> RenderHandle {
        self.requests.push(play_head);
        RenderHandle::completed()
    }
}
