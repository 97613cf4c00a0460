//! The model thread: single owner of the mutable scene graph.
//!
//! Every mutation of Timeline/Track/Clip state, and every render
//! request, happens on this thread. Other threads (the timing thread,
//! the control API, UI) submit closures through [`ModelHandle::invoke`],
//! which enqueues the closure and blocks until the model thread has run
//! it — a synchronous hand-off, not a fire-and-forget queue.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, unbounded, Sender};
use frameline_timeline::Timeline;
use tracing::{debug, error};

use crate::render::{RenderHandle, RenderOutcome, RenderPipeline};

/// State owned exclusively by the model thread.
pub struct ModelState {
    pub timeline: Timeline,
    pub pipeline: Box<dyn RenderPipeline>,
    last_render: Option<RenderHandle>,
}

impl ModelState {
    pub fn new(timeline: Timeline, pipeline: Box<dyn RenderPipeline>) -> Self {
        Self {
            timeline,
            pipeline,
            last_render: None,
        }
    }

    /// Whether the previous render request (if any) has finished.
    pub fn last_render_finished(&self) -> bool {
        self.last_render
            .as_ref()
            .map(RenderHandle::is_finished)
            .unwrap_or(true)
    }

    /// The handle of the most recent render request.
    pub fn last_render(&self) -> Option<&RenderHandle> {
        self.last_render.as_ref()
    }

    /// If the previous render finished in failure, clear it and return
    /// the failure message. The scheduler reacts at the tick boundary
    /// (pause, keep position); clearing lets a later resume render again
    /// instead of tripping over the same stale failure.
    pub fn take_failed_render(&mut self) -> Option<String> {
        if let Some(handle) = &self.last_render {
            if let Some(RenderOutcome::Failed(message)) = handle.outcome() {
                self.last_render = None;
                return Some(message);
            }
        }
        None
    }

    /// Issue a render for `play_head` unless one is still in flight.
    /// Returns whether a request was issued (frames are dropped, not
    /// queued, when the pipeline is behind).
    pub fn request_render(&mut self, play_head: i64) -> bool {
        if !self.last_render_finished() {
            return false;
        }
        self.last_render = Some(self.pipeline.begin_render(play_head));
        true
    }
}

enum Command {
    Run(Box<dyn FnOnce(&mut ModelState) + Send>),
    Shutdown,
}

/// Cloneable handle submitting work to the model thread.
#[derive(Clone)]
pub struct ModelHandle {
    tx: Sender<Command>,
}

impl ModelHandle {
    /// Run `f` on the model thread and wait for its result.
    ///
    /// Returns `None` when the model thread has shut down (or the closure
    /// panicked); callers treat that as "the model is gone" and wind
    /// playback down rather than erroring.
    pub fn invoke<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut ModelState) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = bounded(1);
        let command = Command::Run(Box::new(move |state| {
            let _ = reply_tx.send(f(state));
        }));
        self.tx.send(command).ok()?;
        reply_rx.recv().ok()
    }

    /// Whether the model thread is still accepting work.
    pub fn is_alive(&self) -> bool {
        self.invoke(|_| ()).is_some()
    }
}

/// The model thread itself. Dropping it shuts the thread down after the
/// queued commands have drained.
pub struct ModelThread {
    handle: ModelHandle,
    join: Option<JoinHandle<()>>,
}

impl ModelThread {
    /// Spawn the model thread owning `state`.
    pub fn spawn(mut state: ModelState) -> Self {
        let (tx, rx) = unbounded::<Command>();
        let join = std::thread::Builder::new()
            .name("frameline-model".into())
            .spawn(move || {
                for command in rx.iter() {
                    match command {
                        Command::Run(f) => {
                            // A panicking command must not take the whole
                            // model down with it; the submitter sees the
                            // dropped reply channel.
                            let result = catch_unwind(AssertUnwindSafe(|| f(&mut state)));
                            if result.is_err() {
                                error!("model command panicked; state may be incomplete");
                            }
                        }
                        Command::Shutdown => break,
                    }
                }
                debug!("model thread exiting");
            })
            .expect("failed to spawn model thread");

        Self {
            handle: ModelHandle { tx },
            join: Some(join),
        }
    }

    pub fn handle(&self) -> ModelHandle {
        self.handle.clone()
    }

    /// Stop the thread after the pending commands have run.
    pub fn shutdown(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = self.handle.tx.send(Command::Shutdown);
            let _ = join.join();
        }
    }
}

impl Drop for ModelThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}
