//! Frameline Playback - The playback scheduling engine
//!
//! Threading model: one free-running **timing thread** owned by the
//! [`PlaybackScheduler`] computes tick deadlines and frame advances, and
//! one **model thread** ([`ModelThread`]) exclusively owns the mutable
//! scene graph (timeline, tracks, render pipeline). The timing thread
//! never touches model state directly; each tick's effect is applied
//! through the synchronous [`ModelHandle::invoke`] hand-off, bounding the
//! surface where races can occur to that single call.
//!
//! Render requests are single-flight: at most one in-flight render at a
//! time, frames are dropped rather than queued, and a stalled render is
//! compensated by bounded catch-up on later ticks.

pub mod config;
pub mod model;
pub mod render;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use model::{ModelHandle, ModelState, ModelThread};
pub use render::{NoopRenderPipeline, RenderCompletion, RenderHandle, RenderOutcome, RenderPipeline};
pub use scheduler::{MovingAverage, PlayState, PlaybackEvent, PlaybackScheduler};
