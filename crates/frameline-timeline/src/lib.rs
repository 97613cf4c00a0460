//! Frameline Timeline - Timeline data model
//!
//! Implements the scene graph for playback:
//! - Tracks owning clips, with a chunked interval index for range queries
//! - The timeline's play-head / stop-head / loop-region state
//! - Synchronous entity events over an explicit subscriber list
//!
//! All types in this crate are owned exclusively by the model thread;
//! other threads reach them through the playback dispatcher.

pub mod clip;
pub mod error;
pub mod event;
pub mod index;
pub mod timeline;
pub mod track;

pub use clip::{Clip, ClipKind};
pub use error::{TimelineError, TrackError};
pub use event::EventHub;
pub use index::ClipIndex;
pub use timeline::{InvalidatedRegion, Timeline, TimelineEvent};
pub use track::{Track, TrackEvent};
