//! Clip types for the timeline.

use frameline_core::TimeSpan;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of media a clip carries. A track only accepts clips of its own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipKind {
    Video,
    Audio,
}

/// A clip on the timeline.
///
/// Created detached; ownership is taken by [`Track::add_clip`] and released
/// by [`Track::remove_clip`]. The span must be changed through the owning
/// track so the interval index stays consistent.
///
/// [`Track::add_clip`]: crate::track::Track::add_clip
/// [`Track::remove_clip`]: crate::track::Track::remove_clip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: Uuid,
    /// Clip name (displayed in UI)
    pub name: String,
    /// Media kind
    pub kind: ClipKind,
    /// Occupied timeline region
    span: TimeSpan,
    /// Offset into the source media at the span's start, in ticks
    pub media_offset: i64,
    /// Is clip enabled
    pub enabled: bool,
    /// Owning track, if attached. Non-owning lookup handle only.
    track: Option<Uuid>,
}

impl Clip {
    /// Create a new detached clip.
    pub fn new(name: impl Into<String>, kind: ClipKind, span: TimeSpan) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            span,
            media_offset: 0,
            enabled: true,
            track: None,
        }
    }

    /// Timeline region occupied by this clip.
    #[inline]
    pub fn span(&self) -> TimeSpan {
        self.span
    }

    /// Id of the owning track, if attached.
    #[inline]
    pub fn track(&self) -> Option<Uuid> {
        self.track
    }

    /// Whether the clip covers the given timeline tick.
    #[inline]
    pub fn intersects_tick(&self, tick: i64) -> bool {
        self.span.contains(tick)
    }

    /// Tick within the source media corresponding to a timeline tick.
    pub fn media_tick_at(&self, timeline_tick: i64) -> i64 {
        timeline_tick - self.span.start() + self.media_offset
    }

    pub(crate) fn set_span(&mut self, span: TimeSpan) {
        self.span = span;
    }

    pub(crate) fn set_track(&mut self, track: Option<Uuid>) {
        self.track = track;
    }
}
