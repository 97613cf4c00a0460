//! Track types for the timeline.

use crossbeam_channel::Receiver;
use frameline_core::TimeSpan;
use tracing::debug;
use uuid::Uuid;

use crate::clip::{Clip, ClipKind};
use crate::error::TrackError;
use crate::event::EventHub;
use crate::index::ClipIndex;
use std::collections::HashMap;

/// Events fired synchronously by a track as its clip set changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackEvent {
    ClipAdded { clip: Uuid },
    ClipRemoved { clip: Uuid },
    ClipSpanChanged { clip: Uuid, old_span: TimeSpan, new_span: TimeSpan },
}

/// A track owning a set of clips of a single kind.
///
/// Invariant: `clips` and `index` always hold the same clip set, and every
/// member clip's kind equals the track's kind. All mutation goes through
/// this type so the invariant cannot be broken from outside.
#[derive(Debug)]
pub struct Track {
    /// Unique track ID
    pub id: Uuid,
    /// Track name
    pub name: String,
    kind: ClipKind,
    clips: HashMap<Uuid, Clip>,
    index: ClipIndex,
    events: EventHub<TrackEvent>,
    /// Owning timeline, if attached. Non-owning lookup handle only.
    timeline: Option<Uuid>,
}

impl Track {
    /// Create a new empty track accepting the given clip kind.
    pub fn new(name: impl Into<String>, kind: ClipKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            clips: HashMap::new(),
            index: ClipIndex::new(),
            events: EventHub::new(),
            timeline: None,
        }
    }

    /// The single clip kind this track accepts.
    #[inline]
    pub fn kind(&self) -> ClipKind {
        self.kind
    }

    /// Id of the owning timeline, if attached.
    #[inline]
    pub fn timeline(&self) -> Option<Uuid> {
        self.timeline
    }

    pub(crate) fn set_timeline(&mut self, timeline: Option<Uuid>) {
        self.timeline = timeline;
    }

    /// Subscribe to this track's events.
    pub fn subscribe(&mut self) -> Receiver<TrackEvent> {
        self.events.subscribe()
    }

    /// Take ownership of a detached clip.
    ///
    /// Fails with [`TrackError::KindMismatch`] if the clip kind differs
    /// from the track kind, and [`TrackError::AlreadyOwned`] if the clip
    /// still carries an owner back-reference.
    pub fn add_clip(&mut self, mut clip: Clip) -> Result<Uuid, TrackError> {
        if clip.kind != self.kind {
            return Err(TrackError::KindMismatch {
                expected: self.kind,
                actual: clip.kind,
            });
        }
        if let Some(owner) = clip.track() {
            return Err(TrackError::AlreadyOwned {
                clip: clip.id,
                owner,
            });
        }

        let id = clip.id;
        clip.set_track(Some(self.id));
        self.index.insert(id, clip.span());
        self.clips.insert(id, clip);
        debug!(track = %self.id, clip = %id, "clip added");
        self.events.emit(TrackEvent::ClipAdded { clip: id });
        Ok(id)
    }

    /// Release a clip from this track, returning it detached.
    pub fn remove_clip(&mut self, id: Uuid) -> Result<Clip, TrackError> {
        let mut clip = self
            .clips
            .remove(&id)
            .ok_or(TrackError::NotOwned { clip: id })?;
        self.index.remove(id);
        clip.set_track(None);
        debug!(track = %self.id, clip = %id, "clip removed");
        self.events.emit(TrackEvent::ClipRemoved { clip: id });
        Ok(clip)
    }

    /// Move or resize a clip. The index re-buckets only when the chunk
    /// range actually changes.
    pub fn set_clip_span(&mut self, id: Uuid, span: TimeSpan) -> Result<(), TrackError> {
        let clip = self
            .clips
            .get_mut(&id)
            .ok_or(TrackError::NotOwned { clip: id })?;
        let old_span = clip.span();
        if old_span == span {
            return Ok(());
        }
        clip.set_span(span);
        self.index.update_span(id, span);
        self.events.emit(TrackEvent::ClipSpanChanged {
            clip: id,
            old_span,
            new_span: span,
        });
        Ok(())
    }

    /// Look up a clip by id.
    pub fn clip(&self, id: Uuid) -> Option<&Clip> {
        self.clips.get(&id)
    }

    /// Whether the clip belongs to this track.
    pub fn contains_clip(&self, id: Uuid) -> bool {
        self.clips.contains_key(&id)
    }

    /// Iterate over all clips, in no particular order.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.clips.values()
    }

    /// Number of clips on this track.
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// All clips whose span intersects `span`.
    pub fn clips_in_range(&self, span: TimeSpan) -> Vec<&Clip> {
        self.index
            .clips_in_range(span)
            .into_iter()
            .map(|id| &self.clips[&id])
            .collect()
    }

    /// The top-of-stack clip at `tick` (most recently placed wins).
    pub fn primary_clip_at(&self, tick: i64) -> Option<&Clip> {
        self.index.primary_clip_at(tick).map(|id| &self.clips[&id])
    }

    /// Whether no clip on this track intersects `span`.
    pub fn is_region_empty(&self, span: TimeSpan) -> bool {
        self.index.is_region_empty(span)
    }

    /// Largest end tick over this track's clips (0 when empty).
    pub fn largest_active_tick(&self) -> i64 {
        self.index.largest_active_tick()
    }

    /// Smallest start tick over this track's clips (0 when empty).
    pub fn smallest_active_tick(&self) -> i64 {
        self.index.smallest_active_tick()
    }
}
