//! The timeline: ordered tracks plus play-head state.

use crossbeam_channel::Receiver;
use frameline_core::{TimeSpan, TICKS_PER_SECOND};
use tracing::debug;
use uuid::Uuid;

use crate::error::TimelineError;
use crate::event::EventHub;
use crate::track::Track;

/// Headroom added past the furthest position when the duration grows.
const DURATION_HEADROOM: i64 = TICKS_PER_SECOND;

/// Region of the timeline whose rendered output is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidatedRegion {
    /// Only this span needs recompositing.
    Span(TimeSpan),
    /// Everything is stale (structural change).
    Everything,
}

/// Events fired synchronously by the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEvent {
    PlayHeadChanged { old: i64, new: i64 },
    StopHeadChanged { old: i64, new: i64 },
    MaxDurationChanged { old: i64, new: i64 },
    TrackAdded { track: Uuid, index: usize },
    TrackRemoved { track: Uuid, index: usize },
    TrackMoved { track: Uuid, old_index: usize, new_index: usize },
    RenderInvalidated(InvalidatedRegion),
}

/// A timeline of ordered tracks with play-head, stop-head, duration and
/// loop-region state.
///
/// Track order is composite (z) order and is preserved across insert,
/// remove and move. The timeline is owned by the model thread; see the
/// playback crate for the dispatch rules.
#[derive(Debug)]
pub struct Timeline {
    /// Unique timeline ID
    pub id: Uuid,
    tracks: Vec<Track>,
    play_head: i64,
    stop_head: i64,
    max_duration: i64,
    loop_region: Option<TimeSpan>,
    loop_enabled: bool,
    events: EventHub<TimelineEvent>,
    render_suspend_depth: u32,
}

impl Timeline {
    /// Create an empty timeline with one minute of initial duration.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks: Vec::new(),
            play_head: 0,
            stop_head: 0,
            max_duration: 60 * TICKS_PER_SECOND,
            loop_region: None,
            loop_enabled: false,
            events: EventHub::new(),
            render_suspend_depth: 0,
        }
    }

    /// Subscribe to this timeline's events.
    pub fn subscribe(&mut self) -> Receiver<TimelineEvent> {
        self.events.subscribe()
    }

    // ── Head positions ──────────────────────────────────────────────

    #[inline]
    pub fn play_head(&self) -> i64 {
        self.play_head
    }

    #[inline]
    pub fn stop_head(&self) -> i64 {
        self.stop_head
    }

    #[inline]
    pub fn max_duration(&self) -> i64 {
        self.max_duration
    }

    /// Move the play head. Negative positions clamp to zero; the maximum
    /// duration grows to cover any position ever assigned. Emits
    /// `PlayHeadChanged` plus a render invalidation covering the union of
    /// the old and new positions.
    pub fn set_play_head(&mut self, tick: i64) {
        let new = tick.max(0);
        self.expand_for(new);
        let old = self.play_head;
        if old == new {
            return;
        }
        self.play_head = new;
        self.events.emit(TimelineEvent::PlayHeadChanged { old, new });
        let touched = TimeSpan::point(old).union(TimeSpan::point(new));
        self.invalidate_render(InvalidatedRegion::Span(touched));
    }

    /// Move the stop head (the parked position restored on stop).
    pub fn set_stop_head(&mut self, tick: i64) {
        let new = tick.max(0);
        let old = self.stop_head;
        if old == new {
            return;
        }
        self.stop_head = new;
        self.events.emit(TimelineEvent::StopHeadChanged { old, new });
    }

    /// Grow the maximum duration so `tick` is in range, with headroom.
    pub fn expand_for(&mut self, tick: i64) {
        if tick >= self.max_duration {
            let old = self.max_duration;
            self.max_duration = tick.saturating_add(DURATION_HEADROOM);
            self.events.emit(TimelineEvent::MaxDurationChanged {
                old,
                new: self.max_duration,
            });
        }
    }

    /// Grow the maximum duration to keep headroom past the furthest clip.
    pub fn update_duration_for_content(&mut self) {
        self.expand_for(self.largest_tick_in_use());
    }

    /// Largest end tick over all tracks' clips (0 with no clips).
    pub fn largest_tick_in_use(&self) -> i64 {
        self.tracks
            .iter()
            .map(|t| t.largest_active_tick())
            .max()
            .unwrap_or(0)
    }

    // ── Loop region ─────────────────────────────────────────────────

    pub fn loop_region(&self) -> Option<TimeSpan> {
        self.loop_region
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    /// Change the loop region. Takes effect on the next playback tick.
    pub fn set_loop_region(&mut self, region: Option<TimeSpan>) {
        self.loop_region = region;
    }

    /// Enable or disable looping. Takes effect on the next playback tick.
    pub fn set_loop_enabled(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    /// The loop region, if looping is enabled and the region is usable.
    pub fn active_loop(&self) -> Option<TimeSpan> {
        match self.loop_region {
            Some(region) if self.loop_enabled && !region.is_empty() => Some(region),
            _ => None,
        }
    }

    // ── Tracks ──────────────────────────────────────────────────────

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn track(&self, id: Uuid) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn track_mut(&mut self, id: Uuid) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    pub fn track_at(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn track_at_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    pub fn track_index(&self, id: Uuid) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Append a track.
    pub fn add_track(&mut self, track: Track) {
        let index = self.tracks.len();
        self.insert_track(index, track);
    }

    /// Insert a track at the given z position (clamped to the track count).
    pub fn insert_track(&mut self, index: usize, mut track: Track) {
        let index = index.min(self.tracks.len());
        track.set_timeline(Some(self.id));
        let id = track.id;
        self.tracks.insert(index, track);
        debug!(timeline = %self.id, track = %id, index, "track added");
        self.events.emit(TimelineEvent::TrackAdded { track: id, index });
        self.invalidate_render(InvalidatedRegion::Everything);
    }

    /// Remove a track by id, returning it detached.
    pub fn remove_track(&mut self, id: Uuid) -> Result<Track, TimelineError> {
        let index = self
            .track_index(id)
            .ok_or(TimelineError::UnknownTrack { track: id })?;
        let mut track = self.tracks.remove(index);
        track.set_timeline(None);
        debug!(timeline = %self.id, track = %id, index, "track removed");
        self.events
            .emit(TimelineEvent::TrackRemoved { track: id, index });
        self.invalidate_render(InvalidatedRegion::Everything);
        Ok(track)
    }

    /// Move a track to a new z position, preserving the order of the rest.
    pub fn move_track(&mut self, old_index: usize, new_index: usize) -> Result<(), TimelineError> {
        let len = self.tracks.len();
        if old_index >= len {
            return Err(TimelineError::IndexOutOfRange { index: old_index, len });
        }
        if new_index >= len {
            return Err(TimelineError::IndexOutOfRange { index: new_index, len });
        }
        if old_index == new_index {
            return Ok(());
        }
        let track = self.tracks.remove(old_index);
        let id = track.id;
        self.tracks.insert(new_index, track);
        self.events.emit(TimelineEvent::TrackMoved {
            track: id,
            old_index,
            new_index,
        });
        self.invalidate_render(InvalidatedRegion::Everything);
        Ok(())
    }

    // ── Render invalidation ─────────────────────────────────────────

    /// Broadcast that rendered output for `region` is stale. Suppressed
    /// while invalidation is suspended (the playback tick schedules its
    /// own render instead).
    pub fn invalidate_render(&mut self, region: InvalidatedRegion) {
        if self.render_suspend_depth == 0 {
            self.events.emit(TimelineEvent::RenderInvalidated(region));
        }
    }

    /// Suspend render-invalidation events for the guard's lifetime.
    pub fn suspend_render_invalidation(&mut self) -> RenderSuspendGuard<'_> {
        self.render_suspend_depth += 1;
        RenderSuspendGuard { timeline: self }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard from [`Timeline::suspend_render_invalidation`].
pub struct RenderSuspendGuard<'a> {
    timeline: &'a mut Timeline,
}

impl std::ops::Deref for RenderSuspendGuard<'_> {
    type Target = Timeline;
    fn deref(&self) -> &Timeline {
        self.timeline
    }
}

impl std::ops::DerefMut for RenderSuspendGuard<'_> {
    fn deref_mut(&mut self) -> &mut Timeline {
        self.timeline
    }
}

impl Drop for RenderSuspendGuard<'_> {
    fn drop(&mut self) {
        self.timeline.render_suspend_depth -= 1;
    }
}
