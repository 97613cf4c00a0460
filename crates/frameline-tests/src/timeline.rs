//! Integration tests for the timeline subsystem.
//!
//! Exercises cross-type interactions between frameline-core spans,
//! tracks with their interval index, and the timeline.

use frameline_core::TimeSpan;
use frameline_timeline::{Clip, ClipKind, Timeline, Track, TrackError};

// ── Helpers ────────────────────────────────────────────────────

fn span(start: i64, end: i64) -> TimeSpan {
    TimeSpan::new(start, end).unwrap()
}

fn video_clip(name: &str, start: i64, end: i64) -> Clip {
    Clip::new(name, ClipKind::Video, span(start, end))
}

// ── Track queries over two clips ───────────────────────────────

#[test]
fn gap_between_clips_has_no_primary_clip() {
    let mut track = Track::new("V1", ClipKind::Video);
    let first = track.add_clip(video_clip("A", 0, 100)).unwrap();
    track.add_clip(video_clip("B", 150, 300)).unwrap();

    assert!(track.primary_clip_at(120).is_none());
    assert_eq!(track.primary_clip_at(50).unwrap().id, first);
}

#[test]
fn range_query_spans_the_gap() {
    let mut track = Track::new("V1", ClipKind::Video);
    let first = track.add_clip(video_clip("A", 0, 100)).unwrap();
    let second = track.add_clip(video_clip("B", 150, 300)).unwrap();

    let hits = track.clips_in_range(span(90, 160));
    let ids: Vec<_> = hits.iter().map(|c| c.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first));
    assert!(ids.contains(&second));

    // A query strictly inside the gap finds nothing.
    assert!(track.clips_in_range(span(110, 140)).is_empty());
    assert!(track.is_region_empty(span(110, 140)));
}

#[test]
fn overlapping_clips_stack_by_recency() {
    let mut track = Track::new("V1", ClipKind::Video);
    track.add_clip(video_clip("under", 0, 200)).unwrap();
    let top = track.add_clip(video_clip("over", 100, 300)).unwrap();

    assert_eq!(track.primary_clip_at(150).unwrap().id, top);
}

// ── Timeline and track composition ─────────────────────────────

#[test]
fn timeline_duration_grows_with_content() {
    let mut tl = Timeline::new();
    let track = Track::new("V1", ClipKind::Video);
    let track_id = track.id;
    tl.add_track(track);

    let far_end = tl.max_duration() + 1_000_000;
    tl.track_mut(track_id)
        .unwrap()
        .add_clip(video_clip("long", 0, far_end))
        .unwrap();

    assert_eq!(tl.largest_tick_in_use(), far_end);
    tl.update_duration_for_content();
    assert!(tl.max_duration() > far_end);
}

#[test]
fn removed_track_keeps_its_clips() {
    let mut tl = Timeline::new();
    let mut track = Track::new("A1", ClipKind::Audio);
    track
        .add_clip(Clip::new("music", ClipKind::Audio, span(0, 500)))
        .unwrap();
    let id = track.id;
    tl.add_track(track);

    let removed = tl.remove_track(id).unwrap();
    assert_eq!(removed.clip_count(), 1);
    assert!(removed.timeline().is_none());
}

#[test]
fn track_kind_is_enforced_through_the_timeline() {
    let mut tl = Timeline::new();
    let track = Track::new("A1", ClipKind::Audio);
    let id = track.id;
    tl.add_track(track);

    let result = tl
        .track_mut(id)
        .unwrap()
        .add_clip(video_clip("wrong", 0, 10));
    assert!(matches!(result, Err(TrackError::KindMismatch { .. })));
}

#[test]
fn clip_moved_across_tracks_round_trips() {
    let mut tl = Timeline::new();
    let a = Track::new("V1", ClipKind::Video);
    let b = Track::new("V2", ClipKind::Video);
    let (ida, idb) = (a.id, b.id);
    tl.add_track(a);
    tl.add_track(b);

    let clip_id = tl
        .track_mut(ida)
        .unwrap()
        .add_clip(video_clip("c", 10, 20))
        .unwrap();

    // Detach from one track, attach to the other.
    let clip = tl.track_mut(ida).unwrap().remove_clip(clip_id).unwrap();
    tl.track_mut(idb).unwrap().add_clip(clip).unwrap();

    assert!(tl.track(ida).unwrap().primary_clip_at(15).is_none());
    let moved = tl.track(idb).unwrap().primary_clip_at(15).unwrap();
    assert_eq!(moved.id, clip_id);
    assert_eq!(moved.track(), Some(idb));
}
