//! Chunked interval index over clip spans.
//!
//! Partitions the tick axis into fixed-width chunks and lists every clip
//! in each chunk its span touches, so locating clips around a tick costs
//! O(chunk span) instead of a scan of the whole track. Chunk width is
//! `1 << CHUNK_SHIFT` ticks (~0.13 s at the 10 MHz tick clock): a few
//! seconds of playback touches a handful of chunks, while a long clip
//! stays bounded to tens of buckets per minute.

use std::collections::{BTreeMap, HashMap};

use frameline_core::TimeSpan;
use smallvec::SmallVec;
use uuid::Uuid;

/// Chunk width exponent: `chunk = tick >> CHUNK_SHIFT`.
pub const CHUNK_SHIFT: u32 = 26;

#[inline]
fn chunk_of(tick: i64) -> i64 {
    tick >> CHUNK_SHIFT
}

/// First and last chunk touched by a span.
#[inline]
fn chunk_range(span: TimeSpan) -> (i64, i64) {
    (chunk_of(span.start()), chunk_of(span.last_tick()))
}

/// Per-chunk clip list. Insertion order is meaningful: the last-added clip
/// is the top of the stack for primary-clip queries.
type ChunkList = SmallVec<[Uuid; 4]>;

/// Interval index mapping time chunks to the clips overlapping them.
///
/// Self-contained: the index remembers the span each clip was registered
/// with, so removal and re-bucketing never consult the track.
#[derive(Debug, Default)]
pub struct ClipIndex {
    chunks: BTreeMap<i64, ChunkList>,
    spans: HashMap<Uuid, TimeSpan>,
    smallest_active: i64,
    largest_active: i64,
}

impl ClipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed clips.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn contains(&self, clip: Uuid) -> bool {
        self.spans.contains_key(&clip)
    }

    /// Smallest start tick over all indexed clips (0 when empty).
    pub fn smallest_active_tick(&self) -> i64 {
        self.smallest_active
    }

    /// Largest end tick over all indexed clips (0 when empty).
    pub fn largest_active_tick(&self) -> i64 {
        self.largest_active
    }

    /// Register a clip. Panics if the clip is already indexed; the track
    /// keeps its clip set and this index in lockstep, so a duplicate here
    /// is a corrupted-invariant bug, not a recoverable condition.
    pub fn insert(&mut self, clip: Uuid, span: TimeSpan) {
        if self.spans.insert(clip, span).is_some() {
            panic!("clip {clip} already indexed");
        }
        let (a, b) = chunk_range(span);
        for chunk in a..=b {
            self.chunks.entry(chunk).or_default().push(clip);
        }
        if self.spans.len() == 1 {
            self.smallest_active = span.start();
            self.largest_active = span.end();
        } else {
            self.smallest_active = self.smallest_active.min(span.start());
            self.largest_active = self.largest_active.max(span.end());
        }
    }

    /// Unregister a clip. Panics if the clip is not indexed.
    ///
    /// The active-tick bounds are recomputed by a full rescan, since the
    /// removed clip may have been the one defining either bound.
    pub fn remove(&mut self, clip: Uuid) {
        let span = match self.spans.remove(&clip) {
            Some(span) => span,
            None => panic!("clip {clip} is not indexed"),
        };
        self.remove_from_chunks(clip, span);
        self.recompute_bounds();
    }

    /// Move a clip from its registered span to `new_span`.
    ///
    /// Identical spans are a no-op; when the old and new spans touch the
    /// same chunk range, only the stored span changes and the chunk lists
    /// (and the clip's stacking position within them) are left untouched.
    pub fn update_span(&mut self, clip: Uuid, new_span: TimeSpan) {
        let old_span = match self.spans.get_mut(&clip) {
            Some(span) => span,
            None => panic!("clip {clip} is not indexed"),
        };
        if *old_span == new_span {
            return;
        }
        let old = *old_span;
        *old_span = new_span;

        let (old_a, old_b) = chunk_range(old);
        let (new_a, new_b) = chunk_range(new_span);
        if old_a != new_a || old_b != new_b {
            self.remove_from_chunks(clip, old);
            for chunk in new_a..=new_b {
                self.chunks.entry(chunk).or_default().push(clip);
            }
        }
        self.recompute_bounds();
    }

    /// Span the clip is currently registered with.
    pub fn span_of(&self, clip: Uuid) -> Option<TimeSpan> {
        self.spans.get(&clip).copied()
    }

    /// All clips whose span intersects `span`, deduplicated across chunks.
    ///
    /// The chunk walk yields a superset; candidates are filtered by exact
    /// half-open intersection before being returned.
    pub fn clips_in_range(&self, span: TimeSpan) -> Vec<Uuid> {
        let mut found = Vec::new();
        if span.is_empty() {
            return found;
        }
        let (a, b) = chunk_range(span);
        for (_, list) in self.chunks.range(a..=b) {
            for &clip in list.iter() {
                if self.spans[&clip].intersects(span) && !found.contains(&clip) {
                    found.push(clip);
                }
            }
        }
        found
    }

    /// The top-of-stack clip at `tick`: among clips containing the tick,
    /// the most recently placed one wins.
    pub fn primary_clip_at(&self, tick: i64) -> Option<Uuid> {
        let list = self.chunks.get(&chunk_of(tick))?;
        list.iter()
            .rev()
            .copied()
            .find(|clip| self.spans[clip].contains(tick))
    }

    /// Whether no indexed clip intersects `span`.
    pub fn is_region_empty(&self, span: TimeSpan) -> bool {
        if span.is_empty() {
            return true;
        }
        let (a, b) = chunk_range(span);
        for (_, list) in self.chunks.range(a..=b) {
            if list.iter().any(|clip| self.spans[clip].intersects(span)) {
                return false;
            }
        }
        true
    }

    fn remove_from_chunks(&mut self, clip: Uuid, span: TimeSpan) {
        let (a, b) = chunk_range(span);
        for chunk in a..=b {
            let list = self
                .chunks
                .get_mut(&chunk)
                .unwrap_or_else(|| panic!("missing chunk {chunk} for clip {clip}"));
            let pos = list
                .iter()
                .position(|&c| c == clip)
                .unwrap_or_else(|| panic!("clip {clip} missing from chunk {chunk}"));
            list.remove(pos);
            if list.is_empty() {
                self.chunks.remove(&chunk);
            }
        }
    }

    fn recompute_bounds(&mut self) {
        let mut smallest = 0;
        let mut largest = 0;
        for (i, span) in self.spans.values().enumerate() {
            if i == 0 {
                smallest = span.start();
                largest = span.end();
            } else {
                smallest = smallest.min(span.start());
                largest = largest.max(span.end());
            }
        }
        self.smallest_active = smallest;
        self.largest_active = largest;
    }
}
