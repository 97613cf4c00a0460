//! Time representation for frame-accurate playback
//!
//! The timeline runs on a fixed integer tick clock, independent of the
//! project frame rate. Frame rates are rationals to avoid floating-point
//! accumulation errors for broadcast rates like 29.97.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::error::TimeError;

/// Ticks per second of the timeline clock (100 ns resolution).
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks per millisecond.
pub const TICKS_PER_MILLI: i64 = TICKS_PER_SECOND / 1000;

/// Monotonic tick count elapsed since `epoch`.
///
/// The playback thread measures all deadlines against a single epoch so
/// tick values are comparable across the life of the scheduler.
#[inline]
pub fn ticks_since(epoch: Instant) -> i64 {
    (epoch.elapsed().as_nanos() / 100) as i64
}

/// Frame rate as a rational number (e.g., 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 30000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Duration of a single frame in timeline ticks, rounded to the
    /// nearest tick. Computed once per rate change; the scheduler never
    /// re-derives it per tick. Degenerate rates fall back to 1 fps.
    pub fn interval_ticks(self) -> i64 {
        if self.numerator == 0 || self.denominator == 0 {
            return TICKS_PER_SECOND;
        }
        let interval = Rational64::new(
            TICKS_PER_SECOND * self.denominator as i64,
            self.numerator as i64,
        );
        interval.round().to_integer()
    }

    /// Common frame rates
    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_50: Self = Self::new(50, 1);
    pub const FPS_59_94: Self = Self::new(60000, 1001);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

/// A half-open time interval `[start, end)` in timeline ticks.
///
/// Immutable and copied by value. Touching endpoints do not intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    start: i64,
    end: i64,
}

impl TimeSpan {
    /// Empty span at the origin.
    pub const ZERO: Self = Self { start: 0, end: 0 };

    /// Create a span from start and end ticks.
    pub fn new(start: i64, end: i64) -> Result<Self, TimeError> {
        if start < 0 || end < 0 {
            return Err(TimeError::Negative { start, end });
        }
        if end < start {
            return Err(TimeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Single-tick span at `tick`. Negative ticks clamp to the origin.
    #[inline]
    pub fn point(tick: i64) -> Self {
        let start = tick.max(0);
        Self {
            start,
            end: start.saturating_add(1),
        }
    }

    /// Create a span from start tick and duration.
    pub fn from_duration(start: i64, duration: i64) -> Result<Self, TimeError> {
        if start < 0 || duration < 0 {
            return Err(TimeError::Negative {
                start,
                end: duration,
            });
        }
        let end = start.checked_add(duration).ok_or(TimeError::Overflow)?;
        Ok(Self { start, end })
    }

    /// Start tick (inclusive).
    #[inline]
    pub fn start(self) -> i64 {
        self.start
    }

    /// End tick (exclusive).
    #[inline]
    pub fn end(self) -> i64 {
        self.end
    }

    /// Last tick covered by the span (inclusive end index).
    ///
    /// Equal to `start` for empty spans.
    #[inline]
    pub fn last_tick(self) -> i64 {
        if self.end > self.start {
            self.end - 1
        } else {
            self.start
        }
    }

    /// Length of the span in ticks.
    #[inline]
    pub fn duration(self) -> i64 {
        self.end - self.start
    }

    /// Whether the span covers no ticks.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.end == self.start
    }

    /// Whether a tick lies within the span (`start <= t < end`).
    #[inline]
    pub fn contains(self, tick: i64) -> bool {
        tick >= self.start && tick < self.end
    }

    /// Whether two spans overlap. Half-open semantics: spans that merely
    /// touch at an endpoint do not intersect.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        other.end > self.start && other.start < self.end
    }

    /// Smallest span covering both inputs (min-start / max-end).
    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Overlapping region of two spans, if any.
    pub fn intersection(self, other: Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// Clamp this span to lie within `bounds`. Spans entirely outside the
    /// bounds collapse to an empty span at the nearer boundary.
    pub fn clamp(self, bounds: Self) -> Self {
        let start = self.start.clamp(bounds.start, bounds.end);
        let end = self.end.clamp(bounds.start, bounds.end);
        Self {
            start,
            end: end.max(start),
        }
    }
}

impl Default for TimeSpan {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
