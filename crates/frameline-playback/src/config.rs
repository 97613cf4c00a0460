//! Scheduler tunables.

use std::time::Duration;

use frameline_core::{FrameRate, TICKS_PER_MILLI};

/// Configuration for a [`PlaybackScheduler`].
///
/// The catch-up cap and wait windows are policies, not constants: the
/// defaults mirror long-standing editor behavior but can be tuned per
/// deployment (e.g. scaling the catch-up cap with frame rate).
///
/// [`PlaybackScheduler`]: crate::scheduler::PlaybackScheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Target playback frame rate.
    pub frame_rate: FrameRate,
    /// Maximum frames the play head may advance in one tick. Catch-up
    /// beyond this is dropped: skipping too many frames forces decoders
    /// to reseek, which stalls the render further and would otherwise
    /// feed back into more skipping.
    pub max_catchup_frames: i64,
    /// Sample rate the render pipeline produces audio at.
    pub audio_sample_rate: u32,
    /// Poll interval of the timing thread while not playing.
    pub idle_poll: Duration,
    /// Distance from the tick deadline above which the timing thread
    /// sleeps in 1 ms slices.
    pub sleep_splice_ticks: i64,
    /// Distance from the tick deadline above which the timing thread
    /// yields; inside this window it spins.
    pub yield_window_ticks: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_rate: FrameRate::default(),
            max_catchup_frames: 3,
            audio_sample_rate: 44_100,
            idle_poll: Duration::from_millis(50),
            // 16.4 ms: one frame at 60 fps, the coarsest OS sleep slice
            // worth trusting.
            sleep_splice_ticks: (16.4 * TICKS_PER_MILLI as f64) as i64,
            // 0.1 ms: below this, yielding risks overshooting the target.
            yield_window_ticks: TICKS_PER_MILLI / 10,
        }
    }
}

impl SchedulerConfig {
    /// Audio samples the pipeline must produce per video frame at this
    /// configuration's rates (stereo-interleaved frames count once).
    pub fn samples_per_frame(&self) -> usize {
        let fps = self.frame_rate.fps_f64();
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 1.0 };
        (self.audio_sample_rate as f64 / fps).ceil() as usize
    }
}
