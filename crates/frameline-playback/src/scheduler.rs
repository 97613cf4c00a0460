//! Play/pause/stop state machine and the dedicated timing thread.
//!
//! The timing thread holds the target frame rate under unpredictable
//! render latency: it waits out each tick deadline in three precision
//! tiers (sleep, yield, spin), advances the play head with bounded
//! catch-up when a render stalled, and issues at most one render request
//! at a time. All model mutation happens via [`ModelHandle::invoke`].

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use frameline_audio::SharedRingBuffer;
use frameline_core::{ticks_since, FrameRate, TICKS_PER_MILLI};
use frameline_timeline::{EventHub, InvalidatedRegion};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::model::ModelHandle;

/// Playback state of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stop,
    Pause,
    Play,
}

/// Events fired by the scheduler on state transitions.
///
/// `position` is the play-head position at the moment of transition: the
/// starting position for Play, the frozen position for Pause, and the
/// parked (stop-head) position for Stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    StateChanged { state: PlayState, position: i64 },
}

type StopCallback = Box<dyn FnOnce() + Send>;

/// State shared between the control API and the timing thread.
struct Shared {
    timer_running: AtomicBool,
    /// Play flag read by the timing thread each tick.
    is_playing: AtomicBool,
    interval_ticks: AtomicI64,
    samples_per_frame: AtomicUsize,
    max_catchup_frames: AtomicI64,
    play_state: Mutex<PlayState>,
    /// One-shot callback run by the timing thread once it observes a stop.
    stop_callback: Mutex<Option<StopCallback>>,
    events: Mutex<EventHub<PlaybackEvent>>,
    /// Recent tick-to-tick intervals, for reporting the achieved rate.
    intervals: Mutex<MovingAverage>,
}

impl Shared {
    fn emit(&self, event: PlaybackEvent) {
        self.events.lock().emit(event);
    }

    /// Ask the timing thread to stop ticking, optionally installing the
    /// deferred stop callback it runs when it observes the flag.
    fn request_stop(&self, callback: Option<StopCallback>) {
        if let Some(callback) = callback {
            *self.stop_callback.lock() = Some(callback);
        }
        self.is_playing.store(false, Ordering::Release);
    }

    fn run_stop_callback(&self) {
        let callback = self.stop_callback.lock().take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// The playback scheduler: owns the play state machine and the timing
/// thread, and drives the model thread one tick at a time.
///
/// Constructed with explicit handles to its collaborators (model thread,
/// shared audio buffer) rather than reaching through any ambient state.
pub struct PlaybackScheduler {
    shared: Arc<Shared>,
    model: ModelHandle,
    audio: SharedRingBuffer,
    config: SchedulerConfig,
    timer: Option<JoinHandle<()>>,
}

impl PlaybackScheduler {
    /// Create the scheduler and start its timing thread. The thread runs
    /// (mostly idle) for the scheduler's whole lifetime, independent of
    /// play state.
    pub fn new(model: ModelHandle, audio: SharedRingBuffer, config: SchedulerConfig) -> Self {
        let shared = Arc::new(Shared {
            timer_running: AtomicBool::new(true),
            is_playing: AtomicBool::new(false),
            interval_ticks: AtomicI64::new(config.frame_rate.interval_ticks()),
            samples_per_frame: AtomicUsize::new(config.samples_per_frame()),
            max_catchup_frames: AtomicI64::new(config.max_catchup_frames),
            play_state: Mutex::new(PlayState::Stop),
            stop_callback: Mutex::new(None),
            events: Mutex::new(EventHub::new()),
            intervals: Mutex::new(MovingAverage::new(5)),
        });

        let timer = {
            let shared = Arc::clone(&shared);
            let model = model.clone();
            let audio = Arc::clone(&audio);
            let config = config.clone();
            std::thread::Builder::new()
                .name("frameline-playback".into())
                .spawn(move || timer_main(shared, model, audio, config))
                .expect("failed to spawn playback timing thread")
        };

        info!(rate = %config.frame_rate, "playback scheduler started");
        Self {
            shared,
            model,
            audio,
            config,
            timer: Some(timer),
        }
    }

    /// Current playback state.
    pub fn play_state(&self) -> PlayState {
        *self.shared.play_state.lock()
    }

    /// Subscribe to scheduler events.
    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        self.shared.events.lock().subscribe()
    }

    /// Average tick-to-tick interval over the last few ticks, in
    /// milliseconds. Diagnostic for the achieved playback rate.
    pub fn average_interval_millis(&self) -> f64 {
        self.shared.intervals.lock().average() / TICKS_PER_MILLI as f64
    }

    /// Change the target frame rate. Converted once into the integer tick
    /// interval used by the timing thread; takes effect on the next tick.
    pub fn set_frame_rate(&mut self, rate: FrameRate) {
        self.config.frame_rate = rate;
        self.shared
            .interval_ticks
            .store(rate.interval_ticks(), Ordering::Relaxed);
        self.shared
            .samples_per_frame
            .store(self.config.samples_per_frame(), Ordering::Relaxed);
        debug!(rate = %rate, "frame rate changed");
    }

    /// Begin playback from the current play head. No-op when already
    /// playing or when the model is gone.
    pub fn play(&self) {
        if self.play_state() == PlayState::Play {
            return;
        }
        let Some(head) = self.model.invoke(|state| state.timeline.play_head()) else {
            return;
        };
        self.play_internal(head);
    }

    /// Begin playback from `tick`. No-op when already playing at that
    /// exact position.
    pub fn play_at(&self, tick: i64) {
        if self.play_state() == PlayState::Play
            && self.model.invoke(|state| state.timeline.play_head()) == Some(tick)
        {
            return;
        }
        if self
            .model
            .invoke(move |state| state.timeline.set_play_head(tick))
            .is_none()
        {
            return;
        }
        self.play_internal(tick);
    }

    fn play_internal(&self, position: i64) {
        *self.shared.play_state.lock() = PlayState::Play;
        self.shared.is_playing.store(true, Ordering::Release);
        self.shared.emit(PlaybackEvent::StateChanged {
            state: PlayState::Play,
            position,
        });
        debug!(position, "playback started");
    }

    /// Freeze playback at the current play head. No-op unless playing.
    pub fn pause(&self) {
        pause_impl(&self.shared, &self.model, &self.audio);
    }

    /// Stop playback and park the play head back at the stop head. No-op
    /// unless playing.
    pub fn stop(&self) {
        {
            let mut state = self.shared.play_state.lock();
            if *state != PlayState::Play {
                return;
            }
            *state = PlayState::Stop;
        }

        // Deferred render invalidation: runs once the timing thread has
        // observed the stop, so it cannot race an in-progress tick.
        let model = self.model.clone();
        self.shared.request_stop(Some(Box::new(move || {
            model.invoke(|state| {
                state
                    .timeline
                    .invalidate_render(InvalidatedRegion::Everything);
            });
        })));
        self.audio.lock().clear();

        let position = self
            .model
            .invoke(|state| {
                let stop_head = state.timeline.stop_head();
                state.timeline.set_play_head(stop_head);
                stop_head
            })
            .unwrap_or(0);
        self.shared.emit(PlaybackEvent::StateChanged {
            state: PlayState::Stop,
            position,
        });
        debug!(position, "playback stopped");
    }

    /// Shut the timing thread down. In-flight renders complete normally
    /// and their results are discarded.
    pub fn shutdown(&mut self) {
        self.stop();
        self.shared.timer_running.store(false, Ordering::Release);
        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Pause shared by the control API and the timing thread's
/// render-failure path. Returns whether a transition happened.
fn pause_impl(shared: &Arc<Shared>, model: &ModelHandle, audio: &SharedRingBuffer) -> bool {
    {
        let mut state = shared.play_state.lock();
        if *state != PlayState::Play {
            return false;
        }
        *state = PlayState::Pause;
    }
    shared.request_stop(None);
    audio.lock().clear();

    let position = model
        .invoke(|state| {
            let head = state.timeline.play_head();
            state.timeline.set_stop_head(head);
            head
        })
        .unwrap_or(0);
    shared.emit(PlaybackEvent::StateChanged {
        state: PlayState::Pause,
        position,
    });
    debug!(position, "playback paused");
    true
}

// ── Timing thread ───────────────────────────────────────────────────

/// Per-run bookkeeping local to the timing thread.
struct TickClock {
    last_advance: Instant,
    debt: f64,
}

fn timer_main(
    shared: Arc<Shared>,
    model: ModelHandle,
    audio: SharedRingBuffer,
    config: SchedulerConfig,
) {
    let epoch = Instant::now();
    let mut next_tick_time = 0i64;
    let mut last_tick = 0i64;
    let mut clock = TickClock {
        last_advance: Instant::now(),
        debt: 0.0,
    };

    while shared.timer_running.load(Ordering::Acquire) {
        if !shared.is_playing.load(Ordering::Acquire) {
            // Run the stop callback once, then idle-poll coarsely; a
            // 50 ms reaction to the play button is imperceptible.
            shared.run_stop_callback();
            loop {
                if !shared.timer_running.load(Ordering::Acquire) {
                    return;
                }
                if shared.is_playing.load(Ordering::Acquire) {
                    break;
                }
                std::thread::sleep(config.idle_poll);
            }
            // Playback just started: reset the clock bookkeeping so the
            // idle time is not counted as a stall.
            clock.debt = 0.0;
            clock.last_advance = Instant::now();
            last_tick = ticks_since(epoch);
            next_tick_time = last_tick;
        }

        // Three precision tiers: coarse sleep far out, yield close in,
        // spin for the final sub-millisecond approach.
        let target = next_tick_time;
        while target - ticks_since(epoch) > config.sleep_splice_ticks {
            std::thread::sleep(Duration::from_millis(1));
        }
        while target - ticks_since(epoch) > config.yield_window_ticks {
            std::thread::yield_now();
        }
        while ticks_since(epoch) < target {
            std::hint::spin_loop();
        }

        next_tick_time = ticks_since(epoch) + shared.interval_ticks.load(Ordering::Relaxed);
        run_tick(&shared, &model, &audio, &mut clock);

        let now = ticks_since(epoch);
        shared.intervals.lock().push((now - last_tick) as f64);
        last_tick = now;
    }
}

enum TickOutcome {
    NotPlaying,
    Advanced,
    RenderFailed(String),
}

fn run_tick(
    shared: &Arc<Shared>,
    model: &ModelHandle,
    audio: &SharedRingBuffer,
    clock: &mut TickClock,
) {
    if !shared.is_playing.load(Ordering::Acquire) || !shared.timer_running.load(Ordering::Acquire) {
        shared.run_stop_callback();
        return;
    }

    // Catch-up is computed on the timing thread: if the previous tick's
    // work stalled, the play head advances by more than one frame, with
    // the fractional remainder carried so truncation cannot drift.
    let interval = shared.interval_ticks.load(Ordering::Relaxed);
    let expected = interval as f64;
    let actual = duration_ticks(clock.last_advance.elapsed()) as f64;
    clock.last_advance = Instant::now();
    let max_catchup = shared.max_catchup_frames.load(Ordering::Relaxed);
    let (advance, debt) = catch_up_advance(actual, expected, clock.debt, max_catchup);
    clock.debt = debt;
    // The timeline runs on the tick clock, not the frame counter.
    let advance_ticks = advance * interval;

    let samples_per_frame = shared.samples_per_frame.load(Ordering::Relaxed);
    let tick_shared = Arc::clone(shared);
    let tick_audio = Arc::clone(audio);

    let outcome = model.invoke(move |state| {
        if !tick_shared.is_playing.load(Ordering::Acquire) {
            return TickOutcome::NotPlaying;
        }

        if let Some(message) = state.take_failed_render() {
            return TickOutcome::RenderFailed(message);
        }

        let mut timeline = state.timeline.suspend_render_invalidation();
        let old_head = timeline.play_head();
        let unwrapped = old_head + advance_ticks;
        let new_head = match timeline.active_loop() {
            Some(region) if region.contains(old_head) || region.contains(unwrapped) => {
                wrap_position(unwrapped, region.start(), region.last_tick())
            }
            _ => wrap_position(unwrapped, 0, (timeline.max_duration() - 1).max(0)),
        };
        timeline.set_play_head(new_head);
        drop(timeline);

        if advance > 1 {
            // Frames were skipped; the matching tail of buffered audio is
            // stale and would play late.
            let stale = (advance - 1) as usize * samples_per_frame;
            tick_audio.lock().offset_write(stale);
        }

        state.request_render(new_head);
        TickOutcome::Advanced
    });

    match outcome {
        None => {
            warn!("model thread gone, parking playback");
            shared.request_stop(None);
            shared.run_stop_callback();
        }
        Some(TickOutcome::NotPlaying) => shared.run_stop_callback(),
        Some(TickOutcome::RenderFailed(message)) => {
            error!(%message, "render failed during playback, pausing");
            pause_impl(shared, model, audio);
        }
        Some(TickOutcome::Advanced) => {}
    }
}

#[inline]
fn duration_ticks(duration: Duration) -> i64 {
    (duration.as_nanos() / 100) as i64
}

// ── Timing policies ─────────────────────────────────────────────────

/// Frames to advance this tick given the measured and expected tick
/// intervals (in ticks) and the accumulated sub-frame debt. Returns the
/// advance and the new debt.
///
/// The advance is clamped to `max_frames`: unbounded skipping forces
/// decoder reseeks that stall the render further, feeding back into more
/// skipping.
pub fn catch_up_advance(
    actual_ticks: f64,
    expected_ticks: f64,
    debt: f64,
    max_frames: i64,
) -> (i64, f64) {
    let mut advance = 1i64;
    let mut new_debt = debt;
    if actual_ticks > expected_ticks && expected_ticks > 0.0 {
        let extra_frames = (actual_ticks - expected_ticks) / expected_ticks + debt;
        let whole = extra_frames.floor();
        new_debt = extra_frames - whole;
        advance += whole as i64;
    }
    (advance.min(max_frames.max(1)), new_debt)
}

/// Wrap `value` into the inclusive range `[min, max]`, modulo the range
/// length. Values below the range wrap from the top.
pub fn wrap_position(value: i64, min: i64, max: i64) -> i64 {
    debug_assert!(max >= min);
    let range = max - min + 1;
    min + (value - min).rem_euclid(range)
}

/// Fixed-window moving average for interval diagnostics.
#[derive(Debug)]
pub struct MovingAverage {
    samples: Vec<f64>,
    next: usize,
    filled: usize,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "moving average window must be at least 1");
        Self {
            samples: vec![0.0; window],
            next: 0,
            filled: 0,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.samples[self.next] = value;
        self.next = (self.next + 1) % self.samples.len();
        self.filled = (self.filled + 1).min(self.samples.len());
    }

    /// Average over the window (0.0 before the first sample).
    pub fn average(&self) -> f64 {
        if self.filled == 0 {
            return 0.0;
        }
        self.samples[..self.filled].iter().sum::<f64>() / self.filled as f64
    }
}
