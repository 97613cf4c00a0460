//! Integration tests for the playback scheduling engine.
//!
//! These drive the real timing and model threads with a fast tick rate
//! (100 fps, 10 ms ticks) and generous sleeps, asserting properties that
//! hold regardless of scheduling jitter.

use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use frameline_audio::AudioRingBuffer;
use frameline_core::{FrameRate, TimeSpan};
use frameline_playback::{
    ModelHandle, ModelState, ModelThread, NoopRenderPipeline, PlayState, PlaybackEvent,
    PlaybackScheduler, RenderCompletion, RenderHandle, RenderOutcome, RenderPipeline,
    SchedulerConfig,
};
use frameline_timeline::{InvalidatedRegion, Timeline, TimelineEvent};
use parking_lot::Mutex;

// ── Helpers ────────────────────────────────────────────────────

const TEST_RATE: FrameRate = FrameRate::new(100, 1);

fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        frame_rate: TEST_RATE,
        ..Default::default()
    }
}

fn interval() -> i64 {
    TEST_RATE.interval_ticks()
}

fn start(pipeline: Box<dyn RenderPipeline>) -> (ModelThread, PlaybackScheduler) {
    let model = ModelThread::spawn(ModelState::new(Timeline::new(), pipeline));
    let audio = Arc::new(Mutex::new(AudioRingBuffer::new(1 << 16)));
    let scheduler = PlaybackScheduler::new(model.handle(), audio, fast_config());
    (model, scheduler)
}

fn play_head(model: &ModelHandle) -> i64 {
    model.invoke(|state| state.timeline.play_head()).unwrap()
}

/// Pipeline that records every request and never completes until told to.
struct StallingPipeline {
    requests: Arc<Mutex<Vec<i64>>>,
    pending: Arc<Mutex<Vec<RenderCompletion>>>,
}

impl RenderPipeline for StallingPipeline {
    fn begin_render(&mut self, head: i64) -> RenderHandle {
        self.requests.lock().push(head);
        let (handle, completion) = RenderHandle::pair();
        self.pending.lock().push(completion);
        handle
    }
}

/// Pipeline whose every render fails immediately.
struct FailingPipeline;

impl RenderPipeline for FailingPipeline {
    fn begin_render(&mut self, _head: i64) -> RenderHandle {
        let (handle, completion) = RenderHandle::pair();
        completion.finish(RenderOutcome::Failed("decoder gave up".into()));
        handle
    }
}

/// Pipeline that records requests and completes them instantly.
struct RecordingPipeline {
    requests: Arc<Mutex<Vec<i64>>>,
}

impl RenderPipeline for RecordingPipeline {
    fn begin_render(&mut self, head: i64) -> RenderHandle {
        self.requests.lock().push(head);
        RenderHandle::completed()
    }
}

// ── State machine ──────────────────────────────────────────────

#[test]
fn scheduler_starts_stopped() {
    let (_model, scheduler) = start(Box::new(NoopRenderPipeline::default()));
    assert_eq!(scheduler.play_state(), PlayState::Stop);
    assert_eq!(scheduler.average_interval_millis(), 0.0);
}

#[test]
fn pause_and_stop_are_no_ops_unless_playing() {
    let (_model, scheduler) = start(Box::new(NoopRenderPipeline::default()));
    let events = scheduler.subscribe();

    scheduler.pause();
    scheduler.stop();
    assert_eq!(scheduler.play_state(), PlayState::Stop);
    assert!(events.try_recv().is_err());
}

#[test]
fn transition_events_carry_positions() {
    let (model, scheduler) = start(Box::new(NoopRenderPipeline::default()));
    let handle = model.handle();
    let events = scheduler.subscribe();

    scheduler.play();
    assert_eq!(scheduler.play_state(), PlayState::Play);
    sleep(Duration::from_millis(120));

    scheduler.pause();
    assert_eq!(scheduler.play_state(), PlayState::Pause);
    let paused_at = play_head(&handle);
    assert!(paused_at > 0);

    scheduler.play();
    scheduler.stop();
    assert_eq!(scheduler.play_state(), PlayState::Stop);

    let received: Vec<_> = events.try_iter().collect();
    assert_eq!(
        received[0],
        PlaybackEvent::StateChanged {
            state: PlayState::Play,
            position: 0,
        }
    );
    assert_eq!(
        received[1],
        PlaybackEvent::StateChanged {
            state: PlayState::Pause,
            position: paused_at,
        }
    );
    assert_eq!(
        received[2],
        PlaybackEvent::StateChanged {
            state: PlayState::Play,
            position: paused_at,
        }
    );
    // Stop parks back at the stop head, which pause set to the frozen
    // position.
    assert_eq!(
        received[3],
        PlaybackEvent::StateChanged {
            state: PlayState::Stop,
            position: paused_at,
        }
    );
    assert_eq!(play_head(&handle), paused_at);
}

#[test]
fn second_play_is_a_no_op() {
    let (_model, scheduler) = start(Box::new(NoopRenderPipeline::default()));
    let events = scheduler.subscribe();

    scheduler.play();
    scheduler.play();
    let received: Vec<_> = events.try_iter().collect();
    assert_eq!(received.len(), 1);
}

// ── Play-head advancement ──────────────────────────────────────

#[test]
fn playback_advances_at_frame_intervals() {
    let (model, scheduler) = start(Box::new(NoopRenderPipeline::default()));
    let handle = model.handle();

    scheduler.play();
    sleep(Duration::from_millis(250));
    scheduler.pause();

    let head = play_head(&handle);
    assert!(head > 0);
    // With instant renders every advance is a whole number of frames.
    assert_eq!(head % interval(), 0);
    // 250 ms at 10 ms ticks, with room for scheduling jitter.
    let frames = head / interval();
    assert!((5..=40).contains(&frames), "advanced {frames} frames");
}

#[test]
fn loop_region_confines_the_play_head() {
    let (model, scheduler) = start(Box::new(NoopRenderPipeline::default()));
    let handle = model.handle();

    let region = TimeSpan::from_duration(1_000_000, 5 * interval()).unwrap();
    handle.invoke(move |state| {
        state.timeline.set_loop_region(Some(region));
        state.timeline.set_loop_enabled(true);
        state.timeline.set_play_head(region.start());
    });

    scheduler.play();
    sleep(Duration::from_millis(300));
    scheduler.pause();

    let head = play_head(&handle);
    assert!(
        region.contains(head),
        "head {head} escaped loop {region}",
    );
}

// ── Render scheduling ──────────────────────────────────────────

#[test]
fn renders_are_single_flight() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let pending = Arc::new(Mutex::new(Vec::new()));
    let pipeline = StallingPipeline {
        requests: Arc::clone(&requests),
        pending: Arc::clone(&pending),
    };
    let (model, scheduler) = start(Box::new(pipeline));
    let handle = model.handle();

    scheduler.play();
    sleep(Duration::from_millis(150));

    // Many ticks elapsed, but the first render never finished: no second
    // request may be issued.
    assert_eq!(requests.lock().len(), 1);
    // The play head is not gated on the render; frames are dropped, not
    // queued.
    assert!(play_head(&handle) > interval());

    // Completing the render lets the next tick issue a new one.
    pending.lock().pop().unwrap().finish(RenderOutcome::Completed);
    sleep(Duration::from_millis(100));
    assert!(requests.lock().len() >= 2);
    scheduler.stop();
}

#[test]
fn render_requests_follow_the_play_head() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let pipeline = RecordingPipeline {
        requests: Arc::clone(&requests),
    };
    let (_model, scheduler) = start(Box::new(pipeline));

    scheduler.play();
    sleep(Duration::from_millis(200));
    scheduler.pause();

    let seen = requests.lock().clone();
    assert!(seen.len() > 2);
    for pair in seen.windows(2) {
        assert!(pair[1] > pair[0], "requests regressed: {pair:?}");
    }
    for head in &seen {
        assert_eq!(head % interval(), 0);
    }
}

#[test]
fn render_failure_pauses_at_the_failed_position() {
    let (model, scheduler) = start(Box::new(FailingPipeline));
    let handle = model.handle();
    let events = scheduler.subscribe();

    scheduler.play();
    sleep(Duration::from_millis(200));

    assert_eq!(scheduler.play_state(), PlayState::Pause);
    // Position is preserved, not reset to the stop head origin.
    let head = play_head(&handle);
    assert!(head > 0);
    let received: Vec<_> = events.try_iter().collect();
    assert!(received
        .iter()
        .any(|e| matches!(e, PlaybackEvent::StateChanged { state: PlayState::Pause, .. })));
}

#[test]
fn stop_defers_a_full_invalidation_to_the_timing_thread() {
    let (model, scheduler) = start(Box::new(NoopRenderPipeline::default()));
    let handle = model.handle();
    let timeline_events = handle.invoke(|state| state.timeline.subscribe()).unwrap();

    scheduler.play();
    sleep(Duration::from_millis(80));
    scheduler.stop();
    // Give the timing thread a poll cycle to observe the stop and run
    // the deferred callback.
    sleep(Duration::from_millis(150));

    let saw_full_invalidation = timeline_events.try_iter().any(|e| {
        matches!(
            e,
            TimelineEvent::RenderInvalidated(InvalidatedRegion::Everything)
        )
    });
    assert!(saw_full_invalidation);
}

// ── Diagnostics ────────────────────────────────────────────────

#[test]
fn average_interval_reflects_the_tick_rate() {
    let (_model, scheduler) = start(Box::new(NoopRenderPipeline::default()));

    scheduler.play();
    sleep(Duration::from_millis(300));
    let average = scheduler.average_interval_millis();
    scheduler.stop();

    // 10 ms target, wide tolerance for loaded CI machines.
    assert!(
        (5.0..30.0).contains(&average),
        "average interval was {average} ms"
    );
}
