use super::*;
use crate::clock::ManualTimeSource;
use crate::config::ScoreConfig;
use crate::narration::{CaptionEvent, DriverState, NarrationCue};
use crate::score::SharedGraph;
use crate::foundation::error::NightworkError;
use std::sync::atomic::{AtomicUsize, Ordering};

fn quiet_config(cues: Vec<NarrationCue>) -> VignetteConfig {
    VignetteConfig {
        cues,
        score: ScoreConfig {
            sample_rate: 8_000,
            swell_period_seconds: None,
            ..ScoreConfig::default()
        },
        ..VignetteConfig::default()
    }
}

/// Refuses activation until it has been asked `refusals` times.
struct GestureGatedBackend {
    attempts: Arc<AtomicUsize>,
    refusals: usize,
    active: bool,
}

impl AudioBackend for GestureGatedBackend {
    fn name(&self) -> &str {
        "gesture-gated"
    }

    fn activate(&mut self, _graph: SharedGraph) -> NightworkResult<()> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if n < self.refusals {
            return Err(NightworkError::audio("activation requires a user gesture"));
        }
        self.active = true;
        Ok(())
    }

    fn deactivate(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

fn session_with(
    cues: Vec<NarrationCue>,
) -> (PlaybackSession, ManualTimeSource, CaptionLog) {
    let time = ManualTimeSource::new();
    let log = CaptionLog::new();
    let session = PlaybackSession::builder(quiet_config(cues))
        .time_source(Arc::new(time.clone()))
        .caption_sink(Box::new(log.clone()))
        .build()
        .unwrap();
    (session, time, log)
}

#[test]
fn idle_session_produces_no_ticks() {
    let (mut s, _time, _log) = session_with(vec![]);
    assert_eq!(s.state(), SessionState::Idle);
    assert!(s.tick().is_none());
    assert!(s.render_tick().is_none());
    assert_eq!(s.elapsed(), 0.0);
}

#[test]
fn double_start_and_double_stop_are_noops() {
    let (mut s, time, _log) = session_with(vec![]);
    time.set(10.0);
    assert!(s.start());
    time.set(12.0);
    assert!(!s.start());
    assert_eq!(s.start_instant(), Some(10.0));
    assert!(s.stop());
    assert!(!s.stop());
    assert_eq!(s.start_instant(), None);
}

#[test]
fn tick_reports_elapsed_from_start_instant() {
    let (mut s, time, _log) = session_with(vec![]);
    time.set(100.0);
    s.start();
    time.set(103.5);
    let out = s.tick().unwrap();
    assert_eq!(out.elapsed, 3.5);
    assert_eq!(out.frame.elapsed, 3.5);
    assert!(out.frame.started);
}

#[test]
fn failed_activation_is_advisory_and_retried_on_next_start() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let backend = GestureGatedBackend {
        attempts: attempts.clone(),
        refusals: 1,
        active: false,
    };
    let time = ManualTimeSource::new();
    let log = CaptionLog::new();
    let mut s = PlaybackSession::builder(quiet_config(vec![NarrationCue::new(0.0, "a")]))
        .time_source(Arc::new(time.clone()))
        .caption_sink(Box::new(log.clone()))
        .audio_backend(Box::new(backend))
        .build()
        .unwrap();

    assert!(s.start());
    assert!(s.score().is_none());
    assert!(
        s.advisories()
            .iter()
            .any(|a| matches!(a, Advisory::AudioDeferred(_)))
    );
    // Playback continues without audio.
    assert!(s.tick().is_some());
    assert_eq!(log.captions(), ["a"]);

    s.stop();
    s.start();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(s.score().map(|e| e.backend_name()), Some("gesture-gated"));
}

#[test]
fn backend_factory_errors_degrade_to_silence() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut s = PlaybackSession::builder(quiet_config(vec![]))
        .time_source(Arc::new(ManualTimeSource::new()))
        .backend_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(NightworkError::audio("no output device"))
        })
        .build()
        .unwrap();
    s.start();
    s.stop();
    s.start();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(s.score().is_none());
    let deferred = s
        .take_advisories()
        .into_iter()
        .filter(|a| matches!(a, Advisory::AudioDeferred(_)))
        .count();
    assert_eq!(deferred, 2);
    assert!(s.advisories().is_empty());
}

#[test]
fn missing_narrator_is_advised_once() {
    let (s, _time, _log) = session_with(vec![]);
    assert_eq!(s.advisories(), [Advisory::NarrationUnavailable]);
}

#[test]
fn score_engine_is_reused_across_cycles() {
    let (mut s, time, _log) = session_with(vec![]);
    s.start();
    let graph = s.score().unwrap().graph();
    s.stop();
    time.advance(1.0);
    s.start();
    assert!(Arc::ptr_eq(&graph, &s.score().unwrap().graph()));
    assert!(s.score().unwrap().is_playing());
}

#[test]
fn intensity_is_remembered_while_idle() {
    let (mut s, _time, _log) = session_with(vec![]);
    s.set_intensity(false);
    s.start();
    assert!(!s.score().unwrap().intensity());
    assert_eq!(s.score().unwrap().master_target(), 0.0);
    s.set_intensity(true);
    assert!(s.score().unwrap().master_target() > 0.0);
}

#[test]
fn resize_follows_container_only_while_running() {
    let (mut s, _time, _log) = session_with(vec![]);
    assert_eq!(s.viewport().canvas, Canvas::widescreen(960));
    assert!(!s.resize(Some(1500.0)));
    assert_eq!(s.viewport().canvas.width, 960);

    s.start();
    assert_eq!(s.viewport().canvas, Canvas::widescreen(1500));
    assert!(s.resize(Some(200.0)));
    assert_eq!(s.viewport().canvas, Canvas::widescreen(640));
    assert!(!s.resize(Some(200.0)));
    assert!(s.resize(None));
    assert_eq!(s.viewport().canvas.width, 960);
}

#[test]
fn stop_cancels_narration_and_fades_score() {
    let (mut s, time, log) = session_with(vec![NarrationCue::new(0.0, "a"), NarrationCue::new(5.0, "b")]);
    s.start();
    s.tick();
    s.stop();
    assert_eq!(s.narration().state(), DriverState::Idle);
    assert!(!s.score().unwrap().is_playing());
    assert_eq!(s.score().unwrap().master_target(), 0.0);

    time.advance(10.0);
    assert!(s.tick().is_none());
    assert_eq!(log.captions(), ["a"]);
    assert_eq!(log.events().last(), Some(&CaptionEvent::Speaking(false)));
}

#[test]
fn preview_frame_has_steady_flicker() {
    let (s, _time, _log) = session_with(vec![]);
    assert!(!s.preview_frame(1.0).started);
    assert_eq!(s.preview_frame(1.0).overlay.opacity, 0.25);
    assert_eq!(s.preview_frame(1.3).overlay.opacity, 0.25);
}

#[test]
fn preview_frame_uses_container_width_recorded_while_idle() {
    let (mut s, _time, _log) = session_with(vec![]);
    assert!(!s.resize(Some(1024.0)));
    let frame = s.preview_frame(0.0);
    assert_eq!(frame.viewport.canvas, Canvas::widescreen(1024));
    assert_eq!(frame.viewport.canvas.height, 576);
}

#[test]
fn teardown_is_idempotent() {
    let (mut s, _time, _log) = session_with(vec![]);
    s.start();
    s.teardown();
    assert!(s.score().is_none());
    assert_eq!(s.state(), SessionState::Idle);
    s.teardown();
}

#[test]
fn invalid_config_is_rejected_at_build() {
    let mut cfg = quiet_config(vec![]);
    cfg.scene.max_dpr = 0.5;
    assert!(PlaybackSession::builder(cfg).build().is_err());
}
