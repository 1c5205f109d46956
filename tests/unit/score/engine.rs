use super::*;
use crate::foundation::error::NightworkResult;
use crate::score::backend::OfflineBackend;

fn cfg(swell: Option<f64>) -> ScoreConfig {
    ScoreConfig {
        sample_rate: 8_000,
        swell_period_seconds: swell,
        ..ScoreConfig::default()
    }
}

struct RefusingBackend;

impl AudioBackend for RefusingBackend {
    fn name(&self) -> &str {
        "refusing"
    }

    fn activate(&mut self, _graph: SharedGraph) -> NightworkResult<()> {
        Err(NightworkError::audio("user gesture required"))
    }

    fn deactivate(&mut self) {}

    fn is_active(&self) -> bool {
        false
    }
}

#[test]
fn activation_failure_returns_the_backend() {
    let err = ScoreEngine::activate(&cfg(None), Box::new(RefusingBackend), true)
        .err()
        .unwrap();
    assert!(err.error.to_string().contains("audio error:"));
    assert_eq!(err.backend.name(), "refusing");
}

#[test]
fn intensity_toggle_crossfades() {
    let backend = OfflineBackend::new(1);
    let pull = backend.clone();
    let engine = ScoreEngine::activate(&cfg(None), Box::new(backend), true).unwrap();
    assert_eq!(engine.master_level(), 0.0);
    assert_eq!(engine.master_target(), 0.4);

    pull.pull_seconds(5.0);
    assert!((engine.master_level() - 0.4).abs() < 1e-6);

    engine.set_intensity(false);
    engine.set_intensity(true);
    engine.set_intensity(false);
    assert!((engine.master_level() - 0.4).abs() < 1e-6);
    pull.pull_seconds(1.0);
    let lvl = engine.master_level();
    assert!(lvl > 0.0 && lvl < 0.4);
    for v in engine.voice_levels() {
        assert!((0.0..=1.0).contains(&v));
    }
    pull.pull_seconds(4.0);
    assert_eq!(engine.master_level(), 0.0);
    assert!(engine.voice_levels().iter().all(|v| *v == 0.0));
}

#[test]
fn fade_out_is_gradual_and_resume_swells_back() {
    let backend = OfflineBackend::new(1);
    let pull = backend.clone();
    let engine = ScoreEngine::activate(&cfg(None), Box::new(backend), true).unwrap();
    pull.pull_seconds(5.0);

    engine.fade_out();
    assert!(!engine.is_playing());
    assert!((engine.master_level() - 0.4).abs() < 1e-6);
    assert_eq!(engine.master_target(), 0.0);
    pull.pull_seconds(0.5);
    assert!(engine.master_level() > 0.0);
    pull.pull_seconds(3.0);
    assert_eq!(engine.master_level(), 0.0);

    engine.resume();
    assert_eq!(engine.master_target(), 0.4);
}

#[test]
fn swell_loop_reissues_until_torn_down_once() {
    let backend = OfflineBackend::new(1);
    let handle = backend.clone();
    let mut engine = ScoreEngine::activate(&cfg(Some(0.05)), Box::new(backend), true).unwrap();
    assert!(engine.is_swell_running());

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while engine.swell_reissues() < 2 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(engine.swell_reissues() >= 2);

    assert!(engine.teardown());
    assert!(!engine.teardown());
    assert!(!engine.is_swell_running());
    assert!(!handle.is_active());

    let after = engine.swell_reissues();
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(engine.swell_reissues(), after);
}

#[test]
fn swell_loop_holds_faded_out_state() {
    let backend = OfflineBackend::new(1);
    let engine = ScoreEngine::activate(&cfg(Some(0.05)), Box::new(backend), true).unwrap();
    engine.fade_out();
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(engine.master_target(), 0.0);
}

#[test]
fn oversized_swell_period_falls_back_to_ramp_holds() {
    let backend = OfflineBackend::new(1);
    let handle = backend.clone();
    let mut engine = ScoreEngine::activate(&cfg(Some(1e30)), Box::new(backend), true).unwrap();
    assert!(!engine.is_swell_running());
    assert!(handle.is_active());
    assert!(engine.master_target() > 0.0);
    assert!(engine.teardown());
}
