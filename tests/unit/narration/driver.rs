use super::*;
use crate::foundation::error::{NightworkError, NightworkResult};
use crate::narration::cue::NarrationCue;
use crate::narration::sink::{CaptionEvent, CaptionLog};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Recorder {
    spoken: Arc<Mutex<Vec<String>>>,
    cancels: Arc<Mutex<usize>>,
    fail: bool,
}

impl Recorder {
    fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    fn cancels(&self) -> usize {
        *self.cancels.lock().unwrap()
    }
}

impl Narrator for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn speak(&mut self, text: &str) -> NightworkResult<()> {
        if self.fail {
            return Err(NightworkError::narration("voice unavailable"));
        }
        self.spoken.lock().unwrap().push(text.to_owned());
        Ok(())
    }

    fn cancel(&mut self) {
        *self.cancels.lock().unwrap() += 1;
    }
}

fn driver(cues: &[(f64, &str)], narrator: Option<Recorder>) -> (NarrationDriver, CaptionLog) {
    let log = CaptionLog::new();
    let list = CueList::new(cues.iter().map(|&(t, s)| NarrationCue::new(t, s)));
    let d = NarrationDriver::new(
        list,
        4.5,
        Box::new(log.clone()),
        narrator.map(|n| Box::new(n) as Box<dyn Narrator>),
    );
    (d, log)
}

#[test]
fn scenario_a_fires_in_order_then_clears_later() {
    let rec = Recorder::default();
    let (mut d, log) = driver(&[(0.0, "a"), (2.0, "b")], Some(rec.clone()));
    assert!(d.attach());

    assert_eq!(d.on_tick(0.0), 1);
    assert_eq!(log.current_caption(), "a");
    assert_eq!(d.on_tick(1.0), 0);
    assert_eq!(d.on_tick(2.0), 1);
    assert_eq!(log.current_caption(), "b");
    assert_eq!(d.state(), DriverState::Drained);
    assert_eq!(d.pending_clear_at(), Some(6.5));

    d.on_tick(3.0);
    d.on_tick(6.4);
    assert_eq!(log.current_caption(), "b");
    d.on_tick(6.5);
    assert_eq!(log.current_caption(), "");
    assert_eq!(d.pending_clear_at(), None);

    assert_eq!(rec.spoken(), ["a", "b"]);
    assert_eq!(log.captions(), ["a", "b"]);
    assert_eq!(log.completions(), 1);
}

#[test]
fn scenario_b_jump_fires_ties_in_order_within_one_tick() {
    let (mut d, log) = driver(&[(5.0, "x"), (5.0, "y")], None);
    d.attach();
    assert_eq!(d.on_tick(6.0), 2);
    assert_eq!(log.captions(), ["x", "y"]);
    assert_eq!(d.cursor().fired_count, 2);
}

#[test]
fn large_jumps_never_skip_or_repeat() {
    let cues: Vec<(f64, String)> = (0..20).map(|i| (i as f64 * 1.5, format!("c{i}"))).collect();
    let refs: Vec<(f64, &str)> = cues.iter().map(|(t, s)| (*t, s.as_str())).collect();
    let (mut d, log) = driver(&refs, None);
    d.attach();

    let mut high = f64::NEG_INFINITY;
    for elapsed in [0.2, 0.1, 7.0, 7.0, 3.0, 19.9, 100.0, 200.0] {
        d.on_tick(elapsed);
        high = high.max(elapsed);
        let next = d.cursor().next_index;
        assert!(d.cues().iter().skip(next).all(|c| c.offset_seconds > high));
    }
    let expected: Vec<String> = cues.iter().map(|(_, s)| s.clone()).collect();
    assert_eq!(log.captions(), expected);
    assert_eq!(log.completions(), 1);
}

#[test]
fn every_reachable_cue_has_fired_after_each_tick() {
    let (mut d, _log) = driver(&[(0.5, "a"), (1.0, "b"), (4.0, "c"), (9.0, "d")], None);
    d.attach();
    for elapsed in [0.0, 0.5, 3.9, 4.0, 8.0, 12.0] {
        d.on_tick(elapsed);
        let unfired_reachable = d
            .cues()
            .iter()
            .skip(d.cursor().next_index)
            .any(|c| c.offset_seconds <= elapsed);
        assert!(!unfired_reachable, "cue left unfired at {elapsed}");
    }
}

#[test]
fn empty_list_drains_on_first_tick() {
    let (mut d, log) = driver(&[], None);
    d.attach();
    assert_eq!(d.on_tick(0.0), 0);
    assert_eq!(d.state(), DriverState::Drained);
    assert_eq!(log.completions(), 1);
    d.on_tick(4.5);
    assert_eq!(log.events().last(), Some(&CaptionEvent::Caption(String::new())));
}

#[test]
fn ticks_while_idle_do_nothing() {
    let (mut d, log) = driver(&[(0.0, "a")], None);
    assert_eq!(d.on_tick(10.0), 0);
    assert!(log.events().is_empty());
    assert_eq!(d.state(), DriverState::Idle);
}

#[test]
fn detach_cancels_speech_and_pending_clear_and_is_idempotent() {
    let rec = Recorder::default();
    let (mut d, log) = driver(&[(0.0, "a")], Some(rec.clone()));
    assert!(!d.detach(), "detach before attach is a no-op");
    assert_eq!(rec.cancels(), 0);

    d.attach();
    d.on_tick(0.0);
    assert!(d.pending_clear_at().is_some());
    assert!(d.detach());
    assert!(!d.detach());
    assert_eq!(rec.cancels(), 1);
    assert_eq!(d.state(), DriverState::Idle);
    assert_eq!(d.pending_clear_at(), None);

    // The cancelled clear never arrives.
    d.on_tick(100.0);
    assert_eq!(log.current_caption(), "a");
}

#[test]
fn reattach_restarts_from_first_cue() {
    let (mut d, log) = driver(&[(0.0, "a"), (1.0, "b"), (2.0, "c")], None);
    d.attach();
    d.on_tick(1.0);
    d.detach();
    assert_eq!(d.cursor().next_index, 2);

    assert!(d.attach());
    assert_eq!(d.cursor(), NarrationCursor::default());
    d.on_tick(0.0);
    assert_eq!(log.captions(), ["a", "b", "a"]);
}

#[test]
fn speaking_status_transitions_are_reported_once() {
    let rec = Recorder::default();
    let (mut d, log) = driver(&[(0.0, "a"), (5.0, "b")], Some(rec.clone()));
    d.attach();
    assert!(d.is_speaking());
    d.on_tick(0.0);
    d.silence();
    d.silence();
    assert!(!d.is_speaking());
    assert_eq!(rec.cancels(), 2);

    // Silencing does not move caption timing.
    d.on_tick(5.0);
    assert_eq!(log.captions(), ["a", "b"]);
    d.detach();

    let speaking: Vec<bool> = log
        .events()
        .into_iter()
        .filter_map(|e| match e {
            CaptionEvent::Speaking(s) => Some(s),
            _ => None,
        })
        .collect();
    assert_eq!(speaking, [true, false]);
}

#[test]
fn narrator_failures_do_not_stop_captions() {
    let rec = Recorder {
        fail: true,
        ..Recorder::default()
    };
    let (mut d, log) = driver(&[(0.0, "a"), (1.0, "b")], Some(rec));
    d.attach();
    d.on_tick(2.0);
    assert_eq!(log.captions(), ["a", "b"]);
    assert_eq!(log.completions(), 1);
}

#[test]
fn completion_is_signalled_once_per_attach() {
    let (mut d, log) = driver(&[(0.0, "a")], None);
    d.attach();
    for t in [0.0, 1.0, 5.0, 9.0] {
        d.on_tick(t);
    }
    assert_eq!(log.completions(), 1);
    d.detach();
    d.attach();
    d.on_tick(0.0);
    assert_eq!(log.completions(), 2);
}

#[test]
fn non_finite_elapsed_is_ignored() {
    let (mut d, log) = driver(&[(0.0, "a")], None);
    d.attach();
    assert_eq!(d.on_tick(f64::NAN), 0);
    assert!(log.captions().is_empty());
}
