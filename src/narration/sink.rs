use std::sync::{Arc, Mutex};

/// Receives caption and narration status updates from the driver.
pub trait CaptionSink: Send {
    /// Show `text`; an empty string clears the caption.
    fn on_caption(&mut self, text: &str);

    fn on_speaking_changed(&mut self, _speaking: bool) {}

    /// Called once per attach, when the last cue has fired.
    fn on_narration_complete(&mut self) {}
}

/// One update delivered to a [`CaptionLog`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptionEvent {
    Caption(String),
    Speaking(bool),
    Complete,
}

/// A cloneable sink that records every update; clones share one log.
#[derive(Clone, Debug, Default)]
pub struct CaptionLog {
    events: Arc<Mutex<Vec<CaptionEvent>>>,
}

impl CaptionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<CaptionEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Non-empty captions shown so far, in order.
    pub fn captions(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CaptionEvent::Caption(t) if !t.is_empty() => Some(t),
                _ => None,
            })
            .collect()
    }

    /// Caption currently on screen (empty when cleared or never set).
    pub fn current_caption(&self) -> String {
        self.events()
            .into_iter()
            .rev()
            .find_map(|e| match e {
                CaptionEvent::Caption(t) => Some(t),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Last reported speaking status.
    pub fn speaking(&self) -> bool {
        self.events()
            .into_iter()
            .rev()
            .find_map(|e| match e {
                CaptionEvent::Speaking(s) => Some(s),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn completions(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, CaptionEvent::Complete))
            .count()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<CaptionEvent> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }

    fn push(&self, event: CaptionEvent) {
        if let Ok(mut e) = self.events.lock() {
            e.push(event);
        }
    }
}

impl CaptionSink for CaptionLog {
    fn on_caption(&mut self, text: &str) {
        self.push(CaptionEvent::Caption(text.to_owned()));
    }

    fn on_speaking_changed(&mut self, speaking: bool) {
        self.push(CaptionEvent::Speaking(speaking));
    }

    fn on_narration_complete(&mut self) {
        self.push(CaptionEvent::Complete);
    }
}
