use crate::narration::cue::CueList;
use crate::narration::narrator::Narrator;
use crate::narration::sink::CaptionSink;

/// Driver lifecycle.
///
/// ```text
/// Idle --attach--> Advancing --last cue fired--> Drained
///  ^                   |                            |
///  +------detach-------+------------detach----------+
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Advancing,
    Drained,
}

/// Position in the cue list. Only moves forward while attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NarrationCursor {
    /// Index of the next cue to fire.
    pub next_index: usize,
    /// Cues fired since the last attach.
    pub fired_count: usize,
}

/// Fires narration cues against elapsed session time.
///
/// The driver has no clock of its own: the owner calls [`NarrationDriver::on_tick`] with the
/// elapsed time of each frame. Every cue whose offset has been reached fires exactly once and in
/// list order, no matter how far a single tick jumps.
pub struct NarrationDriver {
    cues: CueList,
    clear_delay_seconds: f64,
    sink: Box<dyn CaptionSink>,
    narrator: Option<Box<dyn Narrator>>,
    state: DriverState,
    cursor: NarrationCursor,
    clear_at: Option<f64>,
    completed: bool,
    speaking: bool,
}

impl NarrationDriver {
    pub fn new(
        cues: CueList,
        clear_delay_seconds: f64,
        sink: Box<dyn CaptionSink>,
        narrator: Option<Box<dyn Narrator>>,
    ) -> Self {
        let clear_delay_seconds = if clear_delay_seconds.is_finite() {
            clear_delay_seconds.max(0.0)
        } else {
            0.0
        };
        Self {
            cues,
            clear_delay_seconds,
            sink,
            narrator,
            state: DriverState::Idle,
            cursor: NarrationCursor::default(),
            clear_at: None,
            completed: false,
            speaking: false,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn cursor(&self) -> NarrationCursor {
        self.cursor
    }

    pub fn cues(&self) -> &CueList {
        &self.cues
    }

    /// Elapsed time at which the caption will be cleared, once drained.
    pub fn pending_clear_at(&self) -> Option<f64> {
        self.clear_at
    }

    /// Last speaking status reported to the sink.
    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn has_narrator(&self) -> bool {
        self.narrator.is_some()
    }

    /// Install or remove the narrator. A narrator being replaced is cancelled first.
    pub fn set_narrator(&mut self, narrator: Option<Box<dyn Narrator>>) {
        if let Some(old) = self.narrator.as_mut() {
            old.cancel();
        }
        self.narrator = narrator;
    }

    /// Begin a run from the first cue. Returns `false` if already attached.
    pub fn attach(&mut self) -> bool {
        if self.state != DriverState::Idle {
            return false;
        }
        self.cursor = NarrationCursor::default();
        self.clear_at = None;
        self.completed = false;
        self.state = DriverState::Advancing;
        self.set_speaking(true);
        tracing::debug!(cues = self.cues.len(), "narration attached");
        true
    }

    /// Advance to `elapsed` seconds since the session start.
    ///
    /// Returns the number of cues fired by this tick. Ticks while idle, and ticks with a
    /// non-finite elapsed time, do nothing.
    pub fn on_tick(&mut self, elapsed: f64) -> usize {
        if self.state == DriverState::Idle || !elapsed.is_finite() {
            return 0;
        }

        let mut fired = 0;
        if self.state == DriverState::Advancing {
            while let Some(cue) = self.cues.get(self.cursor.next_index)
                && cue.offset_seconds <= elapsed
            {
                let index = self.cursor.next_index;
                let text = cue.text.clone();
                tracing::debug!(index, offset = cue.offset_seconds, elapsed, "cue fired");
                self.sink.on_caption(&text);
                if let Some(narrator) = self.narrator.as_mut()
                    && let Err(err) = narrator.speak(&text)
                {
                    tracing::warn!(%err, narrator = narrator.name(), "narrator failed to speak");
                }
                self.cursor.next_index += 1;
                self.cursor.fired_count += 1;
                fired += 1;
            }
            if self.cursor.next_index >= self.cues.len() {
                self.drain(elapsed);
            }
        }

        if let Some(at) = self.clear_at
            && elapsed >= at
        {
            self.clear_at = None;
            self.sink.on_caption("");
            tracing::debug!(elapsed, "caption cleared");
        }
        fired
    }

    /// Stop the current utterance without touching caption timing.
    pub fn silence(&mut self) {
        if let Some(narrator) = self.narrator.as_mut() {
            narrator.cancel();
        }
        self.set_speaking(false);
    }

    /// Cancel speech and any pending clear, and return to idle.
    ///
    /// Returns `false` (and does nothing) if not attached.
    pub fn detach(&mut self) -> bool {
        if self.state == DriverState::Idle {
            return false;
        }
        if let Some(narrator) = self.narrator.as_mut() {
            narrator.cancel();
        }
        self.clear_at = None;
        self.set_speaking(false);
        self.state = DriverState::Idle;
        tracing::debug!(fired = self.cursor.fired_count, "narration detached");
        true
    }

    fn drain(&mut self, elapsed: f64) {
        self.state = DriverState::Drained;
        self.clear_at = Some(elapsed + self.clear_delay_seconds);
        if !self.completed {
            self.completed = true;
            self.sink.on_narration_complete();
            tracing::info!(fired = self.cursor.fired_count, "narration complete");
        }
        self.set_speaking(false);
    }

    fn set_speaking(&mut self, speaking: bool) {
        if self.speaking != speaking {
            self.speaking = speaking;
            self.sink.on_speaking_changed(speaking);
        }
    }
}

impl Drop for NarrationDriver {
    fn drop(&mut self) {
        if let Some(narrator) = self.narrator.as_mut() {
            narrator.cancel();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/driver.rs"]
mod tests;
