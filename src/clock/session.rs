/// The session's single time origin.
///
/// All subscribers compute time relative to the start instant held here, so audio, captions and
/// visuals cannot drift apart.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionClock {
    start_instant: Option<f64>,
}

impl SessionClock {
    /// Create a stopped clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Establish `now` as `t = 0` unless already running.
    ///
    /// Returns `true` when a new start instant was established. A second start while running is a
    /// no-op and keeps the original origin.
    pub fn start(&mut self, now: f64) -> bool {
        if self.start_instant.is_some() {
            return false;
        }
        self.start_instant = Some(if now.is_finite() { now } else { 0.0 });
        true
    }

    /// Clear running state. Safe to call when already stopped.
    pub fn stop(&mut self) {
        self.start_instant = None;
    }

    /// Return `true` while a start instant is set.
    pub fn is_running(&self) -> bool {
        self.start_instant.is_some()
    }

    /// The start instant of the current running period, if any.
    pub fn start_instant(&self) -> Option<f64> {
        self.start_instant
    }

    /// Seconds since the start instant; `0.0` when stopped. Never negative, never NaN.
    pub fn elapsed(&self, now: f64) -> f64 {
        match self.start_instant {
            Some(start) => {
                let dt = now - start;
                if dt.is_finite() { dt.max(0.0) } else { 0.0 }
            }
            None => 0.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clock/session.rs"]
mod tests;
