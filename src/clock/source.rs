use std::sync::{Arc, Mutex};
use std::time::Instant;

/// A monotonic source of "now", in seconds from an arbitrary origin.
pub trait TimeSource: Send + Sync {
    /// Current instant in seconds. Must never decrease between calls.
    fn now_seconds(&self) -> f64;
}

/// Wall-clock time source backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    /// Create a source whose zero is the moment of construction.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_seconds(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Settable time source. Clones share the same instant.
///
/// Used for deterministic tests and offline rendering where the host decides what "now" is.
#[derive(Clone, Debug, Default)]
pub struct ManualTimeSource {
    now: Arc<Mutex<f64>>,
}

impl ManualTimeSource {
    /// Create a source at `t = 0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to `seconds`. Requests to move backwards are ignored.
    pub fn set(&self, seconds: f64) {
        if let Ok(mut now) = self.now.lock()
            && seconds.is_finite()
            && seconds > *now
        {
            *now = seconds;
        }
    }

    /// Move forward by `seconds` (negative or non-finite deltas are ignored).
    pub fn advance(&self, seconds: f64) {
        if let Ok(mut now) = self.now.lock()
            && seconds.is_finite()
            && seconds > 0.0
        {
            *now += seconds;
        }
    }
}

impl TimeSource for ManualTimeSource {
    fn now_seconds(&self) -> f64 {
        self.now.lock().map(|now| *now).unwrap_or(0.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clock/source.rs"]
mod tests;
