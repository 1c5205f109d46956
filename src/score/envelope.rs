/// A gain level that moves linearly toward a target over a bounded ramp.
///
/// Times are in the owning graph's audio clock (seconds of rendered audio). A new ramp cancels the
/// one in progress and re-anchors at the instantaneous level, so the level never jumps. Once a
/// ramp ends the level holds at its target indefinitely.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GainEnvelope {
    anchor_level: f32,
    anchor_time: f64,
    target_level: f32,
    ramp_end: f64,
}

impl GainEnvelope {
    /// A settled envelope at `level` (clamped to `[0, 1]`).
    pub fn new(level: f32) -> Self {
        let level = clamp_level(level);
        Self {
            anchor_level: level,
            anchor_time: 0.0,
            target_level: level,
            ramp_end: 0.0,
        }
    }

    /// Level at audio time `t`.
    pub fn level_at(&self, t: f64) -> f32 {
        if t >= self.ramp_end {
            return self.target_level;
        }
        if t <= self.anchor_time {
            return self.anchor_level;
        }
        let span = self.ramp_end - self.anchor_time;
        let frac = ((t - self.anchor_time) / span) as f32;
        self.anchor_level + (self.target_level - self.anchor_level) * frac
    }

    /// Cancel any ramp in progress and ramp from the level at `now` to `target` over `duration`.
    ///
    /// Zero or invalid durations settle on the target at `now`.
    pub fn ramp_to(&mut self, target: f32, now: f64, duration: f64) {
        let current = self.level_at(now);
        self.anchor_level = current;
        self.anchor_time = now;
        self.target_level = clamp_level(target);
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        self.ramp_end = now + duration;
    }

    /// Like [`GainEnvelope::ramp_to`], but leaves a ramp already heading to `target` untouched.
    ///
    /// Returns `true` when a new ramp was scheduled.
    pub fn steer_to(&mut self, target: f32, now: f64, duration: f64) -> bool {
        if clamp_level(target) == self.target_level {
            return false;
        }
        self.ramp_to(target, now, duration);
        true
    }

    /// Level the current (or last) ramp is heading to.
    pub fn target_level(&self) -> f32 {
        self.target_level
    }

    /// Duration of the current (or last) ramp in seconds.
    pub fn ramp_duration_seconds(&self) -> f64 {
        (self.ramp_end - self.anchor_time).max(0.0)
    }

    /// Return `true` while a ramp is still moving at audio time `t`.
    pub fn is_ramping(&self, t: f64) -> bool {
        t < self.ramp_end && self.anchor_level != self.target_level
    }
}

impl Default for GainEnvelope {
    fn default() -> Self {
        Self::new(0.0)
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/score/envelope.rs"]
mod tests;
