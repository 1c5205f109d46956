use std::f64::consts::TAU;

/// Oscillator shape of a voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    /// Pure sine.
    Sine,
    /// Band-limited sawtooth.
    Saw,
    /// Triangle.
    Triangle,
    /// Band-limited square.
    Square,
}

/// Static description of one tone generator: a base pitch plus a slow vibrato.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voice {
    /// Base pitch in Hz.
    pub base_frequency: f32,
    /// Oscillator shape.
    pub waveform: Waveform,
    /// Vibrato rate in Hz.
    pub modulation_rate: f32,
    /// Vibrato depth in Hz.
    pub modulation_depth: f32,
}

impl From<&crate::config::VoiceConfig> for Voice {
    fn from(cfg: &crate::config::VoiceConfig) -> Self {
        Self {
            base_frequency: cfg.frequency,
            waveform: cfg.waveform,
            modulation_rate: cfg.modulation_rate,
            modulation_depth: cfg.modulation_depth,
        }
    }
}

/// Running oscillator for a [`Voice`]. Phases are normalized to `[0, 1)`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Oscillator {
    voice: Voice,
    phase: f64,
    lfo_phase: f64,
}

impl Oscillator {
    pub(crate) fn new(voice: Voice) -> Self {
        Self {
            voice,
            phase: 0.0,
            lfo_phase: 0.0,
        }
    }

    pub(crate) fn voice(&self) -> &Voice {
        &self.voice
    }

    /// Instantaneous pitch including vibrato, never below 1 Hz.
    pub(crate) fn frequency(&self) -> f64 {
        let v = &self.voice;
        let vibrato = f64::from(v.modulation_depth) * (TAU * self.lfo_phase).sin();
        (f64::from(v.base_frequency) + vibrato).max(1.0)
    }

    /// Produce one sample in `[-1, 1]` and advance both phases.
    pub(crate) fn next_sample(&mut self, sample_rate: f64) -> f32 {
        let dt = (self.frequency() / sample_rate).min(0.5);
        let p = self.phase;
        let s = match self.voice.waveform {
            Waveform::Sine => (TAU * p).sin(),
            Waveform::Saw => (2.0 * p - 1.0) - poly_blep(p, dt),
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Waveform::Square => {
                let naive = if p < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(p, dt) - poly_blep((p + 0.5).fract(), dt)
            }
        };

        self.phase = (self.phase + dt).fract();
        self.lfo_phase =
            (self.lfo_phase + f64::from(self.voice.modulation_rate) / sample_rate).fract();
        s.clamp(-1.0, 1.0) as f32
    }
}

// Two-sample polynomial correction around a phase discontinuity.
fn poly_blep(p: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }
    if p < dt {
        let t = p / dt;
        t + t - t * t - 1.0
    } else if p > 1.0 - dt {
        let t = (p - 1.0) / dt;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/score/voice.rs"]
mod tests;
