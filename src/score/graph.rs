use crate::config::ScoreConfig;
use crate::score::envelope::GainEnvelope;
use crate::score::voice::{Oscillator, Voice};
use smallvec::SmallVec;
use std::sync::{Arc, Mutex};

/// The audio graph shared between the engine's control side and the backend's render side.
pub type SharedGraph = Arc<Mutex<ScoreGraph>>;

/// Target levels and durations for one "swell" command.
#[derive(Clone, Debug, PartialEq)]
pub struct RampPlan {
    /// Master level while audible.
    pub master_level: f32,
    /// Master ramp duration in seconds.
    pub master_ramp_seconds: f64,
    /// Per-voice levels while audible, in voice order.
    pub voice_levels: SmallVec<[f32; 4]>,
    /// Per-voice ramp duration in seconds.
    pub voice_ramp_seconds: f64,
}

impl From<&ScoreConfig> for RampPlan {
    fn from(cfg: &ScoreConfig) -> Self {
        Self {
            master_level: cfg.master_level,
            master_ramp_seconds: cfg.master_ramp_seconds,
            voice_levels: cfg.voices.iter().map(|v| v.level).collect(),
            voice_ramp_seconds: cfg.voice_ramp_seconds,
        }
    }
}

struct VoiceSlot {
    osc: Oscillator,
    gain: GainEnvelope,
}

/// Sustained-chord synthesis graph.
///
/// voices → per-voice gain → sum → diffusion (dry + one delayed tap) → low-pass → master gain.
/// The delay line is written only from the voice sum, so the diffusion stage has no feedback
/// path and stays bounded.
pub struct ScoreGraph {
    sample_rate: u32,
    samples_rendered: u64,
    voices: SmallVec<[VoiceSlot; 4]>,
    diffusion: DelayTap,
    lowpass: Biquad,
    master: GainEnvelope,
}

impl ScoreGraph {
    /// Build a silent graph from `cfg`. All gains start at 0.
    pub fn new(cfg: &ScoreConfig) -> Self {
        let sr = f64::from(cfg.sample_rate);
        Self {
            sample_rate: cfg.sample_rate,
            samples_rendered: 0,
            voices: cfg
                .voices
                .iter()
                .map(|v| VoiceSlot {
                    osc: Oscillator::new(Voice::from(v)),
                    gain: GainEnvelope::new(0.0),
                })
                .collect(),
            diffusion: DelayTap::new((cfg.delay_seconds * sr).round() as usize, cfg.delay_wet),
            lowpass: Biquad::lowpass(
                sr,
                f64::from(cfg.lowpass_hz),
                f64::from(cfg.lowpass_resonance_db),
            ),
            master: GainEnvelope::new(0.0),
        }
    }

    /// Wrap into a [`SharedGraph`].
    pub fn shared(self) -> SharedGraph {
        Arc::new(Mutex::new(self))
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Audio clock: seconds of audio rendered so far.
    pub fn now(&self) -> f64 {
        self.samples_rendered as f64 / f64::from(self.sample_rate)
    }

    /// Static voice descriptions in order.
    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter().map(|s| s.osc.voice())
    }

    /// Master gain at the current audio time.
    pub fn master_level(&self) -> f32 {
        self.master.level_at(self.now())
    }

    /// The master envelope.
    pub fn master_envelope(&self) -> &GainEnvelope {
        &self.master
    }

    /// Per-voice gains at the current audio time.
    pub fn voice_levels(&self) -> SmallVec<[f32; 4]> {
        let now = self.now();
        self.voices.iter().map(|s| s.gain.level_at(now)).collect()
    }

    /// Steer master and every voice toward `plan`'s levels (`audible`) or toward 0.
    ///
    /// Envelopes already heading to the requested level keep their ramp, so re-issuing the same
    /// swell is a hold rather than a restart.
    pub fn swell(&mut self, plan: &RampPlan, audible: bool) {
        let now = self.now();
        for (i, slot) in self.voices.iter_mut().enumerate() {
            let level = plan.voice_levels.get(i).copied().unwrap_or(0.0);
            let target = if audible { level } else { 0.0 };
            slot.gain.steer_to(target, now, plan.voice_ramp_seconds);
        }
        self.ramp_master(if audible { plan.master_level } else { 0.0 }, plan.master_ramp_seconds);
    }

    /// Steer only the master gain.
    pub fn ramp_master(&mut self, target: f32, duration: f64) {
        let now = self.now();
        self.master.steer_to(target, now, duration);
    }

    /// Render interleaved frames into `out`; every channel carries the same signal.
    ///
    /// A trailing partial frame is left zeroed.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let sr = f64::from(self.sample_rate);
        for frame in out.chunks_mut(channels) {
            if frame.len() < channels {
                frame.fill(0.0);
                break;
            }
            let t = self.now();
            let mut sum = 0.0f32;
            for slot in &mut self.voices {
                let s = slot.osc.next_sample(sr);
                sum += s * slot.gain.level_at(t);
            }
            let diffused = self.diffusion.process(sum);
            let filtered = self.lowpass.process(diffused);
            let v = (filtered * self.master.level_at(t)).clamp(-1.0, 1.0);
            frame.fill(v);
            self.samples_rendered += 1;
        }
    }

    /// Render `frames` interleaved frames into a fresh buffer.
    pub fn render_frames(&mut self, frames: usize, channels: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; frames * channels.max(1)];
        self.render(&mut out, channels);
        out
    }
}

/// Single-tap delay: `y = x + wet * x[n - delay]`. No feedback.
struct DelayTap {
    buf: Vec<f32>,
    pos: usize,
    wet: f32,
}

impl DelayTap {
    fn new(delay_samples: usize, wet: f32) -> Self {
        Self {
            buf: vec![0.0; delay_samples],
            pos: 0,
            wet,
        }
    }

    fn process(&mut self, x: f32) -> f32 {
        if self.buf.is_empty() {
            return x * (1.0 + self.wet);
        }
        let delayed = self.buf[self.pos];
        self.buf[self.pos] = x;
        self.pos = (self.pos + 1) % self.buf.len();
        x + self.wet * delayed
    }
}

/// RBJ cookbook biquad in transposed direct form II.
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Biquad {
    // Resonance is given in dB the way browser audio graphs specify it.
    fn lowpass(sample_rate: f64, cutoff_hz: f64, resonance_db: f64) -> Self {
        let q = 10f64.powf(resonance_db / 20.0).max(1e-3);
        let w0 = std::f64::consts::TAU * (cutoff_hz / sample_rate).clamp(1e-5, 0.49);
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: ((1.0 - cos_w0) / 2.0) / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: ((1.0 - cos_w0) / 2.0) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    fn process(&mut self, x: f32) -> f32 {
        let x = f64::from(x);
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y as f32
    }
}

#[cfg(test)]
#[path = "../../tests/unit/score/graph.rs"]
mod tests;
