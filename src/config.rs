//! JSON-facing vignette configuration.
//!
//! Every section is optional in the file; omitted fields take the built-in vignette's values.

use crate::foundation::error::{NightworkError, NightworkResult};
use crate::narration::cue::NarrationCue;
use crate::score::voice::Waveform;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Longest accepted swell loop period.
pub const MAX_SWELL_PERIOD_SECONDS: f64 = 3600.0;

/// Complete configuration for one playback session.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VignetteConfig {
    /// Narration script, in any order; sorted stably by offset when the session is built.
    pub cues: Vec<NarrationCue>,
    /// Generative score parameters.
    pub score: ScoreConfig,
    /// Narration timing and voice parameters.
    pub narration: NarrationConfig,
    /// Scene surface parameters.
    pub scene: SceneConfig,
}

impl Default for VignetteConfig {
    fn default() -> Self {
        Self {
            cues: default_script(),
            score: ScoreConfig::default(),
            narration: NarrationConfig::default(),
            scene: SceneConfig::default(),
        }
    }
}

impl VignetteConfig {
    /// Parse a configuration from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> NightworkResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| NightworkError::serde(format!("parse vignette config JSON: {e}")))
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> NightworkResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            NightworkError::validation(format!("open vignette config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Validate every section.
    pub fn validate(&self) -> NightworkResult<()> {
        for (i, cue) in self.cues.iter().enumerate() {
            if !cue.offset_seconds.is_finite() || cue.offset_seconds < 0.0 {
                return Err(NightworkError::validation(format!(
                    "cues[{i}].offset_seconds must be finite and >= 0"
                )));
            }
        }
        self.score.validate()?;
        self.narration.validate()?;
        self.scene.validate()
    }
}

/// One tone generator in the chord.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceConfig {
    /// Base pitch in Hz.
    pub frequency: f32,
    /// Oscillator shape.
    pub waveform: Waveform,
    /// Vibrato LFO rate in Hz.
    pub modulation_rate: f32,
    /// Vibrato depth in Hz.
    pub modulation_depth: f32,
    /// Gain this voice swells to while intensity is on, in `[0, 1]`.
    pub level: f32,
}

/// Generative score parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Voices of the static chord.
    pub voices: Vec<VoiceConfig>,
    /// Master gain while intensity is on, in `[0, 1]`.
    pub master_level: f32,
    /// Master crossfade duration in seconds.
    pub master_ramp_seconds: f64,
    /// Per-voice crossfade duration in seconds.
    pub voice_ramp_seconds: f64,
    /// Period of the swell loop that re-issues ramps; `None` relies on indefinite holds.
    pub swell_period_seconds: Option<f64>,
    /// Diffusion tap delay in seconds.
    pub delay_seconds: f64,
    /// Diffusion tap gain in `[0, 1]`.
    pub delay_wet: f32,
    /// Low-pass cutoff in Hz.
    pub lowpass_hz: f32,
    /// Low-pass resonance in dB.
    pub lowpass_resonance_db: f32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        // A2, D3, G3, C4: a static open chord.
        let freqs = [110.0, 146.83, 196.0, 261.63];
        let voices = freqs
            .iter()
            .enumerate()
            .map(|(i, &frequency)| VoiceConfig {
                frequency,
                waveform: if i % 2 == 0 {
                    Waveform::Saw
                } else {
                    Waveform::Triangle
                },
                modulation_rate: 0.08 + i as f32 * 0.02,
                modulation_depth: 8.0 + i as f32 * 3.0,
                level: 0.045 + i as f32 * 0.01,
            })
            .collect();
        Self {
            sample_rate: 48_000,
            voices,
            master_level: 0.4,
            master_ramp_seconds: 3.0,
            voice_ramp_seconds: 4.0,
            swell_period_seconds: Some(3.0),
            delay_seconds: 0.35,
            delay_wet: 0.25,
            lowpass_hz: 1200.0,
            lowpass_resonance_db: 0.5,
        }
    }
}

impl ScoreConfig {
    /// Validate ranges.
    pub fn validate(&self) -> NightworkResult<()> {
        if !(8_000..=192_000).contains(&self.sample_rate) {
            return Err(NightworkError::validation(
                "score.sample_rate must be in 8000..=192000",
            ));
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        if self.voices.is_empty() || self.voices.len() > 16 {
            return Err(NightworkError::validation(
                "score.voices must contain between 1 and 16 voices",
            ));
        }
        for (i, v) in self.voices.iter().enumerate() {
            if !(v.frequency.is_finite() && v.frequency > 0.0 && v.frequency < nyquist) {
                return Err(NightworkError::validation(format!(
                    "score.voices[{i}].frequency must be in (0, nyquist)"
                )));
            }
            if !(v.modulation_rate.is_finite() && v.modulation_rate >= 0.0) {
                return Err(NightworkError::validation(format!(
                    "score.voices[{i}].modulation_rate must be finite and >= 0"
                )));
            }
            if !(v.modulation_depth.is_finite()
                && v.modulation_depth >= 0.0
                && v.modulation_depth < v.frequency)
            {
                return Err(NightworkError::validation(format!(
                    "score.voices[{i}].modulation_depth must be in [0, frequency)"
                )));
            }
            check_unit(v.level, &format!("score.voices[{i}].level"))?;
        }
        check_unit(self.master_level, "score.master_level")?;
        check_duration(self.master_ramp_seconds, "score.master_ramp_seconds")?;
        check_duration(self.voice_ramp_seconds, "score.voice_ramp_seconds")?;
        if let Some(p) = self.swell_period_seconds
            && !(p.is_finite() && (0.05..=MAX_SWELL_PERIOD_SECONDS).contains(&p))
        {
            return Err(NightworkError::validation(
                "score.swell_period_seconds must be in [0.05, 3600] when set",
            ));
        }
        if !(self.delay_seconds.is_finite() && (0.0..=2.0).contains(&self.delay_seconds)) {
            return Err(NightworkError::validation(
                "score.delay_seconds must be in [0, 2]",
            ));
        }
        check_unit(self.delay_wet, "score.delay_wet")?;
        if !(self.lowpass_hz.is_finite() && self.lowpass_hz >= 20.0 && self.lowpass_hz < nyquist) {
            return Err(NightworkError::validation(
                "score.lowpass_hz must be in [20, nyquist)",
            ));
        }
        if !(self.lowpass_resonance_db.is_finite()
            && (-24.0..=24.0).contains(&self.lowpass_resonance_db))
        {
            return Err(NightworkError::validation(
                "score.lowpass_resonance_db must be in [-24, 24]",
            ));
        }
        Ok(())
    }
}

/// Narration timing and voice parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NarrationConfig {
    /// Delay between the last cue firing and the caption clearing, in seconds.
    pub clear_delay_seconds: f64,
    /// External text-to-speech program; `None` disables spoken narration.
    pub program: Option<String>,
    /// Speaking rate relative to normal (1.0).
    pub rate: f32,
    /// Pitch relative to normal (1.0).
    pub pitch: f32,
    /// Volume in `[0, 1]`.
    pub volume: f32,
    /// Preferred voice language tag.
    pub language: String,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            clear_delay_seconds: 4.5,
            program: Some("espeak-ng".to_owned()),
            rate: 0.95,
            pitch: 0.88,
            volume: 1.0,
            language: "hi".to_owned(),
        }
    }
}

impl NarrationConfig {
    /// Validate ranges.
    pub fn validate(&self) -> NightworkResult<()> {
        check_duration(self.clear_delay_seconds, "narration.clear_delay_seconds")?;
        if !(self.rate.is_finite() && self.rate > 0.0 && self.rate <= 4.0) {
            return Err(NightworkError::validation("narration.rate must be in (0, 4]"));
        }
        if !(self.pitch.is_finite() && self.pitch > 0.0 && self.pitch <= 2.0) {
            return Err(NightworkError::validation(
                "narration.pitch must be in (0, 2]",
            ));
        }
        check_unit(self.volume, "narration.volume")?;
        if let Some(p) = &self.program
            && p.trim().is_empty()
        {
            return Err(NightworkError::validation(
                "narration.program must not be empty when set",
            ));
        }
        Ok(())
    }
}

/// Scene surface parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Grain dots scattered per frame.
    pub grain_dots: u32,
    /// Narrowest layout width.
    pub min_width: u32,
    /// Layout width used when the container reports none.
    pub fallback_width: u32,
    /// Device pixel ratio cap.
    pub max_dpr: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            grain_dots: 40,
            min_width: crate::foundation::core::Canvas::MIN_WIDTH,
            fallback_width: crate::foundation::core::Canvas::FALLBACK_WIDTH,
            max_dpr: crate::foundation::core::Viewport::MAX_DPR,
        }
    }
}

impl SceneConfig {
    /// Validate ranges.
    pub fn validate(&self) -> NightworkResult<()> {
        if self.grain_dots > 10_000 {
            return Err(NightworkError::validation("scene.grain_dots must be <= 10000"));
        }
        if self.min_width == 0 || self.fallback_width == 0 {
            return Err(NightworkError::validation(
                "scene.min_width and scene.fallback_width must be > 0",
            ));
        }
        if !(self.max_dpr.is_finite() && self.max_dpr >= 1.0) {
            return Err(NightworkError::validation("scene.max_dpr must be >= 1"));
        }
        Ok(())
    }
}

fn check_unit(v: f32, name: &str) -> NightworkResult<()> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(NightworkError::validation(format!("{name} must be in [0, 1]")))
    }
}

fn check_duration(v: f64, name: &str) -> NightworkResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(NightworkError::validation(format!(
            "{name} must be finite and >= 0"
        )))
    }
}

fn default_script() -> Vec<NarrationCue> {
    [
        (0.0, "रात गहरी है, पर उसकी स्क्रीन अब भी जल रही है।"),
        (5.0, "लोग कहते हैं, यह सपना बहुत बड़ा है।"),
        (11.0, "हर सवाल, हर हँसी, उसके कानों में गूँजती है।"),
        (17.0, "पर सड़क की उस रोशनी के नीचे, कोई उसे देख रहा है।"),
        (23.0, "मेहनत की आवाज़ शोर नहीं करती।"),
        (29.0, "हर रात की एक पंक्ति, कल की एक सीढ़ी है।"),
        (35.0, "जब दुनिया सोती है, तब सपने बनते हैं।"),
        (41.0, "चलते रहो। सुबह ज़रूर आएगी।"),
    ]
    .into_iter()
    .map(|(t, text)| NarrationCue::new(t, text))
    .collect()
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
