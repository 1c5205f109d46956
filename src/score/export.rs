use crate::config::ScoreConfig;
use crate::foundation::error::{NightworkError, NightworkResult};
use crate::score::graph::{RampPlan, ScoreGraph};
use std::path::Path;

const MAX_EXPORT_SECONDS: f64 = 3600.0;

/// Interleaved channel counts accepted by the exporter.
const EXPORT_CHANNELS: std::ops::RangeInclusive<usize> = 1..=8;

/// An intensity toggle at a point on the export timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntensityChange {
    /// Seconds from the start of the export.
    pub at_seconds: f64,
    /// Intensity after the change.
    pub on: bool,
}

/// Render `seconds` of the score to interleaved f32 PCM, without any device.
///
/// The swell loop is simulated on the audio clock, so the result is deterministic.
pub fn render_score_offline(
    cfg: &ScoreConfig,
    seconds: f64,
    initial_intensity: bool,
    changes: &[IntensityChange],
    channels: usize,
) -> NightworkResult<Vec<f32>> {
    cfg.validate()?;
    if !(seconds.is_finite() && (0.0..=MAX_EXPORT_SECONDS).contains(&seconds)) {
        return Err(NightworkError::validation(format!(
            "export length must be in [0, {MAX_EXPORT_SECONDS}] seconds"
        )));
    }
    if !EXPORT_CHANNELS.contains(&channels) {
        return Err(NightworkError::validation(format!(
            "export channel count must be in [1, 8], got {channels}"
        )));
    }
    let sr = f64::from(cfg.sample_rate);
    let total_frames = (seconds * sr).round() as u64;

    let mut changes = changes
        .iter()
        .copied()
        .filter(|c| c.at_seconds.is_finite() && c.at_seconds >= 0.0)
        .collect::<Vec<_>>();
    changes.sort_by(|a, b| a.at_seconds.total_cmp(&b.at_seconds));

    let plan = RampPlan::from(cfg);
    let mut graph = ScoreGraph::new(cfg);
    let mut intensity = initial_intensity;
    graph.swell(&plan, intensity);

    let mut out = Vec::with_capacity(total_frames as usize * channels);
    let mut rendered: u64 = 0;
    let mut next_change = 0usize;
    let mut next_swell = cfg.swell_period_seconds;

    while rendered < total_frames {
        let change_at = changes.get(next_change).map(|c| c.at_seconds);
        let event_at = [change_at, next_swell]
            .into_iter()
            .flatten()
            .fold(seconds, f64::min);
        let event_frame = ((event_at * sr).round() as u64).clamp(rendered, total_frames);

        let frames = (event_frame - rendered) as usize;
        let start = out.len();
        out.resize(start + frames * channels, 0.0);
        graph.render(&mut out[start..], channels);
        rendered = event_frame;

        while let Some(c) = changes.get(next_change)
            && ((c.at_seconds * sr).round() as u64) <= rendered
        {
            intensity = c.on;
            graph.swell(&plan, intensity);
            next_change += 1;
        }
        if let (Some(at), Some(period)) = (next_swell, cfg.swell_period_seconds)
            && ((at * sr).round() as u64) <= rendered
        {
            graph.swell(&plan, intensity);
            next_swell = Some(at + period);
        }
    }

    tracing::debug!(seconds, frames = total_frames, channels, "score rendered offline");
    Ok(out)
}

/// Write interleaved `f32` PCM samples to a raw little-endian `.f32le` file.
pub fn write_pcm_f32le(samples_interleaved: &[f32], out_path: &Path) -> NightworkResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            NightworkError::audio(format!(
                "failed to create audio output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        NightworkError::audio(format!(
            "failed to write score audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/score/export.rs"]
mod tests;
