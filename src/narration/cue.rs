/// One line of narration, fired once `offset_seconds` of session time have elapsed.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NarrationCue {
    /// Offset from the session start instant, in seconds.
    #[serde(alias = "t")]
    pub offset_seconds: f64,
    /// Caption text, also handed to the narrator.
    pub text: String,
}

impl NarrationCue {
    pub fn new(offset_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            offset_seconds,
            text: text.into(),
        }
    }
}

/// Cues ordered by ascending offset; equal offsets keep their original order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CueList {
    cues: Vec<NarrationCue>,
}

impl CueList {
    /// Sort `cues` stably by offset.
    ///
    /// Negative offsets are treated as 0. Cues with non-finite offsets can never fire and are
    /// dropped.
    pub fn new(cues: impl IntoIterator<Item = NarrationCue>) -> Self {
        let mut cues = cues
            .into_iter()
            .filter_map(|mut cue| {
                if !cue.offset_seconds.is_finite() {
                    tracing::warn!(text = %cue.text, "dropping cue with non-finite offset");
                    return None;
                }
                cue.offset_seconds = cue.offset_seconds.max(0.0);
                Some(cue)
            })
            .collect::<Vec<_>>();
        // `sort_by` is stable.
        cues.sort_by(|a, b| a.offset_seconds.total_cmp(&b.offset_seconds));
        Self { cues }
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NarrationCue> {
        self.cues.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NarrationCue> {
        self.cues.iter()
    }

    pub fn as_slice(&self) -> &[NarrationCue] {
        &self.cues
    }

    /// Offset of the last cue, or 0 for an empty list.
    pub fn last_offset(&self) -> f64 {
        self.cues.last().map(|c| c.offset_seconds).unwrap_or(0.0)
    }
}

impl FromIterator<NarrationCue> for CueList {
    fn from_iter<I: IntoIterator<Item = NarrationCue>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a CueList {
    type Item = &'a NarrationCue;
    type IntoIter = std::slice::Iter<'a, NarrationCue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/cue.rs"]
mod tests;
