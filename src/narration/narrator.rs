use crate::config::NarrationConfig;
use crate::foundation::error::{NightworkError, NightworkResult};
use std::process::{Child, Command, Stdio};

/// Speech capability. Implementations must not block the caller for the length of an utterance.
pub trait Narrator: Send {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Begin speaking `text`, replacing anything still being spoken.
    fn speak(&mut self, text: &str) -> NightworkResult<()>;

    /// Stop the current utterance, if any.
    fn cancel(&mut self);
}

/// Speaks through an external text-to-speech program (espeak-ng compatible arguments).
///
/// Each utterance is its own child process; starting a new one kills the previous child.
#[derive(Debug)]
pub struct CommandNarrator {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl CommandNarrator {
    // espeak-ng's neutral settings.
    const BASE_WPM: f32 = 175.0;
    const BASE_PITCH: f32 = 50.0;
    const BASE_AMPLITUDE: f32 = 100.0;

    /// Build a narrator for `program` with voice parameters taken from `cfg`.
    pub fn new(program: impl Into<String>, cfg: &NarrationConfig) -> Self {
        let wpm = (Self::BASE_WPM * cfg.rate).round().clamp(80.0, 450.0);
        let pitch = (Self::BASE_PITCH * cfg.pitch).round().clamp(0.0, 99.0);
        let amplitude = (Self::BASE_AMPLITUDE * cfg.volume).round().clamp(0.0, 200.0);
        let mut args = vec![
            "-s".to_owned(),
            format!("{wpm}"),
            "-p".to_owned(),
            format!("{pitch}"),
            "-a".to_owned(),
            format!("{amplitude}"),
        ];
        if !cfg.language.trim().is_empty() {
            args.push("-v".to_owned());
            args.push(cfg.language.trim().to_owned());
        }
        Self {
            program: program.into(),
            args,
            child: None,
        }
    }

    /// The configured program if it answers `--version` on PATH; `None` otherwise.
    pub fn detect(cfg: &NarrationConfig) -> Option<Self> {
        let program = cfg.program.as_deref()?;
        if Self::is_available(program) {
            Some(Self::new(program, cfg))
        } else {
            tracing::warn!(program, "narrator program not found; captions only");
            None
        }
    }

    pub fn is_available(program: &str) -> bool {
        Command::new(program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed before the utterance text.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn reap(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Narrator for CommandNarrator {
    fn name(&self) -> &str {
        &self.program
    }

    fn speak(&mut self, text: &str) -> NightworkResult<()> {
        self.reap();
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                NightworkError::narration(format!("failed to spawn '{}': {e}", self.program))
            })?;
        self.child = Some(child);
        Ok(())
    }

    fn cancel(&mut self) {
        self.reap();
    }
}

impl Drop for CommandNarrator {
    fn drop(&mut self) {
        self.reap();
    }
}

/// Headless narrator that emits each utterance as a `tracing` event.
#[derive(Debug, Default)]
pub struct LogNarrator {
    spoken: usize,
}

impl LogNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of utterances spoken so far.
    pub fn spoken(&self) -> usize {
        self.spoken
    }
}

impl Narrator for LogNarrator {
    fn name(&self) -> &str {
        "log"
    }

    fn speak(&mut self, text: &str) -> NightworkResult<()> {
        self.spoken += 1;
        tracing::info!(target: "nightwork::narration", text, "narrate");
        Ok(())
    }

    fn cancel(&mut self) {}
}

#[cfg(test)]
#[path = "../../tests/unit/narration/narrator.rs"]
mod tests;
