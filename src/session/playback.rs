use std::sync::Arc;

use crate::clock::{SessionClock, SystemTimeSource, TimeSource};
use crate::config::VignetteConfig;
use crate::foundation::core::{Canvas, Viewport};
use crate::foundation::error::NightworkResult;
use crate::narration::{CaptionLog, CaptionSink, CueList, NarrationDriver, Narrator};
use crate::render::{CpuRasterizer, FrameRGBA};
use crate::scene::{SceneFrame, compose_frame};
use crate::score::{ActivationError, AudioBackend, NullBackend, ScoreEngine};

/// Whether the session is playing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

/// A passive, non-blocking notice about degraded capabilities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advisory {
    /// The audio backend could not be activated; activation is retried on the next start.
    AudioDeferred(String),
    /// No narrator is available; captions still run on schedule.
    NarrationUnavailable,
}

/// What one tick produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TickOutput {
    /// Seconds since the current start instant.
    pub elapsed: f64,
    pub frame: SceneFrame,
}

type BackendFactory = Box<dyn FnMut() -> NightworkResult<Box<dyn AudioBackend>> + Send>;

/// Assembles a [`PlaybackSession`] from its collaborators.
pub struct PlaybackSessionBuilder {
    config: VignetteConfig,
    time: Arc<dyn TimeSource>,
    backend_factory: BackendFactory,
    sink: Box<dyn CaptionSink>,
    narrator: Option<Box<dyn Narrator>>,
    container_width: Option<f64>,
    device_pixel_ratio: f64,
    intensity: bool,
}

impl PlaybackSessionBuilder {
    pub fn new(config: VignetteConfig) -> Self {
        Self {
            config,
            time: Arc::new(SystemTimeSource::new()),
            backend_factory: Box::new(|| Ok(Box::new(NullBackend::new()) as Box<dyn AudioBackend>)),
            sink: Box::new(CaptionLog::new()),
            narrator: None,
            container_width: None,
            device_pixel_ratio: 1.0,
            intensity: true,
        }
    }

    pub fn time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    /// Use `backend` for audio. If it refuses to activate it is kept and retried on each start.
    pub fn audio_backend(mut self, backend: Box<dyn AudioBackend>) -> Self {
        let mut slot = Some(backend);
        self.backend_factory = Box::new(move || {
            Ok(slot
                .take()
                .unwrap_or_else(|| Box::new(NullBackend::new()) as Box<dyn AudioBackend>))
        });
        self
    }

    /// Create the audio backend lazily, on the first start (and again after a failed creation).
    pub fn backend_factory(
        mut self,
        factory: impl FnMut() -> NightworkResult<Box<dyn AudioBackend>> + Send + 'static,
    ) -> Self {
        self.backend_factory = Box::new(factory);
        self
    }

    pub fn caption_sink(mut self, sink: Box<dyn CaptionSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn narrator(mut self, narrator: Option<Box<dyn Narrator>>) -> Self {
        self.narrator = narrator;
        self
    }

    /// Width reported by the hosting container; `None` uses the fallback width.
    pub fn container_width(mut self, width: Option<f64>) -> Self {
        self.container_width = width;
        self
    }

    pub fn device_pixel_ratio(mut self, dpr: f64) -> Self {
        self.device_pixel_ratio = dpr;
        self
    }

    /// Initial intensity, applied at start.
    pub fn intensity(mut self, on: bool) -> Self {
        self.intensity = on;
        self
    }

    pub fn build(self) -> NightworkResult<PlaybackSession> {
        self.config.validate()?;

        let cues = CueList::new(self.config.cues.iter().cloned());
        let mut advisories = Vec::new();
        if self.narrator.is_none() {
            advisories.push(Advisory::NarrationUnavailable);
        }
        let narration = NarrationDriver::new(
            cues,
            self.config.narration.clear_delay_seconds,
            self.sink,
            self.narrator,
        );

        let mut session = PlaybackSession {
            viewport: Viewport::default(),
            config: self.config,
            time: self.time,
            clock: SessionClock::new(),
            state: SessionState::Idle,
            intensity: self.intensity,
            score: None,
            pending_backend: None,
            backend_factory: self.backend_factory,
            narration,
            container_width: self.container_width,
            device_pixel_ratio: self.device_pixel_ratio,
            frames_subscribed: false,
            resize_subscribed: false,
            rasterizer: CpuRasterizer::new(),
            advisories,
        };
        session.viewport = session.derive_viewport();
        Ok(session)
    }
}

/// Composition root: owns the clock, score engine, narration driver and scene surface, and
/// drives them from explicit start/stop/tick calls.
///
/// The score engine is created on the first start and reused across stop/start cycles. Stop
/// fades the score out instead of tearing it down; only [`PlaybackSession::teardown`] (or drop)
/// releases audio.
pub struct PlaybackSession {
    config: VignetteConfig,
    time: Arc<dyn TimeSource>,
    clock: SessionClock,
    state: SessionState,
    intensity: bool,
    score: Option<ScoreEngine>,
    pending_backend: Option<Box<dyn AudioBackend>>,
    backend_factory: BackendFactory,
    narration: NarrationDriver,
    viewport: Viewport,
    container_width: Option<f64>,
    device_pixel_ratio: f64,
    frames_subscribed: bool,
    resize_subscribed: bool,
    rasterizer: CpuRasterizer,
    advisories: Vec<Advisory>,
}

impl PlaybackSession {
    pub fn builder(config: VignetteConfig) -> PlaybackSessionBuilder {
        PlaybackSessionBuilder::new(config)
    }

    /// Begin playback. Returns `false` (and does nothing) if already running.
    #[tracing::instrument(skip(self), fields(intensity = self.intensity))]
    pub fn start(&mut self) -> bool {
        if self.state == SessionState::Running {
            return false;
        }
        self.ensure_audio();

        let now = self.time.now_seconds();
        self.clock.start(now);
        self.narration.attach();
        if let Some(score) = &self.score {
            score.resume();
            score.set_intensity(self.intensity);
        }
        self.resize_subscribed = true;
        self.viewport = self.derive_viewport();
        self.frames_subscribed = true;
        self.state = SessionState::Running;
        tracing::info!(start_instant = now, audio = self.score.is_some(), "session started");
        true
    }

    /// Stop playback. Returns `false` (and does nothing) if not running.
    ///
    /// Ticks stop producing frames, narration is cancelled, and the score fades toward silence.
    #[tracing::instrument(skip(self))]
    pub fn stop(&mut self) -> bool {
        if self.state == SessionState::Idle {
            return false;
        }
        self.frames_subscribed = false;
        self.narration.detach();
        if let Some(score) = &self.score {
            score.fade_out();
        }
        self.resize_subscribed = false;
        self.clock.stop();
        self.state = SessionState::Idle;
        tracing::info!("session stopped");
        true
    }

    /// Turn the score on or off. Remembered while idle and applied at the next start.
    pub fn set_intensity(&mut self, on: bool) {
        self.intensity = on;
        if let Some(score) = &self.score {
            score.set_intensity(on);
        }
    }

    pub fn intensity(&self) -> bool {
        self.intensity
    }

    /// Cut the current utterance short; captions keep their timing.
    pub fn silence_narration(&mut self) {
        self.narration.silence();
    }

    /// Record a new container width. The viewport follows immediately while running and at the
    /// next start otherwise. Returns `true` if the viewport changed.
    pub fn resize(&mut self, container_width: Option<f64>) -> bool {
        self.container_width = container_width;
        if !self.resize_subscribed {
            return false;
        }
        let next = self.derive_viewport();
        let changed = next != self.viewport;
        self.viewport = next;
        if changed {
            tracing::debug!(
                width = next.canvas.width,
                height = next.canvas.height,
                dpr = next.dpr,
                "viewport resized"
            );
        }
        changed
    }

    /// Advance narration and compose the scene for the current instant.
    ///
    /// Returns `None` while idle.
    pub fn tick(&mut self) -> Option<TickOutput> {
        if !self.frames_subscribed {
            return None;
        }
        let elapsed = self.clock.elapsed(self.time.now_seconds());
        self.narration.on_tick(elapsed);
        let frame = compose_frame(self.viewport, elapsed, true, self.config.scene.grain_dots);
        Some(TickOutput { elapsed, frame })
    }

    /// [`PlaybackSession::tick`] followed by rasterization.
    pub fn render_tick(&mut self) -> Option<(TickOutput, FrameRGBA)> {
        let out = self.tick()?;
        let pixels = self.rasterizer.render(&out.frame);
        Some((out, pixels))
    }

    /// The scene as drawn before playback starts, at `elapsed` seconds of idle animation.
    ///
    /// Laid out for the latest container width, even one recorded while idle.
    pub fn preview_frame(&self, elapsed: f64) -> SceneFrame {
        compose_frame(self.derive_viewport(), elapsed, false, self.config.scene.grain_dots)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Seconds since the current start instant; 0 while idle.
    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed(self.time.now_seconds())
    }

    pub fn start_instant(&self) -> Option<f64> {
        self.clock.start_instant()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &VignetteConfig {
        &self.config
    }

    pub fn score(&self) -> Option<&ScoreEngine> {
        self.score.as_ref()
    }

    pub fn narration(&self) -> &NarrationDriver {
        &self.narration
    }

    pub fn rasterizer(&self) -> &CpuRasterizer {
        &self.rasterizer
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    pub fn take_advisories(&mut self) -> Vec<Advisory> {
        std::mem::take(&mut self.advisories)
    }

    /// Stop, then release the audio backend. Safe to call more than once.
    pub fn teardown(&mut self) {
        self.stop();
        if let Some(mut score) = self.score.take()
            && score.teardown()
        {
            tracing::info!("session torn down");
        }
        if let Some(mut backend) = self.pending_backend.take() {
            backend.deactivate();
        }
    }

    fn ensure_audio(&mut self) {
        if self.score.is_some() {
            return;
        }
        let backend = match self.pending_backend.take() {
            Some(b) => b,
            None => match (self.backend_factory)() {
                Ok(b) => b,
                Err(err) => {
                    tracing::warn!(%err, "audio backend unavailable; continuing without score");
                    self.advisories.push(Advisory::AudioDeferred(err.to_string()));
                    return;
                }
            },
        };
        match ScoreEngine::activate(&self.config.score, backend, self.intensity) {
            Ok(engine) => self.score = Some(engine),
            Err(ActivationError { error, backend }) => {
                tracing::warn!(
                    %error,
                    backend = backend.name(),
                    "audio activation deferred to next start"
                );
                self.advisories.push(Advisory::AudioDeferred(error.to_string()));
                self.pending_backend = Some(backend);
            }
        }
    }

    fn derive_viewport(&self) -> Viewport {
        let scene = &self.config.scene;
        let canvas = Canvas::fit_container(self.container_width, scene.min_width, scene.fallback_width);
        Viewport::new(canvas, self.device_pixel_ratio, scene.max_dpr)
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/playback.rs"]
mod tests;
