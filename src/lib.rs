//! Nightwork plays a short looping audiovisual vignette: a generative ambient score, timed
//! narration captions, and a procedurally drawn night scene, all driven from one session clock.
//!
//! The public API is session-oriented:
//!
//! - Load and validate a [`VignetteConfig`]
//! - Build a [`PlaybackSession`] with its audio backend, caption sink and narrator
//! - `start`, then `tick` once per frame (or hand the session to a [`FrameLoop`])
//! - Rasterize frames with [`CpuRasterizer`], or export the score with [`render_score_offline`]
#![forbid(unsafe_code)]

mod foundation;

/// Time sources and the session clock.
pub mod clock;
/// JSON-facing configuration.
pub mod config;
/// Caption timeline and speech.
pub mod narration;
/// Scene rasterization.
pub mod render;
/// Per-tick scene display lists.
pub mod scene;
/// Generative score synthesis.
pub mod score;
/// Composition root.
pub mod session;

pub use crate::foundation::core::{Affine, Canvas, Point, Rect, Rgba8, Vec2, Viewport};
pub use crate::foundation::error::{NightworkError, NightworkResult};

pub use crate::clock::{ManualTimeSource, SessionClock, SystemTimeSource, TimeSource};
pub use crate::config::{NarrationConfig, SceneConfig, ScoreConfig, VignetteConfig, VoiceConfig};
pub use crate::narration::{
    CaptionEvent, CaptionLog, CaptionSink, CommandNarrator, CueList, LogNarrator, NarrationCue,
    NarrationDriver, Narrator,
};
pub use crate::render::{CpuRasterizer, FrameRGBA};
pub use crate::scene::{SceneFrame, compose_frame};
#[cfg(feature = "device")]
pub use crate::score::CpalBackend;
pub use crate::score::{
    AudioBackend, IntensityChange, NullBackend, OfflineBackend, ScoreEngine, render_score_offline,
    write_pcm_f32le,
};
pub use crate::session::{
    Advisory, FrameLoop, FrameLoopStats, PlaybackSession, PlaybackSessionBuilder, SessionState,
    TickOutput,
};
