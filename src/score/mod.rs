//! Generative ambient score: a sustained chord of modulated voices whose loudness crossfades with
//! the session's intensity flag.

pub mod backend;
pub mod engine;
pub mod envelope;
pub mod export;
pub mod graph;
pub mod voice;

pub use backend::{AudioBackend, NullBackend, OfflineBackend};
#[cfg(feature = "device")]
pub use backend::CpalBackend;
pub use engine::{ActivationError, ScoreEngine};
pub use envelope::GainEnvelope;
pub use export::{IntensityChange, render_score_offline, write_pcm_f32le};
pub use graph::{RampPlan, ScoreGraph, SharedGraph};
pub use voice::{Voice, Waveform};
