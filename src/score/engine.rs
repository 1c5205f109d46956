use crate::config::ScoreConfig;
use crate::foundation::error::NightworkError;
use crate::score::backend::AudioBackend;
use crate::score::graph::{RampPlan, ScoreGraph, SharedGraph};
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Backend activation failed; the backend is handed back so the caller can retry later.
pub struct ActivationError {
    /// Why activation failed.
    pub error: NightworkError,
    /// The backend that refused to activate.
    pub backend: Box<dyn AudioBackend>,
}

impl std::fmt::Debug for ActivationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationError")
            .field("error", &self.error)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Flags read by the swell loop. Written only by the engine's owner.
#[derive(Debug)]
struct SwellFlags {
    intensity: AtomicBool,
    playing: AtomicBool,
    reissues: AtomicU64,
}

struct SwellLoop {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// The generative score: a sustained, slowly modulated chord with crossfaded intensity.
///
/// Owns the audio graph (created once) and the backend it is attached to. Control calls schedule
/// ramps on the graph; the backend's render side consumes them at audio rate.
pub struct ScoreEngine {
    graph: SharedGraph,
    plan: RampPlan,
    backend: Box<dyn AudioBackend>,
    flags: Arc<SwellFlags>,
    swell: Option<SwellLoop>,
    torn_down: bool,
}

impl ScoreEngine {
    /// Build the graph, attach it to `backend`, and start swelling toward `intensity`.
    pub fn activate(
        cfg: &ScoreConfig,
        mut backend: Box<dyn AudioBackend>,
        intensity: bool,
    ) -> Result<Self, ActivationError> {
        let graph = ScoreGraph::new(cfg).shared();
        if let Err(error) = backend.activate(graph.clone()) {
            return Err(ActivationError { error, backend });
        }

        let plan = RampPlan::from(cfg);
        let flags = Arc::new(SwellFlags {
            intensity: AtomicBool::new(intensity),
            playing: AtomicBool::new(true),
            reissues: AtomicU64::new(0),
        });
        let mut engine = Self {
            graph,
            plan,
            backend,
            flags,
            swell: None,
            torn_down: false,
        };
        engine.issue_swell();
        if let Some(period) = cfg.swell_period_seconds {
            match Duration::try_from_secs_f64(period) {
                Ok(period) if !period.is_zero() => {
                    engine.swell = engine.spawn_swell_loop(period);
                }
                _ => tracing::warn!(period, "unusable swell period; relying on ramp holds"),
            }
        }
        tracing::info!(
            backend = engine.backend.name(),
            voices = cfg.voices.len(),
            intensity,
            "score engine active"
        );
        Ok(engine)
    }

    /// Turn the score on or off with a crossfade; re-anchors any ramp in progress.
    pub fn set_intensity(&self, on: bool) {
        self.flags.intensity.store(on, Ordering::Release);
        tracing::debug!(on, "score intensity");
        self.issue_swell();
    }

    /// Current intensity flag.
    pub fn intensity(&self) -> bool {
        self.flags.intensity.load(Ordering::Acquire)
    }

    /// Ramp master gain toward 0 without tearing anything down.
    pub fn fade_out(&self) {
        self.flags.playing.store(false, Ordering::Release);
        self.issue_swell();
    }

    /// Undo [`ScoreEngine::fade_out`]: swell back toward the current intensity.
    pub fn resume(&self) {
        self.flags.playing.store(true, Ordering::Release);
        self.issue_swell();
    }

    /// Return `true` unless faded out.
    pub fn is_playing(&self) -> bool {
        self.flags.playing.load(Ordering::Acquire)
    }

    /// Handle to the shared graph (for inspection and offline pulls).
    pub fn graph(&self) -> SharedGraph {
        self.graph.clone()
    }

    /// Master gain at the graph's current audio time.
    pub fn master_level(&self) -> f32 {
        self.graph.lock().map(|g| g.master_level()).unwrap_or(0.0)
    }

    /// Master ramp target.
    pub fn master_target(&self) -> f32 {
        self.graph
            .lock()
            .map(|g| g.master_envelope().target_level())
            .unwrap_or(0.0)
    }

    /// Per-voice gains at the graph's current audio time.
    pub fn voice_levels(&self) -> SmallVec<[f32; 4]> {
        self.graph
            .lock()
            .map(|g| g.voice_levels())
            .unwrap_or_default()
    }

    /// Name of the attached backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Number of times the swell loop has re-issued the ramps.
    pub fn swell_reissues(&self) -> u64 {
        self.flags.reissues.load(Ordering::Acquire)
    }

    /// Return `true` while the periodic swell loop is alive.
    pub fn is_swell_running(&self) -> bool {
        self.swell.is_some()
    }

    /// Stop the swell loop and detach from the backend.
    ///
    /// Returns `true` only for the call that actually tore the engine down.
    pub fn teardown(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        if let Some(swell) = self.swell.take() {
            let _ = swell.stop_tx.send(());
            if swell.handle.join().is_err() {
                tracing::warn!("swell loop panicked");
            }
        }
        self.backend.deactivate();
        tracing::info!(backend = self.backend.name(), "score engine torn down");
        true
    }

    fn issue_swell(&self) {
        apply_swell(&self.graph, &self.plan, &self.flags);
    }

    fn spawn_swell_loop(&self, period: Duration) -> Option<SwellLoop> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let graph = self.graph.clone();
        let plan = self.plan.clone();
        let flags = self.flags.clone();
        let spawned = std::thread::Builder::new()
            .name("nightwork-swell".to_owned())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {
                            apply_swell(&graph, &plan, &flags);
                            flags.reissues.fetch_add(1, Ordering::AcqRel);
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            });
        match spawned {
            Ok(handle) => Some(SwellLoop { stop_tx, handle }),
            Err(err) => {
                // Ramps hold indefinitely, so the score still works without re-issues.
                tracing::warn!(%err, "could not spawn swell loop; relying on ramp holds");
                None
            }
        }
    }
}

impl Drop for ScoreEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn apply_swell(graph: &SharedGraph, plan: &RampPlan, flags: &SwellFlags) {
    let Ok(mut g) = graph.lock() else {
        return;
    };
    if flags.playing.load(Ordering::Acquire) {
        g.swell(plan, flags.intensity.load(Ordering::Acquire));
    } else {
        g.ramp_master(0.0, plan.master_ramp_seconds);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/score/engine.rs"]
mod tests;
