use crate::foundation::error::{NightworkError, NightworkResult};
use crate::score::graph::SharedGraph;

/// An audio output the score graph can be attached to.
///
/// Activation may fail (no device, no user-gesture permission yet); callers treat that as
/// recoverable and retry on the next explicit start.
pub trait AudioBackend: Send {
    /// Short human-readable name used in logs.
    fn name(&self) -> &str;

    /// Start pulling audio from `graph`.
    fn activate(&mut self, graph: SharedGraph) -> NightworkResult<()>;

    /// Stop pulling audio. Safe to call when not active.
    fn deactivate(&mut self);

    /// Return `true` while attached to a graph.
    fn is_active(&self) -> bool;
}

/// Backend that accepts the graph and never renders it.
#[derive(Debug, Default)]
pub struct NullBackend {
    active: bool,
}

impl NullBackend {
    /// Create an inactive null backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn activate(&mut self, _graph: SharedGraph) -> NightworkResult<()> {
        self.active = true;
        Ok(())
    }

    fn deactivate(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Backend rendered on demand by the host; the host decides how much audio time passes.
///
/// Clones share the attached graph, so a test or exporter can keep a handle after handing the
/// backend to an engine.
#[derive(Clone, Default)]
pub struct OfflineBackend {
    graph: std::sync::Arc<std::sync::Mutex<Option<SharedGraph>>>,
    channels: usize,
}

impl OfflineBackend {
    /// Create a backend producing `channels` interleaved channels.
    pub fn new(channels: usize) -> Self {
        Self {
            graph: Default::default(),
            channels: channels.max(1),
        }
    }

    /// Channel count of pulled buffers.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Render `seconds` of audio from the attached graph.
    ///
    /// Returns an empty buffer when not active.
    pub fn pull_seconds(&self, seconds: f64) -> Vec<f32> {
        let Some(graph) = self.attached() else {
            return Vec::new();
        };
        let Ok(mut g) = graph.lock() else {
            return Vec::new();
        };
        let frames = (seconds.max(0.0) * f64::from(g.sample_rate())).round() as usize;
        g.render_frames(frames, self.channels)
    }

    fn attached(&self) -> Option<SharedGraph> {
        self.graph.lock().ok().and_then(|g| g.clone())
    }
}

impl AudioBackend for OfflineBackend {
    fn name(&self) -> &str {
        "offline"
    }

    fn activate(&mut self, graph: SharedGraph) -> NightworkResult<()> {
        let mut slot = self
            .graph
            .lock()
            .map_err(|_| NightworkError::audio("offline backend state poisoned"))?;
        *slot = Some(graph);
        Ok(())
    }

    fn deactivate(&mut self) {
        if let Ok(mut slot) = self.graph.lock() {
            slot.take();
        }
    }

    fn is_active(&self) -> bool {
        self.attached().is_some()
    }
}

#[cfg(feature = "device")]
pub use device::CpalBackend;

#[cfg(feature = "device")]
mod device {
    use super::AudioBackend;
    use crate::foundation::error::{NightworkError, NightworkResult};
    use crate::score::graph::SharedGraph;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::mpsc;
    use std::thread::JoinHandle;

    struct StreamThread {
        stop_tx: mpsc::Sender<()>,
        handle: JoinHandle<()>,
    }

    /// Default system output device via `cpal`.
    ///
    /// `cpal::Stream` is not `Send` everywhere, so the stream lives on its own thread for as long
    /// as the backend is active. Its callback locks the shared graph and renders into the device
    /// buffer, converting to `i16` or `u16` when the device does not take `f32`. The graph should
    /// be built at [`CpalBackend::device_sample_rate`].
    #[derive(Default)]
    pub struct CpalBackend {
        worker: Option<StreamThread>,
    }

    impl CpalBackend {
        /// Create an inactive device backend.
        pub fn new() -> Self {
            Self::default()
        }

        /// Sample rate of the default output device, if one exists.
        pub fn device_sample_rate() -> Option<u32> {
            let host = cpal::default_host();
            let device = host.default_output_device()?;
            let cfg = device.default_output_config().ok()?;
            Some(cfg.sample_rate().0)
        }
    }

    fn open_stream(graph: SharedGraph) -> NightworkResult<cpal::Stream> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| NightworkError::audio("no default output device"))?;
        let supported = device
            .default_output_config()
            .map_err(|e| NightworkError::audio(format!("query output config: {e}")))?;
        let config = cpal::StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => {
                let channels = usize::from(config.channels);
                device.build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        render_locked(&graph, data, channels);
                    },
                    |err| tracing::warn!(%err, "audio output stream error"),
                    None,
                )
            }
            cpal::SampleFormat::I16 => build_converting::<i16>(&device, &config, graph),
            cpal::SampleFormat::U16 => build_converting::<u16>(&device, &config, graph),
            other => {
                return Err(NightworkError::audio(format!(
                    "unsupported output sample format {other:?}"
                )));
            }
        }
        .map_err(|e| NightworkError::audio(format!("build output stream: {e}")))?;

        stream
            .play()
            .map_err(|e| NightworkError::audio(format!("start output stream: {e}")))?;
        Ok(stream)
    }

    /// Integer output: render into an f32 scratch buffer, then convert.
    fn build_converting<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        graph: SharedGraph,
    ) -> Result<cpal::Stream, cpal::BuildStreamError>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = usize::from(config.channels);
        let mut scratch: Vec<f32> = vec![0.0; 4096];
        device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if scratch.len() < data.len() {
                    scratch.resize(data.len(), 0.0);
                }
                let buf = &mut scratch[..data.len()];
                render_locked(&graph, buf, channels);
                write_converted(buf, data);
            },
            |err| tracing::warn!(%err, "audio output stream error"),
            None,
        )
    }

    fn render_locked(graph: &SharedGraph, out: &mut [f32], channels: usize) {
        match graph.lock() {
            Ok(mut g) => g.render(out, channels),
            Err(_) => out.fill(0.0),
        }
    }

    pub(super) fn write_converted<T>(src: &[f32], dst: &mut [T])
    where
        T: cpal::Sample + cpal::FromSample<f32>,
    {
        for (d, &s) in dst.iter_mut().zip(src) {
            *d = T::from_sample(s);
        }
    }

    impl AudioBackend for CpalBackend {
        fn name(&self) -> &str {
            "cpal"
        }

        fn activate(&mut self, graph: SharedGraph) -> NightworkResult<()> {
            if self.worker.is_some() {
                return Ok(());
            }
            let (ready_tx, ready_rx) = mpsc::channel::<NightworkResult<()>>();
            let (stop_tx, stop_rx) = mpsc::channel::<()>();
            let handle = std::thread::Builder::new()
                .name("nightwork-audio".to_owned())
                .spawn(move || {
                    let stream = match open_stream(graph) {
                        Ok(stream) => stream,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                    let _ = ready_tx.send(Ok(()));
                    // Blocks until deactivate sends or the sender is dropped.
                    let _ = stop_rx.recv();
                    drop(stream);
                })
                .map_err(|e| NightworkError::audio(format!("spawn audio thread: {e}")))?;

            match ready_rx.recv() {
                Ok(Ok(())) => {
                    self.worker = Some(StreamThread { stop_tx, handle });
                    Ok(())
                }
                Ok(Err(e)) => {
                    let _ = handle.join();
                    Err(e)
                }
                Err(_) => {
                    let _ = handle.join();
                    Err(NightworkError::audio("audio thread exited during startup"))
                }
            }
        }

        fn deactivate(&mut self) {
            if let Some(worker) = self.worker.take() {
                let _ = worker.stop_tx.send(());
                let _ = worker.handle.join();
            }
        }

        fn is_active(&self) -> bool {
            self.worker.is_some()
        }
    }

    impl Drop for CpalBackend {
        fn drop(&mut self) {
            self.deactivate();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/score/backend.rs"]
mod tests;
