use std::{
    ops::ControlFlow,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "nightwork", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single scene frame as a PNG.
    Frame(FrameArgs),
    /// Render the generative score offline to raw f32le PCM.
    Score(ScoreArgs),
    /// Play the vignette in real time: captions on stdout, score on the audio device.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Seconds since the session start.
    #[arg(long, default_value_t = 0.0)]
    t: f64,

    /// Container width in layout pixels (falls back to the configured default).
    #[arg(long)]
    width: Option<f64>,

    /// Device pixel ratio.
    #[arg(long, default_value_t = 1.0)]
    dpr: f64,

    /// Draw the frame as a started session (modulated flicker).
    #[arg(long)]
    started: bool,

    /// Vignette config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ScoreArgs {
    /// Length of the export in seconds.
    #[arg(long)]
    secs: f64,

    /// Turn intensity off at this many seconds.
    #[arg(long)]
    intensity_off_at: Option<f64>,

    /// Interleaved output channels.
    #[arg(long, default_value_t = 2)]
    channels: usize,

    /// Vignette config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output `.f32le` path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// How long to play, in seconds.
    #[arg(long, default_value_t = 48.0)]
    secs: f64,

    /// Frame rate of the tick loop.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Vignette config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write every rendered frame as a PNG into this directory.
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Log narration instead of speaking it.
    #[arg(long)]
    no_speech: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Score(args) => cmd_score(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<nightwork::VignetteConfig> {
    let cfg = match path {
        Some(p) => nightwork::VignetteConfig::from_path(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => nightwork::VignetteConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn write_png(path: &Path, frame: &nightwork::FrameRGBA) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let canvas = nightwork::Canvas::fit_container(
        args.width,
        cfg.scene.min_width,
        cfg.scene.fallback_width,
    );
    let viewport = nightwork::Viewport::new(canvas, args.dpr, cfg.scene.max_dpr);

    let scene = nightwork::compose_frame(viewport, args.t, args.started, cfg.scene.grain_dots);
    let frame = nightwork::CpuRasterizer::new().render(&scene);
    write_png(&args.out, &frame)?;

    eprintln!(
        "wrote {} ({}x{})",
        args.out.display(),
        frame.width,
        frame.height
    );
    Ok(())
}

fn cmd_score(args: ScoreArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let changes: Vec<nightwork::IntensityChange> = args
        .intensity_off_at
        .map(|at_seconds| nightwork::IntensityChange {
            at_seconds,
            on: false,
        })
        .into_iter()
        .collect();

    let pcm = nightwork::render_score_offline(&cfg.score, args.secs, true, &changes, args.channels)?;
    nightwork::write_pcm_f32le(&pcm, &args.out)?;

    eprintln!(
        "wrote {} ({} Hz, {} ch, f32le)",
        args.out.display(),
        cfg.score.sample_rate,
        args.channels
    );
    Ok(())
}

/// Prints captions to stdout as they appear.
struct StdoutCaptions;

impl nightwork::CaptionSink for StdoutCaptions {
    fn on_caption(&mut self, text: &str) {
        if text.is_empty() {
            tracing::debug!("caption cleared");
        } else {
            println!("{text}");
        }
    }

    fn on_narration_complete(&mut self) {
        tracing::info!("narration complete");
    }
}

#[cfg(feature = "device")]
fn device_backend() -> nightwork::NightworkResult<Box<dyn nightwork::AudioBackend>> {
    Ok(Box::new(nightwork::CpalBackend::new()))
}

#[cfg(not(feature = "device"))]
fn device_backend() -> nightwork::NightworkResult<Box<dyn nightwork::AudioBackend>> {
    tracing::info!("built without the `device` feature; score is silent");
    Ok(Box::new(nightwork::NullBackend::new()))
}

#[cfg(feature = "device")]
fn match_device_sample_rate(score: &mut nightwork::ScoreConfig) {
    if let Some(rate) = nightwork::CpalBackend::device_sample_rate() {
        score.sample_rate = rate;
    }
}

#[cfg(not(feature = "device"))]
fn match_device_sample_rate(_score: &mut nightwork::ScoreConfig) {}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let Ok(run_for) = Duration::try_from_secs_f64(args.secs) else {
        anyhow::bail!("--secs must be a finite, non-negative number of seconds");
    };
    let mut cfg = load_config(args.config.as_deref())?;
    match_device_sample_rate(&mut cfg.score);

    let spoken = if args.no_speech {
        None
    } else {
        nightwork::CommandNarrator::detect(&cfg.narration)
    };
    let narrator: Box<dyn nightwork::Narrator> = match spoken {
        Some(n) => Box::new(n),
        None => Box::new(nightwork::LogNarrator::new()),
    };

    let mut session = nightwork::PlaybackSession::builder(cfg)
        .backend_factory(device_backend)
        .caption_sink(Box::new(StdoutCaptions))
        .narrator(Some(narrator))
        .build()?;

    session.start();
    for advisory in session.take_advisories() {
        tracing::warn!(?advisory, "degraded playback");
    }

    let rasterizer = session.rasterizer().clone();
    let mut write_err: Option<anyhow::Error> = None;
    let mut written = 0u64;
    let stats = nightwork::FrameLoop::new(args.fps).run(
        &mut session,
        run_for,
        |_, out| {
            let Some(dir) = args.frames_dir.as_deref() else {
                return ControlFlow::Continue(());
            };
            let path = dir.join(format!("frame_{written:05}.png"));
            match write_png(&path, &rasterizer.render(&out.frame)) {
                Ok(()) => {
                    written += 1;
                    ControlFlow::Continue(())
                }
                Err(err) => {
                    write_err = Some(err);
                    ControlFlow::Break(())
                }
            }
        },
    );
    session.teardown();

    if let Some(err) = write_err {
        return Err(err);
    }
    eprintln!(
        "played {:.1}s: {} frames, {} dropped",
        stats.wall.as_secs_f64(),
        stats.frames,
        stats.dropped
    );
    Ok(())
}
