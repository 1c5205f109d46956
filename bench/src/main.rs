use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use serde_json::json;
use sha2::Digest as _;

#[derive(Clone, Debug)]
struct BenchArgs {
    width: u32,
    dpr: f64,
    fps: u32,
    seconds: u32,
    warmup: u32,
    repeats: u32,
    grain_dots: u32,
    score_seconds: f64,
    report: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
struct RunMetrics {
    compose_total: Duration,
    render_total: Duration,
    score_total: Duration,
    wall_total: Duration,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = parse_args()?;

    if args.width == 0 {
        anyhow::bail!("--width must be > 0");
    }
    if args.fps == 0 || args.seconds == 0 {
        anyhow::bail!("--fps and --seconds must be > 0");
    }
    if !(args.score_seconds.is_finite() && args.score_seconds >= 0.0) {
        anyhow::bail!("--score-seconds must be finite and >= 0");
    }

    let canvas = nightwork::Canvas::from_container_width(Some(f64::from(args.width)));
    let viewport = nightwork::Viewport::new(canvas, args.dpr, nightwork::Viewport::MAX_DPR);
    let px = viewport.pixel_size();
    eprintln!(
        "scene: {}x{} layout, {}x{} pixels, {} fps, {}s, {} grain dots",
        canvas.width, canvas.height, px.width, px.height, args.fps, args.seconds, args.grain_dots
    );

    if args.warmup > 0 {
        eprintln!("warmup: {} run(s)", args.warmup);
        for _ in 0..args.warmup {
            run_once(&args, viewport)?;
        }
    }

    let mut runs = Vec::with_capacity(args.repeats as usize);
    let mut last_digest = String::new();
    for i in 0..args.repeats {
        let (m, digest) = run_once(&args, viewport)?;
        eprintln!(
            "run {i:>3}: compose={:.3}ms render={:.3}ms score={:.3}ms wall={:.3}ms",
            ms(m.compose_total),
            ms(m.render_total),
            ms(m.score_total),
            ms(m.wall_total)
        );
        if !last_digest.is_empty() && digest != last_digest {
            anyhow::bail!("run {i} produced a different final frame ({digest} vs {last_digest})");
        }
        last_digest = digest;
        runs.push(m);
    }

    report_percentiles(&runs);
    eprintln!("final frame sha256: {last_digest}");

    if let Some(path) = &args.report {
        let frames = u64::from(args.fps) * u64::from(args.seconds);
        let summary = json!({
            "width": px.width,
            "height": px.height,
            "fps": args.fps,
            "seconds": args.seconds,
            "frames": frames,
            "repeats": args.repeats,
            "final_frame_sha256": last_digest,
            "render_ms_p50": ms(percentile(&collect(&runs, |m| m.render_total), 0.50)),
            "compose_ms_p50": ms(percentile(&collect(&runs, |m| m.compose_total), 0.50)),
            "score_ms_p50": ms(percentile(&collect(&runs, |m| m.score_total), 0.50)),
        });
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create report dir '{}'", parent.display()))?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(&summary)?)
            .with_context(|| format!("write report '{}'", path.display()))?;
    }
    Ok(())
}

fn run_once(
    args: &BenchArgs,
    viewport: nightwork::Viewport,
) -> anyhow::Result<(RunMetrics, String)> {
    let wall = Instant::now();
    let mut m = RunMetrics::default();
    let rasterizer = nightwork::CpuRasterizer::new();
    let frames = u64::from(args.fps) * u64::from(args.seconds);

    let mut last = None;
    for f in 0..frames {
        let t = f as f64 / f64::from(args.fps);

        let t0 = Instant::now();
        let frame = nightwork::compose_frame(viewport, t, true, args.grain_dots);
        m.compose_total += t0.elapsed();

        let t1 = Instant::now();
        let pixels = rasterizer.render(&frame);
        m.render_total += t1.elapsed();
        last = Some(pixels);
    }

    if args.score_seconds > 0.0 {
        let t2 = Instant::now();
        let cfg = nightwork::ScoreConfig::default();
        let samples =
            nightwork::render_score_offline(&cfg, args.score_seconds, true, &[], 2)
                .context("render score")?;
        std::hint::black_box(&samples);
        m.score_total = t2.elapsed();
    }

    m.wall_total = wall.elapsed();
    let digest = last.map(|p| sha256_hex(&p.data)).unwrap_or_default();
    Ok((m, digest))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

fn parse_args() -> anyhow::Result<BenchArgs> {
    let mut args = std::env::args().skip(1);

    let mut out = BenchArgs {
        width: 1280,
        dpr: 1.0,
        fps: 30,
        seconds: 2,
        warmup: 1,
        repeats: 10,
        grain_dots: 40,
        score_seconds: 10.0,
        report: None,
    };

    while let Some(a) = args.next() {
        match a.as_str() {
            "--width" => out.width = parse_u32(args.next(), "--width")?,
            "--dpr" => out.dpr = parse_f64(args.next(), "--dpr")?,
            "--fps" => out.fps = parse_u32(args.next(), "--fps")?,
            "--seconds" => out.seconds = parse_u32(args.next(), "--seconds")?,
            "--warmup" => out.warmup = parse_u32(args.next(), "--warmup")?,
            "--repeats" => out.repeats = parse_u32(args.next(), "--repeats")?,
            "--grain" => out.grain_dots = parse_u32(args.next(), "--grain")?,
            "--score-seconds" => out.score_seconds = parse_f64(args.next(), "--score-seconds")?,
            "--report" => {
                out.report = Some(PathBuf::from(args.next().ok_or_else(|| {
                    anyhow::anyhow!("missing value for --report (expected a path)")
                })?))
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => anyhow::bail!("unknown arg '{a}' (try --help)"),
        }
    }

    Ok(out)
}

fn print_help() {
    eprintln!(
        r#"nightwork-bench

Composes and rasterizes the vignette repeatedly, synthesizes the score offline, and reports
p50/p90/p99 for each stage.

Usage:
  cargo run -q --release
  cargo run -q --release -- --width 1920 --dpr 2 --seconds 5

Args:
  --width N          layout width (default 1280)
  --dpr X            device pixel ratio, capped at 2 (default 1)
  --fps N            (default 30)
  --seconds N        scene seconds per run (default 2)
  --warmup N         (default 1)
  --repeats N        (default 10)
  --grain N          grain dots per frame (default 40)
  --score-seconds X  offline score length per run; 0 skips (default 10)
  --report PATH      write a JSON summary
"#
    );
}

fn parse_u32(v: Option<String>, flag: &str) -> anyhow::Result<u32> {
    let v = v.ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))?;
    v.parse::<u32>()
        .with_context(|| format!("parse {flag} value '{v}'"))
}

fn parse_f64(v: Option<String>, flag: &str) -> anyhow::Result<f64> {
    let v = v.ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))?;
    v.parse::<f64>()
        .with_context(|| format!("parse {flag} value '{v}'"))
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn collect(runs: &[RunMetrics], f: fn(&RunMetrics) -> Duration) -> Vec<Duration> {
    let mut v = runs.iter().map(f).collect::<Vec<_>>();
    v.sort_by_key(|d| d.as_nanos());
    v
}

fn percentile(v: &[Duration], p: f64) -> Duration {
    if v.is_empty() {
        return Duration::ZERO;
    }
    let n = v.len();
    let rank = (p * (n as f64)).ceil().clamp(1.0, n as f64) as usize;
    v[rank - 1]
}

fn report_percentiles(runs: &[RunMetrics]) {
    type Getter = fn(&RunMetrics) -> Duration;
    type Field = (&'static str, Getter);

    let fields: &[Field] = &[
        ("compose_total", |m| m.compose_total),
        ("render_total", |m| m.render_total),
        ("score_total", |m| m.score_total),
        ("wall_total", |m| m.wall_total),
    ];

    eprintln!("\npercentiles across runs (p50/p90/p99):");
    for (name, getter) in fields {
        let v = collect(runs, *getter);
        eprintln!(
            "  {name:14} p50={:>10.3}ms  p90={:>10.3}ms  p99={:>10.3}ms",
            ms(percentile(&v, 0.50)),
            ms(percentile(&v, 0.90)),
            ms(percentile(&v, 0.99)),
            name = *name,
        );
    }
}
