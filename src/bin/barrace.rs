use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context as _;
use barrace::{
    Fps, MirrorRenderer, RaceConfig, RaceError, RaceOutcome, Racer, RasterSource as _, Rgba8,
    SceneBinder, SceneLayout, TextPainter, flatten_premul_over_bg_to_opaque_rgba8,
    scene::binder::NullObserver,
    session::run::{artifact_path, build_keyframes, load_series},
};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "barrace", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a bar chart race video (MP4 requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Print the generated keyframes as JSON.
    Keyframes(RaceArgs),
    /// Render the settled scene of one keyframe as a PNG.
    Frame(FrameArgs),
}

/// Options shared by every subcommand; flags override the config file.
#[derive(Args, Debug)]
struct RaceArgs {
    /// Input table (.csv, .tsv or .txt).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// JSON race config; flags below take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of bars on screen.
    #[arg(long)]
    bars: Option<usize>,

    #[arg(long)]
    date_col: Option<String>,

    #[arg(long)]
    label_col: Option<String>,

    #[arg(long)]
    value_col: Option<String>,

    /// Field delimiter (defaults to tab for .tsv inputs).
    #[arg(long)]
    delimiter: Option<char>,

    /// Keyframes interpolated per pair of observations.
    #[arg(long)]
    steps: Option<usize>,

    /// strftime pattern for calendar dates on the ticker.
    #[arg(long)]
    ticker_format: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    race: RaceArgs,

    /// Output path for the artifact.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Duration of each keyframe transition in milliseconds.
    #[arg(long)]
    duration_ms: Option<u64>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Output frame rate (integer frames per second).
    #[arg(long)]
    fps: Option<u32>,

    /// Regular-weight font file.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Bold font file; falls back to the regular font.
    #[arg(long)]
    bold_font: Option<PathBuf>,

    /// Write raw RGBA frames instead of MP4.
    #[arg(long)]
    raw: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    race: RaceArgs,

    /// Keyframe index (0-based).
    #[arg(long)]
    keyframe: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(long)]
    bold_font: Option<PathBuf>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Keyframes(args) => cmd_keyframes(args),
        Command::Frame(args) => cmd_frame(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            // Bad input or configuration exits with 2, everything else with 1.
            match err.downcast_ref::<RaceError>() {
                Some(e) if e.is_input_error() => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn race_config(args: &RaceArgs) -> anyhow::Result<RaceConfig> {
    let mut cfg = match &args.config {
        Some(path) => RaceConfig::load(path)?,
        None => RaceConfig::default(),
    };
    cfg.input_file = Some(args.in_path.clone());
    if let Some(n) = args.bars {
        cfg.visible_bar_count = n;
    }
    if let Some(c) = &args.date_col {
        cfg.date_column = c.clone();
    }
    if let Some(c) = &args.label_col {
        cfg.label_column = c.clone();
    }
    if let Some(c) = &args.value_col {
        cfg.value_column = c.clone();
    }
    match args.delimiter {
        Some(d) => cfg.delimiter = d,
        None if args.config.is_none() && is_tsv(&args.in_path) => cfg.delimiter = '\t',
        None => {}
    }
    if let Some(k) = args.steps {
        cfg.interpolation_steps = k;
    }
    if let Some(p) = &args.ticker_format {
        cfg.ticker_format = p.clone();
    }
    Ok(cfg)
}

fn is_tsv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tsv"))
}

fn apply_canvas(cfg: &mut RaceConfig, width: Option<u32>, height: Option<u32>) {
    if let Some(w) = width {
        cfg.canvas.width = w;
    }
    if let Some(h) = height {
        cfg.canvas.height = h;
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = race_config(&args.race)?;
    apply_canvas(&mut cfg, args.width, args.height);
    if let Some(ms) = args.duration_ms {
        cfg.transition_ms = ms;
    }
    if let Some(fps) = args.fps {
        cfg.fps = Fps::new(fps, 1)?;
    }
    if args.font.is_some() {
        cfg.font = args.font;
    }
    if args.bold_font.is_some() {
        cfg.bold_font = args.bold_font;
    }
    if args.raw {
        cfg.encoder = barrace::EncoderKind::Raw;
    }
    cfg.output = match args.out {
        Some(out) => out,
        None => artifact_path(&cfg),
    };

    let mut racer = Racer::new();
    match racer.run(&cfg)? {
        RaceOutcome::Skipped => {
            tracing::warn!(input = %args.race.in_path.display(), "not a tabular file; nothing rendered");
        }
        RaceOutcome::Completed(report) => {
            tracing::info!(
                keyframes = report.keyframes,
                frames = report.frames,
                bytes = report.artifact.bytes,
                "race rendered"
            );
            println!("{}", report.artifact.url());
        }
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct KeyframeView<'a> {
    index: usize,
    timestamp: f64,
    ticker: String,
    entries: Vec<EntryView<'a>>,
}

#[derive(serde::Serialize)]
struct EntryView<'a> {
    name: &'a str,
    value: f64,
    rank: usize,
}

fn cmd_keyframes(args: RaceArgs) -> anyhow::Result<()> {
    let cfg = race_config(&args)?;
    cfg.validate()?;
    let Some(series) = load_series(&cfg)? else {
        anyhow::bail!("'{}' is not a tabular file", args.in_path.display());
    };
    let set = build_keyframes(&cfg, &series)?;

    let view: Vec<KeyframeView<'_>> = set
        .keyframes()
        .iter()
        .enumerate()
        .map(|(index, kf)| KeyframeView {
            index,
            timestamp: kf.timestamp,
            ticker: series.time().format(kf.timestamp),
            entries: kf
                .entries
                .iter()
                .map(|e| EntryView {
                    name: series.universe().name(e.entity),
                    value: e.value,
                    rank: e.rank,
                })
                .collect(),
        })
        .collect();
    let json = serde_json::to_string_pretty(&view).context("serialize keyframes")?;
    println!("{json}");
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut cfg = race_config(&args.race)?;
    apply_canvas(&mut cfg, args.width, args.height);
    if args.font.is_some() {
        cfg.font = args.font;
    }
    if args.bold_font.is_some() {
        cfg.bold_font = args.bold_font;
    }
    // A still frame never reaches the encoder, so odd sizes are fine.
    cfg.encoder = barrace::EncoderKind::Raw;
    cfg.validate()?;

    let Some(series) = load_series(&cfg)? else {
        anyhow::bail!("'{}' is not a tabular file", args.race.in_path.display());
    };
    let set = build_keyframes(&cfg, &series)?;
    if args.keyframe >= set.len() {
        anyhow::bail!(
            "keyframe {} out of range ({} keyframes)",
            args.keyframe,
            set.len()
        );
    }

    let layout = SceneLayout::new(cfg.canvas, cfg.visible_bar_count)?;
    let mut binder = SceneBinder::new(layout, &series);
    let spec = cfg.transition();
    for index in 0..=args.keyframe {
        binder.bind_frame(&set, index, &spec, &mut NullObserver)?;
    }

    let text = TextPainter::load(cfg.font.as_deref(), cfg.bold_font.as_deref())?;
    let mut mirror = MirrorRenderer::new(cfg.canvas, text)?;
    mirror.render(binder.scene())?;
    let frame = mirror.frame();
    let mut straight = vec![0u8; frame.data.len()];
    flatten_premul_over_bg_to_opaque_rgba8(&mut straight, &frame.data, Rgba8::WHITE.to_array())?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &straight,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
