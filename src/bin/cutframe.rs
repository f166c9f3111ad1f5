use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cutframe::{
    Fps, Host, InMemoryEffects, InMemoryMediaRegistry, InMemoryStore, ManualClock, MediaHandle,
    MediaLookup, PreviewOpts, PreviewSession, PreviewSize, Timeline, resolve_active,
};

#[derive(Parser, Debug)]
#[command(name = "cutframe", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one composited preview frame as a PNG.
    Frame(FrameArgs),
    /// Print the elements active at a time as JSON.
    Active(ActiveArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input timeline JSON.
    #[arg(long)]
    timeline: PathBuf,

    /// Playback time in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Preview width in pixels; height follows the canvas aspect ratio. Defaults to the canvas.
    #[arg(long)]
    preview_width: Option<f64>,

    /// Effects JSON: a map from element id to a list of effect entries.
    #[arg(long)]
    effects: Option<PathBuf>,

    /// Draw selection handles around this element.
    #[arg(long)]
    select: Option<String>,

    /// Go through the frame cache (and its persistence directory) instead of a live draw.
    #[arg(long)]
    cached: bool,

    #[command(flatten)]
    opts: OptsArgs,
}

#[derive(Parser, Debug)]
struct ActiveArgs {
    /// Input timeline JSON.
    #[arg(long)]
    timeline: PathBuf,

    /// Playback time in seconds.
    #[arg(long)]
    time: f64,
}

#[derive(clap::Args, Debug)]
struct OptsArgs {
    /// Preview options JSON; flags below override it.
    #[arg(long = "opts")]
    opts_path: Option<PathBuf>,

    /// Cache quantization rate as `num/den` or a whole number.
    #[arg(long)]
    fps: Option<String>,

    /// Directory for persisted frames.
    #[arg(long)]
    persist_dir: Option<PathBuf>,

    /// Key prefix for persisted frames.
    #[arg(long)]
    project_id: Option<String>,
}

impl OptsArgs {
    fn resolve(&self) -> anyhow::Result<PreviewOpts> {
        let mut opts = match &self.opts_path {
            Some(path) => PreviewOpts::from_json_path(path)?,
            None => PreviewOpts::default(),
        };
        if let Some(fps) = &self.fps {
            opts.fps = parse_fps(fps)?;
        }
        if let Some(dir) = &self.persist_dir {
            opts.persist_dir = Some(dir.clone());
        }
        if let Some(id) = &self.project_id {
            opts.project_id = id.clone();
        }
        Ok(opts)
    }
}

fn parse_fps(s: &str) -> anyhow::Result<Fps> {
    let (num, den) = s.split_once('/').unwrap_or((s, "1"));
    let num: u32 = num.trim().parse().with_context(|| format!("parse fps '{s}'"))?;
    let den: u32 = den.trim().parse().with_context(|| format!("parse fps '{s}'"))?;
    Ok(Fps::new(num, den)?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Active(args) => cmd_active(args),
    }
}

fn read_timeline(path: &Path) -> anyhow::Result<Timeline> {
    Ok(Timeline::from_path(path)?)
}

/// Media ids are file paths relative to the timeline file.
fn load_media(timeline: &Timeline, root: &Path) -> InMemoryMediaRegistry {
    let mut registry = InMemoryMediaRegistry::new();
    let ids = timeline
        .tracks
        .iter()
        .flat_map(|t| &t.elements)
        .filter_map(|e| e.kind.media_id());
    for id in ids {
        let path = root.join(id);
        if !path.exists() {
            tracing::warn!(media_id = id, path = %path.display(), "media file not found");
            continue;
        }
        match image::open(&path) {
            Ok(img) => registry.insert_ready(MediaHandle::image(id, img.to_rgba8())),
            Err(err) => registry.insert(id, MediaLookup::Errored(err.to_string())),
        }
    }
    registry
}

fn read_effects(path: Option<&Path>) -> anyhow::Result<InMemoryEffects> {
    let Some(path) = path else {
        return Ok(InMemoryEffects::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read effects '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| "parse effects JSON")
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let timeline = read_timeline(&args.timeline)?;
    let root = args.timeline.parent().unwrap_or_else(|| Path::new("."));
    let media = load_media(&timeline, root);
    let effects = read_effects(args.effects.as_deref())?;
    let opts = args.opts.resolve()?;

    let canvas = timeline.settings.canvas;
    let preview = PreviewSize::fit_width(
        canvas,
        args.preview_width.unwrap_or(f64::from(canvas.width)),
    );
    let store = InMemoryStore::new(timeline);
    let clock = ManualClock::paused_at(args.time);
    let host = Host {
        media: &media,
        effects: &effects,
        clock: &clock,
    };

    let mut session = PreviewSession::new(opts, preview);
    session.select(args.select.as_deref());
    let frame = if args.cached {
        session
            .render_cached(&store, &host, args.time)
            .context("frame render failed")?
    } else {
        session.render_frame(&store, &host)?
    };

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    let stats = session.cache_stats();
    tracing::debug!(?stats, "cache stats");
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_active(args: ActiveArgs) -> anyhow::Result<()> {
    let timeline = read_timeline(&args.timeline)?;
    let root = args.timeline.parent().unwrap_or_else(|| Path::new("."));
    let media = load_media(&timeline, root);

    let active = resolve_active(&timeline.tracks, args.time, &media);
    let rows: Vec<serde_json::Value> = active
        .iter()
        .map(|a| {
            serde_json::json!({
                "id": a.element.id,
                "track_id": a.track.id,
                "track_index": a.track_index,
                "variant": a.element.variant(),
                "media": a.media_state,
                "source_time": a.source_time(args.time),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
