use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use tpg_explainer::{
    core::{Canvas, Fps},
    pipeline::{self, RenderThreading, RenderToMp4Opts},
    render::CpuRenderer,
    scenes::{self, SCENE_NAMES, ScriptConfig},
    text::{TextLayoutEngine, load_font_bytes},
};

#[derive(Parser, Debug)]
#[command(name = "tpg-explainer", version)]
struct Cli {
    /// Explicit TTF/OTF font file (defaults to a system sans-serif).
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Frames per second for all scenes.
    #[arg(long, global = true, default_value_t = 60)]
    fps: u32,

    /// Seed for scripted "random" choices (jitter, segment colors).
    #[arg(long, global = true, default_value_t = 7)]
    seed: u64,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame of one scene as a PNG.
    Frame(FrameArgs),
    /// Render scenes to an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Dump a compiled scene timeline as JSON.
    Dump(DumpArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Scene name (challenge | tpg | evolution | hierarchy | result).
    scene: String,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Output width in pixels.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 1080)]
    height: u32,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Scene name, or omit to render the whole video.
    #[arg(long)]
    scene: Option<String>,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Output width in pixels (must be even).
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Output height in pixels (must be even).
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Render frames on a rayon pool instead of sequentially.
    #[arg(long)]
    parallel: bool,

    /// Worker thread count (defaults to the rayon global default).
    #[arg(long)]
    threads: Option<usize>,

    /// Frames per parallel chunk.
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Scene name (challenge | tpg | evolution | hierarchy | result).
    scene: String,

    /// Output JSON path (stdout if omitted).
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = ScriptConfig {
        fps: Fps::new(cli.fps, 1)?,
        seed: cli.seed,
    };
    let mut fonts = load_fonts(cli.font.as_deref())?;

    match cli.cmd {
        Command::Frame(args) => cmd_frame(args, &cfg, &mut fonts),
        Command::Render(args) => cmd_render(args, &cfg, &mut fonts),
        Command::Dump(args) => cmd_dump(args, &cfg, &mut fonts),
    }
}

fn load_fonts(explicit: Option<&std::path::Path>) -> anyhow::Result<TextLayoutEngine> {
    let bytes = load_font_bytes(explicit).context("load font")?;
    let engine = TextLayoutEngine::new(bytes)?;
    tracing::debug!(family = engine.family_name(), "using font");
    Ok(engine)
}

fn cmd_frame(args: FrameArgs, cfg: &ScriptConfig, fonts: &mut TextLayoutEngine) -> anyhow::Result<()> {
    let scene = scenes::scene_by_name(&args.scene, cfg, fonts)?;
    scene.validate()?;

    let canvas = Canvas {
        width: args.width,
        height: args.height,
    };
    let mut renderer = CpuRenderer::new(canvas)?;
    let frame = pipeline::render_frame(
        &scene,
        tpg_explainer::core::FrameIndex(args.frame),
        &mut renderer,
    )?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    // The rasterizer emits premultiplied RGBA; flatten over the scene
    // background for an opaque PNG.
    let rgba = tpg_explainer::encode::frame_to_opaque_rgba8(&frame, tpg_explainer::color::BACKGROUND)?;
    image::save_buffer_with_format(
        &args.out,
        &rgba,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs, cfg: &ScriptConfig, fonts: &mut TextLayoutEngine) -> anyhow::Result<()> {
    let scenes = match &args.scene {
        Some(name) => vec![scenes::scene_by_name(name, cfg, fonts)?],
        None => scenes::all(cfg, fonts)?,
    };

    let canvas = Canvas {
        width: args.width,
        height: args.height,
    };
    let opts = RenderToMp4Opts {
        overwrite: true,
        threading: RenderThreading {
            parallel: args.parallel,
            chunk_size: args.chunk_size,
            threads: args.threads,
        },
    };
    let stats = pipeline::render_scenes_to_mp4(&scenes, canvas, &args.out, &opts)?;

    eprintln!(
        "wrote {} ({} frames, {} scenes)",
        args.out.display(),
        stats.frames_rendered,
        stats.scenes
    );
    Ok(())
}

fn cmd_dump(args: DumpArgs, cfg: &ScriptConfig, fonts: &mut TextLayoutEngine) -> anyhow::Result<()> {
    anyhow::ensure!(
        SCENE_NAMES.contains(&args.scene.as_str()),
        "unknown scene '{}' (expected one of {})",
        args.scene,
        SCENE_NAMES.join(" | ")
    );
    let scene = scenes::scene_by_name(&args.scene, cfg, fonts)?;
    scene.validate()?;

    let json = serde_json::to_string_pretty(&scene).context("serialize scene")?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("write json '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
