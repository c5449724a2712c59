//! `glint`: render a sphere scene progressively and write it as PNG.
//!
//! Plays the platform role for the renderer: owns the output image, feeds
//! scripted key state frame by frame and saves the result.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use glint_core::{Scene, ScenePreset};
use glint_renderer::{Image, LaneWidth, RenderConfig, RenderParams, RenderSession};

mod script;

use script::InputScript;

#[derive(Parser)]
#[command(name = "glint")]
#[command(version)]
#[command(about = "Glint: progressive SIMD sphere path tracer", long_about = None)]
struct Cli {
    /// Built-in scene (random, showcase, lights)
    #[arg(short, long, default_value = "random")]
    scene: ScenePreset,

    /// Load the scene from a JSON file instead of a preset
    #[arg(long, conflicts_with = "scene")]
    scene_file: Option<PathBuf>,

    /// Render configuration JSON; flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Image width in pixels
    #[arg(short = 'W', long, default_value = "640")]
    width: u32,

    /// Image height in pixels
    #[arg(short = 'H', long, default_value = "360")]
    height: u32,

    /// Frames to render (one sample per pixel each)
    #[arg(short, long, default_value = "64")]
    frames: u32,

    /// SIMD lane width (scalar, x4, x8)
    #[arg(short, long)]
    lanes: Option<LaneWidth>,

    /// Worker threads in the pool (0 = all cores)
    #[arg(long)]
    workers: Option<usize>,

    /// Workers released per frame (defaults to the pool size)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Maximum bounces per path
    #[arg(long)]
    bounces: Option<u32>,

    /// Tile size in pixels
    #[arg(long)]
    tile_size: Option<u32>,

    /// Random seed for the worker streams
    #[arg(long)]
    seed: Option<u64>,

    /// Scripted camera keys, e.g. "a:16,w+space:8"
    #[arg(long, default_value = "")]
    orbit: InputScript,

    /// Output PNG path
    #[arg(short, long, default_value = "glint.png")]
    output: PathBuf,

    /// Also write a numbered snapshot every N frames
    #[arg(long)]
    snapshot_every: Option<u32>,

    /// Write the scene as JSON and exit
    #[arg(long)]
    dump_scene: Option<PathBuf>,
}

impl Cli {
    fn load_scene(&self) -> Result<Scene> {
        match &self.scene_file {
            Some(path) => Scene::from_json_file(path)
                .with_context(|| format!("Failed to load scene {}", path.display())),
            None => Ok(self.scene.build()),
        }
    }

    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RenderConfig::default(),
        };
        if let Some(lanes) = self.lanes {
            config.lane_width = lanes;
        }
        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(bounces) = self.bounces {
            config.max_bounces = bounces;
        }
        if let Some(tile_size) = self.tile_size {
            config.tile_size = tile_size;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }
}

fn snapshot_path(output: &Path, frame: u32) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "glint".to_string());
    output.with_file_name(format!("{stem}_{frame:04}.png"))
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let scene = cli.load_scene()?;

    if let Some(path) = &cli.dump_scene {
        std::fs::write(path, scene.to_json_string()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote scene '{}' to {}", scene.name, path.display());
        return Ok(());
    }

    let config = cli.render_config()?;
    let mut session = RenderSession::new(&scene, config)?;
    let params = RenderParams::new(cli.threads.unwrap_or(session.worker_count()));
    let mut image = Image::new(cli.width, cli.height);

    log::info!(
        "Rendering {}x{} for {} frames with {} of {} workers",
        cli.width,
        cli.height,
        cli.frames,
        params.thread_count,
        session.worker_count()
    );

    let start = Instant::now();
    for frame in 0..cli.frames {
        let input = cli.orbit.keys_for(frame);
        // No display deadline here: every frame is rendered to completion
        session.wait();
        let presented = session.render(&mut image, &input, params)?;

        if presented {
            log::debug!("Frame {}: {} samples", frame, session.sample_count());
            if let Some(every) = cli.snapshot_every.filter(|&every| every > 0) {
                if frame % every == 0 {
                    let path = snapshot_path(&cli.output, frame);
                    image
                        .save_png(&path)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                }
            }
        }
    }
    session.finish(&mut image);

    image
        .save_png(&cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    log::info!(
        "Wrote {} ({} samples per pixel) in {:.2?}",
        cli.output.display(),
        session.sample_count(),
        start.elapsed()
    );

    Ok(())
}
