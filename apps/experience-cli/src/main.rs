use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use experience::{ExperienceConfig, ExperienceSlot, SceneRoot};
use experience_assets::Manifest;
use experience_common::Size;
use experience_kernel::{ManualHost, NOMINAL_FRAME};
use experience_render::DebugTextRenderer;
use experience_tools::{DebugPanel, SceneInspector};
use experience_world::REQUIRED_ASSETS;

/// Upper bound on frames spent waiting for assets, on top of `--frames`.
const MAX_LOAD_FRAMES: u64 = 10_000;

#[derive(Parser)]
#[command(name = "experience-cli", about = "Headless runner for the experience lifecycle")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the default configuration as YAML
    Config,
    /// Check a manifest: unique names, source counts, and optionally files on disk
    Validate {
        #[arg(short, long, default_value = "config/sources.json")]
        manifest: PathBuf,
        /// Asset root to check source files against
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Run the full lifecycle headless: load, build the world, tick, tear down
    Run {
        #[arg(short, long, default_value = "config/experience.yaml")]
        config: PathBuf,
        /// Override the manifest path from the config
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Override the asset root from the config
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Frames to tick after construction
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Location fragment; `#debug` enables the debug panel
        #[arg(long)]
        fragment: Option<String>,
        /// Surface size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_size)]
        size: Option<Size>,
        /// Print the last rendered frame
        #[arg(long)]
        print_frame: bool,
    },
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let height = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok(Size::new(width, height))
}

fn load_config(path: &Path) -> anyhow::Result<ExperienceConfig> {
    if path.exists() {
        ExperienceConfig::load(path).with_context(|| format!("loading {}", path.display()))
    } else {
        tracing::warn!(path = %path.display(), "config not found, using defaults");
        Ok(ExperienceConfig::default())
    }
}

fn validate(manifest_path: &Path, root: Option<&Path>) -> anyhow::Result<()> {
    let manifest = Manifest::load(manifest_path)
        .with_context(|| format!("loading {}", manifest_path.display()))?;
    println!("Manifest: {} entries", manifest.len());
    let mut missing_files = 0;
    for entry in manifest.entries() {
        println!("  {} [{}] {} source(s)", entry.name, entry.kind, entry.path.len());
        if let Some(root) = root {
            for source in entry.sources() {
                let path = root.join(source);
                if !path.is_file() {
                    println!("    missing: {}", path.display());
                    missing_files += 1;
                }
            }
        }
    }
    let absent: Vec<&str> = REQUIRED_ASSETS
        .into_iter()
        .filter(|name| manifest.get(name).is_none())
        .collect();
    if !absent.is_empty() {
        println!("World entries not declared: {}", absent.join(", "));
    }
    if missing_files > 0 {
        bail!("{missing_files} source file(s) missing");
    }
    println!("OK");
    Ok(())
}

fn run(config: ExperienceConfig, frames: u64, size: Size, print_frame: bool) -> anyhow::Result<()> {
    let renderer = DebugTextRenderer::new(config.renderer.clone());
    let host = ManualHost::new(size);
    let mut slot = ExperienceSlot::new();
    let root = slot.try_get_or_create(|| SceneRoot::from_config(&config, host, renderer))?;

    let mut ticks = 0;
    let mut budget = frames + MAX_LOAD_FRAMES;
    while (ticks < frames || !root.is_ready()) && budget > 0 {
        budget -= 1;
        root.host_mut().advance(NOMINAL_FRAME);
        let Some(token) = root.host_mut().next_frame() else {
            break;
        };
        if root.frame(token).is_some() {
            ticks += 1;
        }
        if !root.is_ready() {
            // Give the loader threads a moment.
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    let registry = root.registry();
    println!("Assets: {}/{} resolved", registry.resolved(), registry.total());
    for (name, err) in registry.items().failed() {
        println!("  failed: {name}: {err}");
    }
    match root.world() {
        Ok(world) => println!("World: {}", world.names().join(", ")),
        Err(err) => println!("World: {err}"),
    }
    println!("{}", SceneInspector::summary(&root.stage().scene));
    let stats = root.clock().stats();
    println!(
        "Frames: {} (avg {:.2} ms, {:.1} fps, min {:?}, max {:?})",
        root.clock().frame(),
        stats.average().as_secs_f64() * 1000.0,
        stats.fps(),
        stats.min(),
        stats.max()
    );
    if print_frame {
        print!("{}", root.stage().renderer.last_frame());
    }

    if let Some(report) = slot.destroy() {
        println!("Teardown: {report}");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Info => {
            println!("experience-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", experience_kernel::crate_info());
            println!("assets: {}", experience_assets::crate_info());
            println!("render: {}", experience_render::crate_info());
            println!("tools: {}", experience_tools::crate_info());
            println!("world: {}", experience_world::crate_info());
            println!("experience: {}", experience::crate_info());
        }
        Commands::Config => {
            print!("{}", ExperienceConfig::default().to_yaml()?);
        }
        Commands::Validate { manifest, root } => validate(&manifest, root.as_deref())?,
        Commands::Run {
            config,
            manifest,
            assets,
            frames,
            fragment,
            size,
            print_frame,
        } => {
            let mut cfg = load_config(&config)?;
            if let Some(manifest) = manifest {
                cfg.assets.manifest = manifest;
            }
            if let Some(assets) = assets {
                cfg.assets.root = assets;
            }
            if let Some(fragment) = fragment {
                cfg.debug = DebugPanel::from_fragment(&fragment).is_active();
            }
            let size = size.unwrap_or(Size::new(cfg.viewport.width, cfg.viewport.height));
            run(cfg, frames, size, print_frame)?;
        }
    }

    Ok(())
}
