//! Panotour CLI - build tile pyramids and a tour document from panoramas.
//!
//! Scenes are processed in parallel; within each scene the stages run in
//! order: extract (external rectifier), tile, fallback, thumbnail. A
//! single failing scene is reported and skipped so the rest of the batch
//! still completes; only a missing rectification binary aborts outright.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rayon::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use panotour::{MetadataSet, NonaRectifier, Scene, Tour, TourOptions};

/// Aspect ratio of generated thumbnails (width over height).
const THUMBNAIL_ASPECT: f64 = 4.0;

/// Width of generated thumbnails in pixels.
const THUMBNAIL_WIDTH: u32 = 400;

#[derive(Debug, Parser)]
#[command(name = "panotour", version, about = "Pannellum tour configurator")]
struct Cli {
    /// Panoramic source images
    #[arg(required = true)]
    panoramas: Vec<PathBuf>,

    /// JSON file with per-scene metadata records
    #[arg(short, long)]
    metadata: PathBuf,

    /// Output path for the tour configuration document
    #[arg(short, long, default_value = "tour.json")]
    output: PathBuf,

    /// Root directory tile pyramids are written under
    #[arg(short, long, default_value = "tiles")]
    tiles: PathBuf,

    /// Scratch directory for intermediate face rasters
    #[arg(long, default_value = "work")]
    work_dir: PathBuf,

    /// Document author
    #[arg(short, long)]
    author: Option<String>,

    /// Scene shown first, defaults to the first argument
    #[arg(long)]
    first_scene: Option<String>,

    /// Auto-rotation speed in degrees per second
    #[arg(long)]
    auto_rotate: Option<f64>,

    /// Scene fade duration in milliseconds
    #[arg(long)]
    fade: Option<u32>,

    /// Regenerate tiles even when output already exists
    #[arg(short, long)]
    force: bool,

    /// Indented, sorted document plus viewer debug flags
    #[arg(short, long)]
    debug: bool,

    /// Be verbose (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to read metadata file {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse metadata file {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Rectify(#[from] panotour::RectifyError),

    #[error(transparent)]
    Tour(#[from] panotour::TourError),

    #[error("Failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_metadata(path: &PathBuf) -> Result<MetadataSet, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::MetadataRead {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::MetadataParse {
        path: path.clone(),
        source,
    })
}

fn run(cli: Cli) -> Result<(), CliError> {
    let metadata = load_metadata(&cli.metadata)?;

    // Fatal once at startup: without the rectifier no scene can produce
    // anything.
    let rectifier = NonaRectifier::locate()?;

    let mut options = TourOptions::default().with_debug(cli.debug);
    if let Some(author) = &cli.author {
        options = options.with_author(author.clone());
    }
    if let Some(first) = &cli.first_scene {
        options = options.with_first_scene(first.clone());
    }
    if let Some(speed) = cli.auto_rotate {
        options = options.with_auto_rotate(speed);
    }
    if let Some(fade) = cli.fade {
        options = options.with_scene_fade_duration(fade);
    }

    let mut tour = Tour::new(options, metadata);
    for panorama in &cli.panoramas {
        let scene_id = panotour::scene_id_from_path(panorama);
        let Some(meta) = tour.metadata().get(&scene_id).cloned() else {
            warn!(scene_id = %scene_id, "no metadata record, skipping panorama");
            continue;
        };
        match Scene::new(panorama, meta, &cli.tiles, &cli.work_dir) {
            Ok(scene) => tour.add_scene(scene),
            // Too-small sources are fatal for the scene, not the batch.
            Err(e) => error!(scene_id = %scene_id, error = %e, "scene rejected"),
        }
    }

    let force = cli.force;
    tour.scenes_mut().par_iter_mut().for_each(|scene| {
        let result = scene
            .extract(&rectifier)
            .and_then(|_| scene.tile(force).map(|_| ()))
            .and_then(|_| scene.finalize(THUMBNAIL_ASPECT, THUMBNAIL_WIDTH));
        match result {
            Ok(()) => info!(scene_id = %scene.scene_id(), "scene complete"),
            Err(e) => error!(scene_id = %scene.scene_id(), error = %e, "scene failed"),
        }
    });

    let json = tour.to_json()?;
    fs::write(&cli.output, json).map_err(|source| CliError::OutputWrite {
        path: cli.output.clone(),
        source,
    })?;
    info!(output = %cli.output.display(), "tour document written");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
