use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::{info, warn};
use rollcall::scanner::{FaceScanner, OnnxScanner};
use rollcall::store::EncodingStore;
use rollcall::{attendance, config, matcher, trainer, Pipeline};

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(version, about = "Classroom attendance by face recognition")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the face model from a directory of enrollment images
    Train {
        /// Directory of <name>_<id>.<jpg|jpeg|png> images (defaults to config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Mark attendance from a classroom photo
    Mark {
        /// Path to the classroom image
        image: PathBuf,
        /// Override the configured match tolerance
        #[arg(short, long)]
        tolerance: Option<f32>,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(None)?;

    match cli.command {
        Commands::Train { dir } => train(&cfg, dir),
        Commands::Mark { image, tolerance } => mark(&cfg, &image, tolerance),
        Commands::Config => open_config(),
    }
}

fn train(cfg: &config::Config, dir: Option<PathBuf>) -> Result<()> {
    let dir = dir.unwrap_or_else(|| cfg.known_faces_dir.clone());
    info!("Training model from {}", dir.display());

    let pipeline = Pipeline::load(&cfg.model_dir)
        .context("Failed to initialize face recognition pipeline")?;
    let mut scanner = OnnxScanner::new(pipeline, cfg.score_threshold, cfg.nms_threshold);

    let outcome = trainer::train(&dir, &mut scanner)?;
    outcome
        .store
        .save(&cfg.encodings_file)
        .context("Failed to save encoding store")?;

    info!("Training report:");
    info!("Successfully enrolled: {} students", outcome.enrolled());
    if !outcome.skipped.is_empty() {
        info!("Skipped files:");
        for skip in &outcome.skipped {
            warn!("  {}: {}", skip.filename, skip.reason);
        }
    }
    Ok(())
}

fn mark(cfg: &config::Config, image_path: &Path, tolerance: Option<f32>) -> Result<()> {
    let tolerance = tolerance.unwrap_or(cfg.tolerance);

    // Preconditions first: no attendance rows are written unless the store
    // loads and the classroom image decodes.
    if !cfg.encodings_file.exists() {
        anyhow::bail!("Model not trained! Run 'rollcall train' first.");
    }
    let store = EncodingStore::load(&cfg.encodings_file).context("Failed to load encoding store")?;
    if store.is_empty() {
        anyhow::bail!("Encoding store is empty. Re-run 'rollcall train' with enrollment images.");
    }

    let img = image::open(image_path)
        .with_context(|| format!("Failed to read classroom image {}", image_path.display()))?;

    let pipeline = Pipeline::load(&cfg.model_dir)
        .context("Failed to initialize face recognition pipeline")?;
    let mut scanner = OnnxScanner::new(pipeline, cfg.score_threshold, cfg.nms_threshold);

    let faces = scanner.scan(&img)?;
    info!("Detected {} face(s)", faces.len());

    let outcome = matcher::match_scan(&store, faces, tolerance);
    for (detection, face_match) in &outcome.faces {
        let [x, y, w, h] = detection.bbox;
        match face_match {
            matcher::FaceMatch::Matched { index, distance } => {
                let identity = &store.entries[*index].identity;
                info!(
                    "Face at ({x:.0},{y:.0}) {w:.0}x{h:.0}: {} (ID: {}, distance {distance:.3})",
                    identity.name, identity.id
                );
            }
            matcher::FaceMatch::Unmatched => {
                info!("Face at ({x:.0},{y:.0}) {w:.0}x{h:.0}: unmatched");
            }
        }
    }

    let path = attendance::record(&cfg.attendance_dir, &store, &outcome.present, Local::now())?;

    let roster: BTreeSet<&str> = store
        .entries
        .iter()
        .map(|e| e.identity.id.as_str())
        .collect();
    info!(
        "✓ Attendance recorded: {} present, {} absent → {}",
        outcome.present.len(),
        roster.len() - outcome.present.len(),
        path.display()
    );
    Ok(())
}

fn open_config() -> Result<()> {
    let config_path = config::CONFIG_PATH.as_os_str();
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
