//! Builds the encoding store from a directory of enrollment images.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use thiserror::Error;

use crate::enroll::{self, RejectReason};
use crate::scanner::FaceScanner;
use crate::store::{EncodingStore, Identity};

/// Why an enrollment image was not enrolled.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("{0}")]
    Rejected(#[from] RejectReason),
    #[error("no faces detected")]
    NoFaces,
    #[error("multiple faces detected ({0})")]
    MultipleFaces(usize),
    #[error("{0}")]
    Unreadable(String),
}

#[derive(Debug)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: SkipReason,
}

/// Result of one training run: the store built from every accepted image,
/// plus every file that was skipped and why.
#[derive(Debug)]
pub struct TrainOutcome {
    pub store: EncodingStore,
    pub skipped: Vec<SkippedFile>,
}

impl TrainOutcome {
    pub fn enrolled(&self) -> usize {
        self.store.len()
    }
}

/// Build an encoding store from a directory of `<name>_<id>.<ext>` images.
///
/// Files are processed in filename order. Per-file failures (bad name, zero
/// or multiple faces, unreadable image) are recorded as skips and never abort
/// the run; only a failure to list the directory does.
pub fn train(dir: &Path, scanner: &mut dyn FaceScanner) -> Result<TrainOutcome> {
    let mut filenames = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            filenames.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    filenames.sort();

    let mut store = EncodingStore::default();
    let mut skipped = Vec::new();

    for filename in filenames {
        match enroll_file(dir, &filename, scanner) {
            Ok((identity, embedding)) => {
                info!("✓ enrolled {} (ID: {})", identity.name, identity.id);
                store.push(identity, embedding);
            }
            Err(reason) => {
                warn!("skipped {}: {}", filename, reason);
                skipped.push(SkippedFile { filename, reason });
            }
        }
    }

    Ok(TrainOutcome { store, skipped })
}

/// Process a single candidate image. Exactly one detected face enrolls;
/// anything else is a skip.
fn enroll_file(
    dir: &Path,
    filename: &str,
    scanner: &mut dyn FaceScanner,
) -> Result<(Identity, Vec<f32>), SkipReason> {
    let identity = enroll::validate_filename(filename)?;

    let img = image::open(dir.join(filename))
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let mut faces = scanner
        .scan(&img)
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?;

    if faces.len() > 1 {
        return Err(SkipReason::MultipleFaces(faces.len()));
    }
    match faces.pop() {
        Some(face) => Ok((identity, face.embedding)),
        None => Err(SkipReason::NoFaces),
    }
}
