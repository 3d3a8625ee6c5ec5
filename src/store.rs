use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A person enrolled from the known-faces directory. Unique by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    /// Numeric student ID, kept as the digit string from the filename.
    pub id: String,
}

/// One enrolled identity with its face embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub identity: Identity,
    pub embedding: Vec<f32>,
}

/// The trained model: an ordered list of enrollments.
///
/// Built wholesale by the trainer and replaced atomically on save; never
/// mutated incrementally. Enrollment order matters only for tie-breaking in
/// the matcher (earliest entry wins).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingStore {
    pub entries: Vec<Enrollment>,
}

impl EncodingStore {
    pub fn push(&mut self, identity: Identity, embedding: Vec<f32>) {
        self.entries.push(Enrollment {
            identity,
            embedding,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load the store from disk as a single unit. A missing file is an error
    /// for the caller to report.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        postcard::from_bytes(&data).with_context(|| format!("decoding {}", path.display()))
    }

    /// Persist the store, replacing any previous file atomically: the blob is
    /// written to a temporary sibling and renamed over the target.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = postcard::to_allocvec(self)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &data).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}
