//! On-disk replay artifacts
//!
//! The capture side drops `<replay>.zip` (packaged clip) and
//! `<replay>.json` (metadata) into a dedicated directory. Reports attach
//! both by that naming convention.

use crate::error::{AuditError, Result};
use crate::payload::Attachment;
use crate::types::ReplayId;
use std::path::{Path, PathBuf};

pub const CLIP_EXTENSION: &str = "zip";
pub const METADATA_EXTENSION: &str = "json";

/// Directory of packaged report artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Use `dir`, creating it (and parents) if absent
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| AuditError::Artifact {
            path: dir.display().to_string(),
            reason: format!("failed to create artifact directory: {}", e),
        })?;

        tracing::debug!(dir = %dir.display(), "Artifact directory ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn clip_path(&self, id: &ReplayId) -> PathBuf {
        self.dir.join(format!("{}.{}", id.as_str(), CLIP_EXTENSION))
    }

    pub fn metadata_path(&self, id: &ReplayId) -> PathBuf {
        self.dir.join(format!("{}.{}", id.as_str(), METADATA_EXTENSION))
    }

    /// Clip then metadata, ready to hand to a transport
    pub fn attachments(&self, id: &ReplayId) -> Vec<Attachment> {
        vec![
            Attachment::from_path(self.clip_path(id)),
            Attachment::from_path(self.metadata_path(id)),
        ]
    }
}
