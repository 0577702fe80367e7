//! Per-job scratch directory.
//!
//! Intermediates for one job live in `<video_dir>/.scratch-<job-id>`. The
//! directory is only removed explicitly after success; a failed job leaves
//! it behind for inspection.

use std::path::{Path, PathBuf};

use reelsmith_common::error::ReelResult;
use uuid::Uuid;

/// Scratch directory prefix.
pub const SCRATCH_PREFIX: &str = ".scratch-";

#[derive(Debug, Clone)]
pub struct ScratchDir {
    path: PathBuf,
    job_id: Uuid,
}

impl ScratchDir {
    /// Create a fresh scratch directory under `parent`.
    pub fn create(parent: &Path) -> ReelResult<Self> {
        let job_id = Uuid::new_v4();
        let path = parent.join(format!("{SCRATCH_PREFIX}{job_id}"));
        std::fs::create_dir_all(&path)?;
        tracing::debug!(path = %path.display(), "Created scratch directory");
        Ok(Self { path, job_id })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Rendered clip for the scene at 0-based `index` in script order.
    pub fn clip(&self, index: usize) -> PathBuf {
        self.path.join(format!("clip-{:03}.mp4", index + 1))
    }

    pub fn concat_list(&self) -> PathBuf {
        self.path.join("concat.txt")
    }

    /// Silent concatenated timeline.
    pub fn combined(&self) -> PathBuf {
        self.path.join("combined.mp4")
    }

    /// Timeline with narration (and music) muxed in.
    pub fn with_audio(&self) -> PathBuf {
        self.path.join("with-audio.mp4")
    }

    /// Timeline with captions burned in.
    pub fn burned(&self) -> PathBuf {
        self.path.join("burned.mp4")
    }

    /// Delete the directory and everything in it.
    pub fn remove(self) -> ReelResult<()> {
        std::fs::remove_dir_all(&self.path)?;
        tracing::debug!(path = %self.path.display(), "Removed scratch directory");
        Ok(())
    }
}
