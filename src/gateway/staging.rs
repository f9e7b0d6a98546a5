//! Per-request staging of uploaded payloads on disk

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// Root directory under which per-request staging directories are created
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh staging directory for one request
    pub async fn stage(&self) -> Result<StagedUpload> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| infrastructure("failed to create staging root", e))?;

        let dir = tempfile::Builder::new()
            .prefix("tryon-upload-")
            .tempdir_in(&self.root)
            .map_err(|e| infrastructure("failed to create staging directory", e))?;

        debug!(path = ?dir.path(), "Created staging directory");
        Ok(StagedUpload { dir: Some(dir) })
    }
}

/// A staging directory removed when dropped or closed
#[derive(Debug)]
pub struct StagedUpload {
    dir: Option<TempDir>,
}

impl StagedUpload {
    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(|d| d.path())
    }

    /// Write `data` to `name` inside the staging directory
    pub async fn write(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let dir = self
            .path()
            .ok_or_else(|| AppError::Infrastructure("staging directory already closed".to_string()))?;
        let path = dir.join(name);

        fs::write(&path, data)
            .await
            .map_err(|e| infrastructure("failed to stage upload", e))?;

        debug!(path = ?path, size = data.len(), "Staged upload");
        Ok(path)
    }

    /// Read a staged file back
    pub async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path)
            .await
            .map_err(|e| infrastructure("failed to read staged upload", e))
    }

    /// Remove the directory now, logging instead of failing if removal goes wrong
    pub fn close(mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = ?path, error = %e, "Failed to remove staging directory");
            }
        }
    }
}

fn infrastructure(context: &str, e: std::io::Error) -> AppError {
    AppError::Infrastructure(format!("{}: {}", context, e))
}
