//! Optional on-disk archive of try-on results

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Writes encoded results into the configured output directory
#[derive(Debug, Clone, Default)]
pub struct ResultArchive {
    output_dir: Option<PathBuf>,
}

impl ResultArchive {
    /// An archive that stores nothing
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self { output_dir }
    }

    pub fn is_enabled(&self) -> bool {
        self.output_dir.is_some()
    }

    /// Ensure the output directory exists
    async fn ensure_output_dir(&self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| AppError::Infrastructure(format!("failed to create output directory: {}", e)))?;
            debug!(path = ?dir, "Created output directory");
        }
        Ok(())
    }

    /// Save a JPEG result, returning its path when archiving is enabled
    pub async fn save_jpeg(&self, data: &[u8]) -> Result<Option<String>> {
        let Some(dir) = &self.output_dir else {
            return Ok(None);
        };
        self.ensure_output_dir(dir).await?;

        let file_path = dir.join(format!("tryon_{}.jpg", Uuid::new_v4()));
        fs::write(&file_path, data)
            .await
            .map_err(|e| AppError::Infrastructure(format!("failed to archive result: {}", e)))?;

        debug!(path = ?file_path, size = data.len(), "Archived try-on result");
        Ok(Some(file_path.to_string_lossy().to_string()))
    }
}
