use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::error::{AppError, Result};
use crate::infrastructure::csv::EncodedCsv;

pub fn ensure_download_dir(dir: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(dir)?;
    Ok(dir.to_path_buf())
}

/// Where exported files are saved.
///
/// Content is staged in a temporary file next to the destination and
/// renamed into place. The staged file is removed if anything fails
/// before the rename.
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    dir: PathBuf,
    file_name: String,
}

impl DownloadTarget {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    pub fn deliver(&self, csv: &EncodedCsv) -> Result<PathBuf> {
        let dir = ensure_download_dir(&self.dir).map_err(|e| {
            AppError::IoError(format!(
                "Failed to create download dir {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut staged = tempfile::Builder::new()
            .prefix(".cleanforge-")
            .suffix(".part")
            .tempfile_in(&dir)?;
        staged.write_all(csv.as_bytes())?;
        staged.flush()?;

        let destination = self.path();
        staged.persist(&destination).map_err(|e| {
            AppError::IoError(format!(
                "Failed to save {}: {}",
                destination.display(),
                e.error
            ))
        })?;

        tracing::info!(
            file = %destination.display(),
            mime = csv.mime_type,
            rows = csv.rows,
            "Saved export"
        );
        Ok(destination)
    }
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
