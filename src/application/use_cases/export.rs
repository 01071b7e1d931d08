use std::path::PathBuf;

use crate::domain::client_config::ClientConfig;
use crate::domain::error::Result;
use crate::domain::preview::TabularPreview;
use crate::infrastructure::csv::CsvEncoder;
use crate::infrastructure::storage::DownloadTarget;

/// Encode a cleaned preview and save it as a download
pub struct ExportUseCase {
    encoder: CsvEncoder,
    target: DownloadTarget,
}

impl ExportUseCase {
    pub fn new(encoder: CsvEncoder, target: DownloadTarget) -> Self {
        Self { encoder, target }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            CsvEncoder::new(config.csv_mode),
            DownloadTarget::new(&config.download_dir, &config.export_filename),
        )
    }

    /// Absent or empty previews are a silent no-op.
    pub fn execute(&self, preview: Option<&TabularPreview>) -> Result<Option<PathBuf>> {
        let preview = match preview {
            Some(preview) if !preview.is_empty() => preview,
            _ => {
                tracing::debug!("No cleaned preview to export");
                return Ok(None);
            }
        };

        let encoded = self.encoder.encode(preview)?;
        let path = self.target.deliver(&encoded)?;
        Ok(Some(path))
    }
}
