use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use super::error::{AppError, Result};

pub const DEFAULT_EXPORT_FILENAME: &str = "cleaned_dataset.csv";

/// How the cleaned preview is written to CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvMode {
    /// Plain comma join with no quoting and `Object.keys` header order,
    /// byte-compatible with the web client
    #[default]
    Legacy,
    /// RFC 4180 quoting for fields containing commas, quotes or newlines
    Escaped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ClientConfig {
    /// Origin of the CleanForge service, e.g. `http://localhost:8000`
    #[validate(url)]
    pub api_url: String,
    #[validate(range(min = 1, max = 3600))]
    pub request_timeout_secs: u64,
    pub download_dir: PathBuf,
    #[validate(length(min = 1))]
    pub export_filename: String,
    pub csv_mode: CsvMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 120,
            download_dir: PathBuf::from("."),
            export_filename: DEFAULT_EXPORT_FILENAME.to_string(),
            csv_mode: CsvMode::Legacy,
        }
    }
}

impl ClientConfig {
    /// Field validation plus the checks the derive cannot express
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if self.export_filename.contains(['/', '\\']) {
            return Err(AppError::ValidationError(
                "export_filename must be a bare file name".to_string(),
            ));
        }
        Ok(())
    }

    /// `{api_url}/{path}`, tolerating a trailing slash on the base
    pub fn endpoint(&self, path: &str) -> Result<url::Url> {
        let base = self.api_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let raw = if path.is_empty() {
            format!("{}/", base)
        } else {
            format!("{}/{}", base, path)
        };
        url::Url::parse(&raw)
            .map_err(|e| AppError::ConfigError(format!("Invalid endpoint URL {}: {}", raw, e)))
    }

    pub fn export_path(&self) -> PathBuf {
        self.download_dir.join(&self.export_filename)
    }
}
