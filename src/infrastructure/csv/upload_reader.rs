// ============================================================
// UPLOAD READER
// ============================================================
// Read a local CSV for upload, normalizing its encoding to UTF-8

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use std::path::Path;

use crate::domain::error::{AppError, Result};

/// File contents prepared for the multipart `file` part
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Label of the encoding the file was decoded from
    pub source_encoding: &'static str,
}

/// Reads CSV files and normalizes them to UTF-8
pub struct UploadReader {
    /// Maximum accepted file size in bytes
    max_bytes: u64,
}

impl Default for UploadReader {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024, // 100MB
        }
    }
}

impl UploadReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Read `path` and return a UTF-8 payload
    pub async fn read(&self, path: &Path) -> Result<UploadPayload> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            AppError::IoError(format!("Cannot read {}: {}", path.display(), e))
        })?;

        if !metadata.is_file() {
            return Err(AppError::ValidationError(format!(
                "{} is not a file",
                path.display()
            )));
        }
        if metadata.len() == 0 {
            return Err(AppError::ValidationError(format!(
                "{} is empty",
                path.display()
            )));
        }
        if metadata.len() > self.max_bytes {
            return Err(AppError::ValidationError(format!(
                "{} is larger than {} bytes",
                path.display(),
                self.max_bytes
            )));
        }

        let has_csv_extension = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !has_csv_extension {
            tracing::warn!(file = %path.display(), "Uploading a file without a .csv extension");
        }

        let raw = tokio::fs::read(path).await.map_err(|e| {
            AppError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let (bytes, source_encoding) = Self::normalize(raw);

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.csv".to_string());

        Ok(UploadPayload {
            file_name,
            bytes,
            source_encoding,
        })
    }

    /// Convert raw bytes to UTF-8 without a BOM.
    ///
    /// A BOM decides the encoding when present. Otherwise valid UTF-8 is
    /// passed through and anything else is decoded as windows-1252.
    pub fn normalize(raw: Vec<u8>) -> (Vec<u8>, &'static str) {
        if let Some((encoding, bom_len)) = Encoding::for_bom(&raw) {
            if encoding == UTF_8 {
                return (raw[bom_len..].to_vec(), encoding.name());
            }
            let (decoded, _) = encoding.decode_without_bom_handling(&raw[bom_len..]);
            return (decoded.into_owned().into_bytes(), encoding.name());
        }

        if std::str::from_utf8(&raw).is_ok() {
            return (raw, UTF_8.name());
        }

        let (decoded, _, _) = WINDOWS_1252.decode(&raw);
        (decoded.into_owned().into_bytes(), WINDOWS_1252.name())
    }
}
