use std::path::Path;
use std::sync::Arc;

use crate::domain::error::Result;
use crate::domain::report::{ProfileReport, SemanticAnalysis, ServiceStatus, UploadSummary};
use crate::infrastructure::api_client::CleanForgeApi;
use crate::infrastructure::csv::UploadReader;

/// One-shot calls to the service's auxiliary endpoints
pub struct InspectUseCase {
    api: Arc<dyn CleanForgeApi + Send + Sync>,
    reader: UploadReader,
}

impl InspectUseCase {
    pub fn new(api: Arc<dyn CleanForgeApi + Send + Sync>) -> Self {
        Self {
            api,
            reader: UploadReader::new(),
        }
    }

    pub async fn summary(&self, path: &Path) -> Result<UploadSummary> {
        let upload = self.reader.read(path).await?;
        self.api.upload(&upload).await
    }

    pub async fn profile(&self, path: &Path) -> Result<ProfileReport> {
        let upload = self.reader.read(path).await?;
        self.api.profile(&upload).await
    }

    pub async fn semantic(&self, path: &Path) -> Result<SemanticAnalysis> {
        let upload = self.reader.read(path).await?;
        self.api.semantic(&upload).await
    }

    pub async fn status(&self) -> Result<ServiceStatus> {
        self.api.status().await
    }
}
