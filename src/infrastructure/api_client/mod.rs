pub mod decode;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

use crate::domain::client_config::ClientConfig;
use crate::domain::error::{AppError, Result};
use crate::domain::report::{
    AnalysisReport, CleanReport, ProfileReport, SemanticAnalysis, ServiceStatus, UploadSummary,
};
use crate::infrastructure::csv::UploadPayload;

/// Multipart field the service reads the upload from
pub const FILE_FIELD: &str = "file";
const UPLOAD_CONTENT_TYPE: &str = "text/csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Status,
    Upload,
    Profile,
    Semantic,
    Analyze,
    Clean,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Status => "",
            Endpoint::Upload => "upload",
            Endpoint::Profile => "profile",
            Endpoint::Semantic => "semantic",
            Endpoint::Analyze => "analyze",
            Endpoint::Clean => "clean",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Status => "/",
            Endpoint::Upload => "/upload",
            Endpoint::Profile => "/profile",
            Endpoint::Semantic => "/semantic",
            Endpoint::Analyze => "/analyze",
            Endpoint::Clean => "/clean",
        }
    }
}

#[async_trait]
pub trait CleanForgeApi {
    async fn analyze(&self, upload: &UploadPayload) -> Result<AnalysisReport>;
    async fn clean(&self, upload: &UploadPayload) -> Result<CleanReport>;
    async fn profile(&self, upload: &UploadPayload) -> Result<ProfileReport>;
    async fn semantic(&self, upload: &UploadPayload) -> Result<SemanticAnalysis>;
    async fn upload(&self, upload: &UploadPayload) -> Result<UploadSummary>;
    async fn status(&self) -> Result<ServiceStatus>;
}

/// reqwest-backed client for the CleanForge service
pub struct HttpApiClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn form(upload: &UploadPayload) -> Result<Form> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(UPLOAD_CONTENT_TYPE)
            .map_err(|e| AppError::Internal(format!("Invalid upload content type: {}", e)))?;
        Ok(Form::new().part(FILE_FIELD, part))
    }

    /// Send the request and return the body of a 2xx response.
    /// Every other status is the same failure regardless of code.
    async fn send(&self, endpoint: Endpoint, request: reqwest::RequestBuilder) -> Result<String> {
        let start = std::time::Instant::now();
        let response = request.send().await.map_err(|e| {
            tracing::error!(endpoint = endpoint.name(), error = %e, "Request failed");
            AppError::NetworkError(format!("{} request failed: {}", endpoint.name(), e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(
                endpoint = endpoint.name(),
                status = status.as_u16(),
                body_len = text.len(),
                "Service returned an error status"
            );
            return Err(AppError::HttpStatus {
                endpoint: endpoint.name().to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| {
            AppError::NetworkError(format!(
                "Failed to read {} response body: {}",
                endpoint.name(),
                e
            ))
        })?;
        tracing::debug!(
            endpoint = endpoint.name(),
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            body_len = body.len(),
            "Response received"
        );
        Ok(body)
    }

    async fn post_file(&self, endpoint: Endpoint, upload: &UploadPayload) -> Result<String> {
        let url = self.config.endpoint(endpoint.path())?;
        tracing::info!(
            endpoint = endpoint.name(),
            file = %upload.file_name,
            bytes = upload.bytes.len(),
            source_encoding = upload.source_encoding,
            "Uploading dataset"
        );
        let request = self.client.post(url).multipart(Self::form(upload)?);
        self.send(endpoint, request).await
    }
}

#[async_trait]
impl CleanForgeApi for HttpApiClient {
    async fn analyze(&self, upload: &UploadPayload) -> Result<AnalysisReport> {
        let body = self.post_file(Endpoint::Analyze, upload).await?;
        decode::decode_analysis(&body)
    }

    async fn clean(&self, upload: &UploadPayload) -> Result<CleanReport> {
        let body = self.post_file(Endpoint::Clean, upload).await?;
        decode::decode_clean(&body)
    }

    async fn profile(&self, upload: &UploadPayload) -> Result<ProfileReport> {
        let body = self.post_file(Endpoint::Profile, upload).await?;
        decode::decode_profile(&body)
    }

    async fn semantic(&self, upload: &UploadPayload) -> Result<SemanticAnalysis> {
        let body = self.post_file(Endpoint::Semantic, upload).await?;
        decode::decode_semantic(&body)
    }

    async fn upload(&self, upload: &UploadPayload) -> Result<UploadSummary> {
        let body = self.post_file(Endpoint::Upload, upload).await?;
        decode::decode_upload(&body)
    }

    async fn status(&self) -> Result<ServiceStatus> {
        let url = self.config.endpoint(Endpoint::Status.path())?;
        let body = self.send(Endpoint::Status, self.client.get(url)).await?;
        decode::decode_status(&body)
    }
}
