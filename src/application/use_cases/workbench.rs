use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::error::Result;
use crate::domain::session::{HistoryEntry, SelectedFile, Session, SessionEvent, SessionState};
use crate::infrastructure::api_client::CleanForgeApi;
use crate::infrastructure::csv::UploadReader;

use super::export::ExportUseCase;

/// Drives one session: pick a file, analyze it, clean it, export the
/// cleaned preview. Service failures end up in the session state; only
/// invalid transitions are returned as errors.
pub struct WorkbenchUseCase {
    api: Arc<dyn CleanForgeApi + Send + Sync>,
    reader: UploadReader,
    session: Session,
}

impl WorkbenchUseCase {
    pub fn new(api: Arc<dyn CleanForgeApi + Send + Sync>) -> Self {
        Self {
            api,
            reader: UploadReader::new(),
            session: Session::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.session.history()
    }

    pub fn select_file(&mut self, path: impl Into<PathBuf>) -> Result<&SessionState> {
        let file = SelectedFile::new(path);
        tracing::debug!(file = %file.name, "File selected");
        self.session.dispatch(SessionEvent::FileSelected(file))
    }

    pub async fn analyze(&mut self) -> Result<&SessionState> {
        self.session.dispatch(SessionEvent::AnalyzeStarted)?;
        let file = self.current_file();

        let outcome = match self.reader.read(&file.path).await {
            Ok(upload) => self.api.analyze(&upload).await,
            Err(err) => Err(err),
        };

        let event = match outcome {
            Ok(report) => {
                tracing::info!(
                    file = %file.name,
                    quality_score = report.quality_score,
                    issues = report.semantic_analysis.issue_count(),
                    "Analysis complete"
                );
                SessionEvent::AnalyzeSucceeded {
                    report,
                    at: Local::now(),
                }
            }
            Err(err) => {
                tracing::error!(file = %file.name, error = %err, "Analysis failed");
                SessionEvent::AnalyzeFailed
            }
        };
        self.session.dispatch(event)
    }

    pub async fn clean(&mut self) -> Result<&SessionState> {
        self.session.dispatch(SessionEvent::CleanStarted)?;
        let file = self.current_file();

        let outcome = match self.reader.read(&file.path).await {
            Ok(upload) => self.api.clean(&upload).await,
            Err(err) => Err(err),
        };

        let event = match outcome {
            Ok(report) => {
                tracing::info!(
                    file = %file.name,
                    quality_after = report.quality_after,
                    rows = report.cleaned_preview.len(),
                    steps = report.cleaning_log.len(),
                    "Cleaning complete"
                );
                SessionEvent::CleanSucceeded(report)
            }
            Err(err) => {
                tracing::error!(file = %file.name, error = %err, "Cleaning failed");
                SessionEvent::CleanFailed
            }
        };
        self.session.dispatch(event)
    }

    /// Export the cleaned preview. `Ok(None)` when there is nothing to export.
    pub fn export(&self, export: &ExportUseCase) -> Result<Option<PathBuf>> {
        export.execute(self.state().preview())
    }

    fn current_file(&self) -> SelectedFile {
        // Started events only succeed with a file present.
        self.session
            .state()
            .file()
            .cloned()
            .unwrap_or_else(|| SelectedFile::new(""))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::client_config::CsvMode;
    use crate::domain::error::AppError;
    use crate::domain::preview::{Row, TabularPreview};
    use crate::domain::report::{
        AnalysisReport, CleanReport, ColumnFindings, ColumnSemantics, ProfileReport,
        SemanticAnalysis, ServiceStatus, UploadSummary,
    };
    use crate::domain::session::{ANALYZE_FAILED_MESSAGE, CLEAN_FAILED_MESSAGE};
    use crate::infrastructure::csv::{CsvEncoder, UploadPayload};
    use crate::infrastructure::storage::DownloadTarget;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Canned service responses, recording the files it was sent
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub analyze: Option<AnalysisReport>,
        pub clean: Option<CleanReport>,
        pub uploads: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn record(&self, upload: &UploadPayload) {
            self.uploads.lock().unwrap().push(upload.file_name.clone());
        }

        fn unavailable() -> AppError {
            AppError::HttpStatus {
                endpoint: "/test".to_string(),
                status: 500,
            }
        }
    }

    #[async_trait]
    impl CleanForgeApi for FakeApi {
        async fn analyze(&self, upload: &UploadPayload) -> Result<AnalysisReport> {
            self.record(upload);
            self.analyze.clone().ok_or_else(Self::unavailable)
        }

        async fn clean(&self, upload: &UploadPayload) -> Result<CleanReport> {
            self.record(upload);
            self.clean.clone().ok_or_else(Self::unavailable)
        }

        async fn profile(&self, _upload: &UploadPayload) -> Result<ProfileReport> {
            Err(Self::unavailable())
        }

        async fn semantic(&self, _upload: &UploadPayload) -> Result<SemanticAnalysis> {
            Err(Self::unavailable())
        }

        async fn upload(&self, _upload: &UploadPayload) -> Result<UploadSummary> {
            Err(Self::unavailable())
        }

        async fn status(&self) -> Result<ServiceStatus> {
            Ok(ServiceStatus {
                message: "CleanForge Backend Running".to_string(),
            })
        }
    }

    pub(crate) fn sample_analysis() -> AnalysisReport {
        AnalysisReport {
            quality_score: 72.4,
            profile: None,
            semantic_analysis: SemanticAnalysis::Columns(vec![ColumnFindings {
                column: "city".to_string(),
                semantics: ColumnSemantics {
                    semantic_type: "City".to_string(),
                    issues_detected: vec!["Inconsistent casing".to_string()],
                    suggested_fixes: vec!["Title-case values".to_string()],
                },
            }]),
        }
    }

    pub(crate) fn sample_clean() -> CleanReport {
        CleanReport {
            cleaned_preview: TabularPreview::new(vec![
                Row::new().with("age", "30").with("city", "NYC"),
                Row::new().with("age", "25").with("city", "LA"),
            ]),
            cleaning_log: vec!["Normalized text in city".to_string()],
            quality_after: 88.0,
            improvement: Some(15.6),
            quality_before: Some(72.4),
            rows_before: Some(2),
            rows_after: Some(2),
        }
    }

    fn write_csv(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("cities.csv");
        std::fs::write(&path, "age,city\n30,nyc\n25,la\n").unwrap();
        path
    }

    fn workbench(api: FakeApi) -> (WorkbenchUseCase, Arc<FakeApi>) {
        let api = Arc::new(api);
        (WorkbenchUseCase::new(api.clone()), api)
    }

    #[tokio::test]
    async fn test_analyze_success_populates_result_and_history() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bench, api) = workbench(FakeApi {
            analyze: Some(sample_analysis()),
            ..Default::default()
        });

        bench.select_file(write_csv(&dir)).unwrap();
        let state = bench.analyze().await.unwrap();
        assert_eq!(state.analysis(), Some(&sample_analysis()));
        assert_eq!(bench.history().len(), 1);
        assert_eq!(bench.history()[0].score, 72.4);
        assert_eq!(api.uploads.lock().unwrap().as_slice(), ["cities.csv"]);
    }

    #[tokio::test]
    async fn test_analyze_failure_sets_generic_message() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bench, _) = workbench(FakeApi::default());

        bench.select_file(write_csv(&dir)).unwrap();
        let state = bench.analyze().await.unwrap();
        assert_eq!(state.error_message(), Some(ANALYZE_FAILED_MESSAGE));
        assert!(state.analysis().is_none());
        assert!(bench.history().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_file_fails_analysis_without_request() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bench, api) = workbench(FakeApi {
            analyze: Some(sample_analysis()),
            ..Default::default()
        });

        bench.select_file(dir.path().join("missing.csv")).unwrap();
        let state = bench.analyze().await.unwrap();
        assert_eq!(state.error_message(), Some(ANALYZE_FAILED_MESSAGE));
        assert!(api.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clean_success_stores_values_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bench, _) = workbench(FakeApi {
            analyze: Some(sample_analysis()),
            clean: Some(sample_clean()),
            ..Default::default()
        });

        bench.select_file(write_csv(&dir)).unwrap();
        bench.analyze().await.unwrap();
        let state = bench.clean().await.unwrap();
        let cleaned = state.cleaned().unwrap();
        assert_eq!(cleaned, &sample_clean());
        assert_eq!(cleaned.quality_after, 88.0);
        assert_eq!(cleaned.improvement, Some(15.6));
        assert_eq!(state.analysis(), Some(&sample_analysis()));
    }

    #[tokio::test]
    async fn test_clean_failure_is_visible() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bench, _) = workbench(FakeApi {
            analyze: Some(sample_analysis()),
            ..Default::default()
        });

        bench.select_file(write_csv(&dir)).unwrap();
        bench.analyze().await.unwrap();
        let state = bench.clean().await.unwrap();
        assert_eq!(state.error_message(), Some(CLEAN_FAILED_MESSAGE));
        assert!(state.analysis().is_some());
    }

    #[tokio::test]
    async fn test_analyze_without_file_is_rejected() {
        let (mut bench, api) = workbench(FakeApi::default());
        assert!(bench.analyze().await.is_err());
        assert!(bench.clean().await.is_err());
        assert!(api.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_after_clean_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let (mut bench, _) = workbench(FakeApi {
            clean: Some(sample_clean()),
            ..Default::default()
        });

        bench.select_file(write_csv(&dir)).unwrap();
        bench.clean().await.unwrap();

        let export = ExportUseCase::new(
            CsvEncoder::new(CsvMode::Legacy),
            DownloadTarget::new(out.path(), "cleaned_dataset.csv"),
        );
        let path = bench.export(&export).unwrap().unwrap();
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "age,city\n30,NYC\n25,LA"
        );
    }

    #[tokio::test]
    async fn test_export_before_clean_is_noop() {
        let out = tempfile::tempdir().unwrap();
        let (bench, _) = workbench(FakeApi::default());
        let export = ExportUseCase::new(
            CsvEncoder::default(),
            DownloadTarget::new(out.path(), "cleaned_dataset.csv"),
        );
        assert_eq!(bench.export(&export).unwrap(), None);
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }
}
