// ============================================================
// SESSION STATE
// ============================================================
// One explicit state value per session, advanced only through
// `Session::dispatch`. Results live inside the variants so they
// cannot drift out of sync with the loading flags.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::{AppError, Result};
use super::preview::TabularPreview;
use super::report::{AnalysisReport, CleanReport};

pub const ANALYZE_FAILED_MESSAGE: &str = "Failed to analyze dataset.";
pub const CLEAN_FAILED_MESSAGE: &str = "Failed to clean dataset.";

/// The CSV file picked for upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    FileSelected {
        file: SelectedFile,
    },
    Analyzing {
        file: SelectedFile,
    },
    Analyzed {
        file: SelectedFile,
        report: AnalysisReport,
    },
    Cleaning {
        file: SelectedFile,
        report: Option<AnalysisReport>,
    },
    Cleaned {
        file: SelectedFile,
        report: Option<AnalysisReport>,
        cleaned: CleanReport,
    },
    Failed {
        file: SelectedFile,
        report: Option<AnalysisReport>,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    FileSelected(SelectedFile),
    AnalyzeStarted,
    AnalyzeSucceeded {
        report: AnalysisReport,
        at: DateTime<Local>,
    },
    AnalyzeFailed,
    CleanStarted,
    CleanSucceeded(CleanReport),
    CleanFailed,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::FileSelected { .. } => "file_selected",
            SessionState::Analyzing { .. } => "analyzing",
            SessionState::Analyzed { .. } => "analyzed",
            SessionState::Cleaning { .. } => "cleaning",
            SessionState::Cleaned { .. } => "cleaned",
            SessionState::Failed { .. } => "failed",
        }
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        match self {
            SessionState::Idle => None,
            SessionState::FileSelected { file }
            | SessionState::Analyzing { file }
            | SessionState::Analyzed { file, .. }
            | SessionState::Cleaning { file, .. }
            | SessionState::Cleaned { file, .. }
            | SessionState::Failed { file, .. } => Some(file),
        }
    }

    pub fn analysis(&self) -> Option<&AnalysisReport> {
        match self {
            SessionState::Analyzed { report, .. } => Some(report),
            SessionState::Cleaning { report, .. }
            | SessionState::Cleaned { report, .. }
            | SessionState::Failed { report, .. } => report.as_ref(),
            _ => None,
        }
    }

    pub fn cleaned(&self) -> Option<&CleanReport> {
        match self {
            SessionState::Cleaned { cleaned, .. } => Some(cleaned),
            _ => None,
        }
    }

    /// The preview available for export, if any
    pub fn preview(&self) -> Option<&TabularPreview> {
        self.cleaned().map(|c| &c.cleaned_preview)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionState::Analyzing { .. } | SessionState::Cleaning { .. }
        )
    }

    /// Pure transition function. Invalid transitions are rejected and
    /// leave the caller's state untouched.
    pub fn apply(&self, event: SessionEvent) -> Result<SessionState> {
        use SessionEvent as E;
        use SessionState as S;

        let next = match (self, event) {
            (S::Analyzing { .. } | S::Cleaning { .. }, E::FileSelected(_)) => {
                return Err(self.busy_error())
            }
            (_, E::FileSelected(file)) => S::FileSelected { file },

            (S::Analyzing { .. } | S::Cleaning { .. }, E::AnalyzeStarted | E::CleanStarted) => {
                return Err(self.busy_error())
            }
            // A new analysis discards every earlier result.
            (state, E::AnalyzeStarted) => S::Analyzing {
                file: state.file().cloned().ok_or_else(no_file)?,
            },
            (state, E::CleanStarted) => S::Cleaning {
                file: state.file().cloned().ok_or_else(no_file)?,
                report: state.analysis().cloned(),
            },

            (S::Analyzing { file }, E::AnalyzeSucceeded { report, .. }) => S::Analyzed {
                file: file.clone(),
                report,
            },
            (S::Analyzing { file }, E::AnalyzeFailed) => S::Failed {
                file: file.clone(),
                report: None,
                message: ANALYZE_FAILED_MESSAGE.to_string(),
            },
            (S::Cleaning { file, report }, E::CleanSucceeded(cleaned)) => S::Cleaned {
                file: file.clone(),
                report: report.clone(),
                cleaned,
            },
            (S::Cleaning { file, report }, E::CleanFailed) => S::Failed {
                file: file.clone(),
                report: report.clone(),
                message: CLEAN_FAILED_MESSAGE.to_string(),
            },

            (state, event) => {
                return Err(AppError::ValidationError(format!(
                    "Event {} is not valid in state {}",
                    event_name(&event),
                    state.name()
                )))
            }
        };

        Ok(next)
    }

    fn busy_error(&self) -> AppError {
        AppError::ValidationError(format!(
            "A request is already in progress ({})",
            self.name()
        ))
    }
}

fn no_file() -> AppError {
    AppError::ValidationError("No file selected".to_string())
}

fn event_name(event: &SessionEvent) -> &'static str {
    match event {
        SessionEvent::FileSelected(_) => "file_selected",
        SessionEvent::AnalyzeStarted => "analyze_started",
        SessionEvent::AnalyzeSucceeded { .. } => "analyze_succeeded",
        SessionEvent::AnalyzeFailed => "analyze_failed",
        SessionEvent::CleanStarted => "clean_started",
        SessionEvent::CleanSucceeded(_) => "clean_succeeded",
        SessionEvent::CleanFailed => "clean_failed",
    }
}

/// One successful analysis, shown in the dataset history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub name: String,
    pub score: f64,
    pub date: DateTime<Local>,
}

/// Session state plus the history of analyzed datasets, newest first
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
    history: Vec<HistoryEntry>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn dispatch(&mut self, event: SessionEvent) -> Result<&SessionState> {
        let entry = match (&self.state, &event) {
            (SessionState::Analyzing { file }, SessionEvent::AnalyzeSucceeded { report, at }) => {
                Some(HistoryEntry {
                    name: file.name.clone(),
                    score: report.quality_score,
                    date: *at,
                })
            }
            _ => None,
        };

        self.state = self.state.apply(event)?;
        if let Some(entry) = entry {
            self.history.insert(0, entry);
        }
        Ok(&self.state)
    }
}
