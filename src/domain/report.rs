// ============================================================
// SERVICE REPORTS
// ============================================================
// Typed payloads returned by the analyze, clean, profile,
// semantic and upload endpoints

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::preview::TabularPreview;

/// Result of `POST /analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub quality_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<DatasetProfile>,
    pub semantic_analysis: SemanticAnalysis,
}

/// Per-column semantic findings, or the service's raw text when its
/// model did not answer with JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticAnalysis {
    Columns(Vec<ColumnFindings>),
    Raw(String),
}

impl SemanticAnalysis {
    pub fn columns(&self) -> &[ColumnFindings] {
        match self {
            SemanticAnalysis::Columns(columns) => columns,
            SemanticAnalysis::Raw(_) => &[],
        }
    }

    pub fn issue_count(&self) -> usize {
        self.columns()
            .iter()
            .map(|c| c.semantics.issues_detected.len())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFindings {
    pub column: String,
    pub semantics: ColumnSemantics,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnSemantics {
    pub semantic_type: String,
    pub issues_detected: Vec<String>,
    pub suggested_fixes: Vec<String>,
}

/// Column statistics computed by the service before scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub total_rows: u64,
    pub duplicate_rows: u64,
    pub columns: Vec<ColumnProfileEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfileEntry {
    pub column: String,
    pub profile: ColumnProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ColumnProfile {
    pub dtype: String,
    pub missing_count: u64,
    pub non_missing_count: u64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub missing_percent: f64,
    pub unique_values: u64,
    /// Only present for numeric columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outliers: Option<u64>,
}

/// Result of `POST /profile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub quality_score: f64,
    pub profile: DatasetProfile,
}

/// Result of `POST /clean`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanReport {
    pub cleaned_preview: TabularPreview,
    pub cleaning_log: Vec<String>,
    pub quality_after: f64,
    /// Signed delta; the service sends null when either score is missing
    pub improvement: Option<f64>,
    #[serde(default)]
    pub quality_before: Option<f64>,
    #[serde(default)]
    pub rows_before: Option<u64>,
    #[serde(default)]
    pub rows_after: Option<u64>,
}

/// Result of `POST /upload`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UploadSummary {
    #[serde(default)]
    pub filename: Option<String>,
    pub rows: u64,
    pub columns: u64,
    #[validate(length(min = 1))]
    pub column_names: Vec<String>,
}

/// Result of `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub message: String,
}
