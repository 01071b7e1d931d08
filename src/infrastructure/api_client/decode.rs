// ============================================================
// RESPONSE DECODING
// ============================================================
// Turn raw response bodies into typed reports, or a DecodeError
// naming the endpoint and what was wrong with the payload

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::preview::json_kind;
use crate::domain::report::{
    AnalysisReport, CleanReport, ColumnFindings, ColumnProfile, ColumnProfileEntry,
    ColumnSemantics, DatasetProfile, ProfileReport, SemanticAnalysis, ServiceStatus,
    UploadSummary,
};

use super::Endpoint;

/// Key the service uses when its model answer was not valid JSON
const RAW_OUTPUT_KEY: &str = "raw_output";

#[derive(Deserialize)]
struct AnalyzeWire {
    quality_score: f64,
    #[serde(default)]
    profile: Option<ProfileWire>,
    semantic_analysis: Map<String, Value>,
}

#[derive(Deserialize)]
struct ProfileWire {
    total_rows: u64,
    duplicate_rows: u64,
    columns: Map<String, Value>,
}

#[derive(Deserialize)]
struct ProfileReportWire {
    quality_score: f64,
    profile: ProfileWire,
}

#[derive(Deserialize)]
struct SemanticWire {
    semantic_analysis: Map<String, Value>,
}

fn decode_error(endpoint: Endpoint, message: impl Into<String>) -> AppError {
    AppError::DecodeError {
        endpoint: endpoint.name().to_string(),
        message: message.into(),
    }
}

fn parse<T: DeserializeOwned>(endpoint: Endpoint, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| decode_error(endpoint, e.to_string()))
}

fn semantic_analysis(endpoint: Endpoint, map: Map<String, Value>) -> Result<SemanticAnalysis> {
    if map.len() == 1 {
        if let Some(Value::String(raw)) = map.get(RAW_OUTPUT_KEY) {
            return Ok(SemanticAnalysis::Raw(raw.clone()));
        }
    }

    let mut columns = Vec::with_capacity(map.len());
    for (column, value) in map {
        if !value.is_object() {
            return Err(decode_error(
                endpoint,
                format!(
                    "semantic_analysis.{} must be an object, got {}",
                    column,
                    json_kind(&value)
                ),
            ));
        }
        let semantics: ColumnSemantics = serde_json::from_value(value).map_err(|e| {
            decode_error(endpoint, format!("semantic_analysis.{}: {}", column, e))
        })?;
        columns.push(ColumnFindings { column, semantics });
    }
    Ok(SemanticAnalysis::Columns(columns))
}

fn dataset_profile(endpoint: Endpoint, wire: ProfileWire) -> Result<DatasetProfile> {
    let mut columns = Vec::with_capacity(wire.columns.len());
    for (column, value) in wire.columns {
        let profile: ColumnProfile = serde_json::from_value(value).map_err(|e| {
            decode_error(endpoint, format!("profile.columns.{}: {}", column, e))
        })?;
        profile.validate().map_err(|e| {
            decode_error(endpoint, format!("profile.columns.{}: {}", column, e))
        })?;
        columns.push(ColumnProfileEntry { column, profile });
    }

    Ok(DatasetProfile {
        total_rows: wire.total_rows,
        duplicate_rows: wire.duplicate_rows,
        columns,
    })
}

pub fn decode_analysis(body: &str) -> Result<AnalysisReport> {
    let endpoint = Endpoint::Analyze;
    let wire: AnalyzeWire = parse(endpoint, body)?;

    let profile = match wire.profile {
        Some(profile) => Some(dataset_profile(endpoint, profile)?),
        None => None,
    };

    Ok(AnalysisReport {
        quality_score: wire.quality_score,
        profile,
        semantic_analysis: semantic_analysis(endpoint, wire.semantic_analysis)?,
    })
}

/// Values are passed through exactly as the service sent them.
pub fn decode_clean(body: &str) -> Result<CleanReport> {
    parse(Endpoint::Clean, body)
}

pub fn decode_profile(body: &str) -> Result<ProfileReport> {
    let endpoint = Endpoint::Profile;
    let wire: ProfileReportWire = parse(endpoint, body)?;
    Ok(ProfileReport {
        quality_score: wire.quality_score,
        profile: dataset_profile(endpoint, wire.profile)?,
    })
}

pub fn decode_semantic(body: &str) -> Result<SemanticAnalysis> {
    let endpoint = Endpoint::Semantic;
    let wire: SemanticWire = parse(endpoint, body)?;
    semantic_analysis(endpoint, wire.semantic_analysis)
}

pub fn decode_upload(body: &str) -> Result<UploadSummary> {
    let endpoint = Endpoint::Upload;
    let summary: UploadSummary = parse(endpoint, body)?;
    summary
        .validate()
        .map_err(|e| decode_error(endpoint, e.to_string()))?;
    if summary.columns != summary.column_names.len() as u64 {
        return Err(decode_error(
            endpoint,
            format!(
                "columns is {} but {} column names were listed",
                summary.columns,
                summary.column_names.len()
            ),
        ));
    }
    Ok(summary)
}

pub fn decode_status(body: &str) -> Result<ServiceStatus> {
    parse(Endpoint::Status, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analysis_body() -> String {
        json!({
            "quality_score": 87.25,
            "profile": {
                "total_rows": 4,
                "duplicate_rows": 1,
                "columns": {
                    "Email": {
                        "dtype": "object",
                        "missing_count": 1,
                        "non_missing_count": 3,
                        "missing_percent": 25.0,
                        "unique_values": 3
                    },
                    "Age": {
                        "dtype": "int64",
                        "missing_count": 0,
                        "non_missing_count": 4,
                        "missing_percent": 0.0,
                        "unique_values": 4,
                        "outliers": 1
                    }
                }
            },
            "semantic_analysis": {
                "Email": {
                    "semantic_type": "Email",
                    "issues_detected": ["Mixed case", "Missing values"],
                    "suggested_fixes": ["Lowercase addresses"]
                },
                "Age": {
                    "semantic_type": "Age",
                    "issues_detected": ["Value 150 is unrealistic"],
                    "suggested_fixes": []
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_decode_analysis() {
        let report = decode_analysis(&analysis_body()).unwrap();
        assert_eq!(report.quality_score, 87.25);

        let columns = report.semantic_analysis.columns();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].column, "Email");
        assert_eq!(columns[0].semantics.issues_detected.len(), 2);
        assert_eq!(columns[1].semantics.suggested_fixes.len(), 0);
        assert_eq!(report.semantic_analysis.issue_count(), 3);

        let profile = report.profile.unwrap();
        assert_eq!(profile.total_rows, 4);
        assert_eq!(profile.columns[0].profile.outliers, None);
        assert_eq!(profile.columns[1].profile.outliers, Some(1));
    }

    #[test]
    fn test_decode_analysis_without_profile() {
        let body = json!({
            "quality_score": 70,
            "semantic_analysis": {}
        })
        .to_string();
        let report = decode_analysis(&body).unwrap();
        assert_eq!(report.quality_score, 70.0);
        assert!(report.profile.is_none());
        assert!(report.semantic_analysis.columns().is_empty());
    }

    #[test]
    fn test_decode_raw_semantic_output() {
        let body = json!({
            "quality_score": 55.5,
            "semantic_analysis": {"raw_output": "Sorry, here is some prose"}
        })
        .to_string();
        let report = decode_analysis(&body).unwrap();
        assert_eq!(
            report.semantic_analysis,
            SemanticAnalysis::Raw("Sorry, here is some prose".to_string())
        );
    }

    #[test]
    fn test_missing_quality_score_is_a_decode_error() {
        let body = json!({"semantic_analysis": {}}).to_string();
        match decode_analysis(&body) {
            Err(AppError::DecodeError { endpoint, message }) => {
                assert_eq!(endpoint, "/analyze");
                assert!(message.contains("quality_score"));
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_null_quality_score_is_a_decode_error() {
        let body = json!({"quality_score": null, "semantic_analysis": {}}).to_string();
        assert!(matches!(
            decode_analysis(&body),
            Err(AppError::DecodeError { .. })
        ));
    }

    #[test]
    fn test_malformed_column_semantics_names_the_column() {
        let body = json!({
            "quality_score": 90,
            "semantic_analysis": {
                "Phone": {"semantic_type": "Phone", "issues_detected": "none"}
            }
        })
        .to_string();
        match decode_analysis(&body) {
            Err(AppError::DecodeError { message, .. }) => {
                assert!(message.starts_with("semantic_analysis.Phone"))
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_column_semantics() {
        let body = json!({
            "quality_score": 90,
            "semantic_analysis": {"Phone": "digits"}
        })
        .to_string();
        assert!(decode_analysis(&body).is_err());
    }

    #[test]
    fn test_out_of_range_missing_percent() {
        let body = json!({
            "quality_score": 90,
            "profile": {
                "total_rows": 1,
                "duplicate_rows": 0,
                "columns": {
                    "A": {
                        "dtype": "object",
                        "missing_count": 0,
                        "non_missing_count": 1,
                        "missing_percent": 140.0,
                        "unique_values": 1
                    }
                }
            },
            "semantic_analysis": {}
        })
        .to_string();
        assert!(decode_analysis(&body).is_err());
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(
            decode_analysis("<html>Bad gateway</html>"),
            Err(AppError::DecodeError { .. })
        ));
    }

    #[test]
    fn test_decode_clean_passes_values_through() {
        let body = json!({
            "rows_before": 5,
            "rows_after": 4,
            "quality_before": 80.1,
            "quality_after": 95.37,
            "improvement": 15.27,
            "cleaning_log": ["Removed 1 duplicate rows", "Normalized text in Name"],
            "cleaned_preview": [
                {"Name": "Alice", "Age": 30, "Email": "alice@example.com"},
                {"Name": "Bob", "Age": null, "Email": "bob@example.com"}
            ]
        })
        .to_string();

        let report = decode_clean(&body).unwrap();
        assert_eq!(report.quality_after, 95.37);
        assert_eq!(report.improvement, Some(15.27));
        assert_eq!(report.quality_before, Some(80.1));
        assert_eq!(report.rows_before, Some(5));
        assert_eq!(
            report.cleaning_log,
            vec!["Removed 1 duplicate rows", "Normalized text in Name"]
        );
        assert_eq!(report.cleaned_preview.len(), 2);
        assert_eq!(
            report.cleaned_preview.header(),
            Some(vec!["Name", "Age", "Email"])
        );
        assert_eq!(report.cleaned_preview.rows()[1].text_of("Age"), "");
    }

    #[test]
    fn test_decode_clean_accepts_null_improvement() {
        let body = json!({
            "quality_after": 60,
            "improvement": null,
            "cleaning_log": [],
            "cleaned_preview": []
        })
        .to_string();
        let report = decode_clean(&body).unwrap();
        assert_eq!(report.improvement, None);
        assert!(report.cleaned_preview.is_empty());
    }

    #[test]
    fn test_decode_clean_rejects_non_object_rows() {
        let body = json!({
            "quality_after": 60,
            "improvement": 1,
            "cleaning_log": [],
            "cleaned_preview": [[1, 2]]
        })
        .to_string();
        assert!(decode_clean(&body).is_err());
    }

    #[test]
    fn test_decode_upload() {
        let body = json!({
            "filename": "people.csv",
            "rows": 10,
            "columns": 2,
            "column_names": ["Name", "Age"]
        })
        .to_string();
        let summary = decode_upload(&body).unwrap();
        assert_eq!(summary.filename.as_deref(), Some("people.csv"));

        let mismatched = json!({
            "filename": "people.csv",
            "rows": 10,
            "columns": 3,
            "column_names": ["Name", "Age"]
        })
        .to_string();
        assert!(decode_upload(&mismatched).is_err());
    }

    #[test]
    fn test_decode_profile_and_semantic() {
        let profile = decode_profile(
            &json!({
                "quality_score": 99.0,
                "profile": {"total_rows": 2, "duplicate_rows": 0, "columns": {}}
            })
            .to_string(),
        )
        .unwrap();
        assert_eq!(profile.profile.total_rows, 2);

        let semantic = decode_semantic(
            &json!({"semantic_analysis": {"City": {
                "semantic_type": "City",
                "issues_detected": [],
                "suggested_fixes": []
            }}})
            .to_string(),
        )
        .unwrap();
        assert_eq!(semantic.columns()[0].column, "City");
    }

    #[test]
    fn test_decode_status() {
        let status = decode_status(r#"{"message": "CleanForge Backend Running"}"#).unwrap();
        assert_eq!(status.message, "CleanForge Backend Running");
    }
}
