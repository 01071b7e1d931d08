// ============================================================
// TERMINAL RENDERING
// ============================================================
// Plain-text views of service results. Every function returns a
// String so the command layer decides where it is printed.

use std::fmt::Write as _;

use crate::domain::preview::{format_js_number, TabularPreview};
use crate::domain::report::{
    AnalysisReport, CleanReport, DatasetProfile, ProfileReport, SemanticAnalysis, UploadSummary,
};
use crate::domain::session::HistoryEntry;

const INDENT: &str = "  ";

/// Scores print the way the browser showed them (`87.0` -> `87`, `-0.0` -> `0`)
pub fn format_score(score: f64) -> String {
    format_js_number(score)
}

fn heading(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));
}

fn bullets(out: &mut String, depth: usize, items: &[String]) {
    if items.is_empty() {
        let _ = writeln!(out, "{}(none)", INDENT.repeat(depth));
    }
    for item in items {
        let _ = writeln!(out, "{}- {}", INDENT.repeat(depth), item);
    }
}

pub fn render_semantic(analysis: &SemanticAnalysis) -> String {
    let mut out = String::new();
    heading(&mut out, "Semantic Analysis");
    match analysis {
        SemanticAnalysis::Raw(raw) => {
            let _ = writeln!(out, "The service returned unstructured output:");
            for line in raw.lines() {
                let _ = writeln!(out, "{}{}", INDENT, line);
            }
        }
        SemanticAnalysis::Columns(columns) if columns.is_empty() => {
            let _ = writeln!(out, "No columns reported.");
        }
        SemanticAnalysis::Columns(columns) => {
            for (index, finding) in columns.iter().enumerate() {
                if index > 0 {
                    out.push('\n');
                }
                let semantics = &finding.semantics;
                if semantics.semantic_type.is_empty() {
                    let _ = writeln!(out, "{}", finding.column);
                } else {
                    let _ = writeln!(out, "{} ({})", finding.column, semantics.semantic_type);
                }
                let _ = writeln!(out, "{}Issues", INDENT);
                bullets(&mut out, 2, &semantics.issues_detected);
                let _ = writeln!(out, "{}Suggested Fixes", INDENT);
                bullets(&mut out, 2, &semantics.suggested_fixes);
            }
        }
    }
    out
}

pub fn render_analysis(report: &AnalysisReport) -> String {
    let mut out = String::new();
    heading(&mut out, "Data Quality Score");
    let _ = writeln!(out, "{}", format_score(report.quality_score));

    if let Some(profile) = &report.profile {
        out.push('\n');
        out.push_str(&render_dataset_profile(profile));
    }

    out.push('\n');
    out.push_str(&render_semantic(&report.semantic_analysis));
    out
}

pub fn render_dataset_profile(profile: &DatasetProfile) -> String {
    let mut out = String::new();
    heading(&mut out, "Profile");
    let _ = writeln!(
        out,
        "{} rows, {} duplicate rows",
        profile.total_rows, profile.duplicate_rows
    );

    let rows: Vec<Vec<String>> = profile
        .columns
        .iter()
        .map(|entry| {
            let p = &entry.profile;
            vec![
                entry.column.clone(),
                p.dtype.clone(),
                format!("{}%", format_score(p.missing_percent)),
                p.unique_values.to_string(),
                p.outliers.map(|o| o.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    out.push_str(&render_table(
        &["column", "dtype", "missing", "unique", "outliers"],
        &rows,
    ));
    out
}

pub fn render_profile(report: &ProfileReport) -> String {
    let mut out = String::new();
    heading(&mut out, "Data Quality Score");
    let _ = writeln!(out, "{}", format_score(report.quality_score));
    out.push('\n');
    out.push_str(&render_dataset_profile(&report.profile));
    out
}

/// `before -> after (delta)`; the delta keeps its sign.
pub fn render_improvement(quality_before: Option<f64>, cleaned: &CleanReport) -> String {
    let mut out = String::new();
    heading(&mut out, "Quality Improvement");
    let before = quality_before
        .or(cleaned.quality_before)
        .map(format_score)
        .unwrap_or_else(|| "?".to_string());
    let _ = write!(out, "{} -> {}", before, format_score(cleaned.quality_after));
    if let Some(improvement) = cleaned.improvement {
        // Fold -0.0 into 0.
        let improvement = if improvement == 0.0 { 0.0 } else { improvement };
        let sign = if improvement >= 0.0 { "+" } else { "" };
        let _ = write!(out, " ({}{})", sign, format_score(improvement));
    }
    out.push('\n');
    if let (Some(before), Some(after)) = (cleaned.rows_before, cleaned.rows_after) {
        let _ = writeln!(out, "Rows: {} -> {}", before, after);
    }
    out
}

pub fn render_cleaning_log(log: &[String]) -> String {
    if log.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    heading(&mut out, "Cleaning Log");
    bullets(&mut out, 0, log);
    out
}

pub fn render_preview(preview: &TabularPreview) -> String {
    let mut out = String::new();
    heading(&mut out, "Cleaned Preview");
    let Some(header) = preview.header() else {
        let _ = writeln!(out, "No rows returned.");
        return out;
    };

    let rows: Vec<Vec<String>> = preview
        .rows()
        .iter()
        .map(|row| header.iter().map(|column| row.text_of(column)).collect())
        .collect();
    out.push_str(&render_table(&header, &rows));
    out
}

pub fn render_clean(quality_before: Option<f64>, cleaned: &CleanReport) -> String {
    let mut out = render_improvement(quality_before, cleaned);
    let log = render_cleaning_log(&cleaned.cleaning_log);
    if !log.is_empty() {
        out.push('\n');
        out.push_str(&log);
    }
    out.push('\n');
    out.push_str(&render_preview(&cleaned.cleaned_preview));
    out
}

pub fn render_history(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    heading(&mut out, "Dataset History");
    let rows: Vec<Vec<String>> = history
        .iter()
        .map(|entry| {
            vec![
                entry.name.clone(),
                entry.date.format("%Y-%m-%d %H:%M:%S").to_string(),
                format_score(entry.score),
            ]
        })
        .collect();
    out.push_str(&render_table(&["dataset", "date", "score"], &rows));
    out
}

pub fn render_upload_summary(summary: &UploadSummary) -> String {
    let mut out = String::new();
    heading(&mut out, "Upload Summary");
    if let Some(filename) = &summary.filename {
        let _ = writeln!(out, "File: {}", filename);
    }
    let _ = writeln!(out, "Rows: {}", summary.rows);
    let _ = writeln!(out, "Columns: {}", summary.columns);
    bullets(&mut out, 1, &summary.column_names);
    out
}

/// Left-aligned table with a header underline. Widths count chars.
pub fn render_table<H: AsRef<str>>(header: &[H], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.as_ref().chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(header.iter().map(|h| h.as_ref()).collect()));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));
    for row in rows {
        let _ = writeln!(out, "{}", line(row.iter().map(String::as_str).collect()));
    }
    out
}
