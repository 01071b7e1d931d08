// ============================================================
// CSV ENCODER
// ============================================================
// Serialize a cleaned preview into CSV text for export

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::client_config::CsvMode;
use crate::domain::error::{AppError, Result};
use crate::domain::preview::{object_key_order, TabularPreview};

pub const CSV_MIME_TYPE: &str = "text/csv;charset=utf-8;";

/// Encoded export ready to be delivered
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedCsv {
    pub content: String,
    pub mime_type: &'static str,
    pub rows: usize,
}

impl EncodedCsv {
    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }
}

/// CSV encoder for tabular previews
///
/// Column order comes from the first row's keys. Rows are separated by a
/// single `\n` with no trailing newline. In [`CsvMode::Legacy`] the header
/// follows `Object.keys` order (integer-like keys first, ascending) and
/// values are joined verbatim, so a value containing a comma or newline
/// shifts the columns of its line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvEncoder {
    mode: CsvMode,
}

impl CsvEncoder {
    pub fn new(mode: CsvMode) -> Self {
        Self { mode }
    }

    pub fn encode(&self, preview: &TabularPreview) -> Result<EncodedCsv> {
        let header = preview.header().ok_or_else(|| {
            AppError::ValidationError("Cannot encode an empty preview".to_string())
        })?;

        let content = match self.mode {
            CsvMode::Legacy => Self::encode_legacy(preview, &object_key_order(&header)),
            CsvMode::Escaped => Self::encode_escaped(preview, &header)?,
        };

        Ok(EncodedCsv {
            content,
            mime_type: CSV_MIME_TYPE,
            rows: preview.len(),
        })
    }

    fn encode_legacy(preview: &TabularPreview, header: &[&str]) -> String {
        let mut lines = Vec::with_capacity(preview.len() + 1);
        lines.push(header.join(","));

        for row in preview.rows() {
            let values: Vec<String> = header.iter().map(|column| row.text_of(column)).collect();
            lines.push(values.join(","));
        }

        lines.join("\n")
    }

    fn encode_escaped(preview: &TabularPreview, header: &[&str]) -> Result<String> {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer
            .write_record(header)
            .map_err(|e| AppError::Internal(format!("Failed to write CSV header: {}", e)))?;

        for (index, row) in preview.rows().iter().enumerate() {
            let values: Vec<String> = header.iter().map(|column| row.text_of(column)).collect();
            writer.write_record(&values).map_err(|e| {
                AppError::Internal(format!("Failed to write CSV row {}: {}", index + 1, e))
            })?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("Failed to flush CSV writer: {}", e)))?;
        let mut content = String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("CSV output is not UTF-8: {}", e)))?;

        // Same line layout as legacy mode: no terminator after the last row.
        if content.ends_with('\n') {
            content.pop();
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::preview::Row;
    use serde_json::json;

    fn preview(value: serde_json::Value) -> TabularPreview {
        serde_json::from_value(value).unwrap()
    }

    fn legacy(preview: &TabularPreview) -> String {
        CsvEncoder::new(CsvMode::Legacy).encode(preview).unwrap().content
    }

    #[test]
    fn test_end_to_end_example() {
        let input = preview(json!([
            {"age": "30", "city": "NYC"},
            {"age": "25", "city": "LA"}
        ]));
        assert_eq!(legacy(&input), "age,city\n30,NYC\n25,LA");
    }

    #[test]
    fn test_header_is_first_row_key_order() {
        let input = preview(json!([
            {"zip": 1, "name": "a", "age": 2},
            {"age": 3, "zip": 4, "name": "b"}
        ]));
        let out = legacy(&input);
        assert_eq!(out.lines().next(), Some("zip,name,age"));
    }

    #[test]
    fn test_legacy_header_lists_numeric_columns_first() {
        let input = preview(json!([
            {"Name": "A", "2020": 1, "2021": 2},
            {"Name": "B", "2021": 4, "2020": 3}
        ]));
        assert_eq!(legacy(&input), "2020,2021,Name\n1,2,A\n3,4,B");

        let escaped = CsvEncoder::new(CsvMode::Escaped).encode(&input).unwrap();
        assert_eq!(escaped.content, "Name,2020,2021\nA,1,2\nB,3,4");
    }

    #[test]
    fn test_values_follow_header_order_not_row_order() {
        let input = preview(json!([
            {"a": "1", "b": "2"},
            {"b": "4", "a": "3"}
        ]));
        assert_eq!(legacy(&input), "a,b\n1,2\n3,4");
    }

    #[test]
    fn test_line_count_is_rows_plus_header() {
        let rows: Vec<Row> = (0..7i64)
            .map(|i| Row::new().with("id", i).with("label", "x"))
            .collect();
        let input = TabularPreview::new(rows);
        let out = legacy(&input);
        assert_eq!(out.split('\n').count(), 8);
        assert!(!out.ends_with('\n'));
    }

    #[test]
    fn test_null_and_missing_cells_are_empty() {
        let input = preview(json!([
            {"a": null, "b": 1.0, "c": true},
            {"a": "x"}
        ]));
        assert_eq!(legacy(&input), "a,b,c\n,1,true\nx,,");
    }

    #[test]
    fn test_legacy_mode_does_not_escape() {
        let input = preview(json!([{"name": "Doe, Jane", "age": 41}]));
        let out = legacy(&input);
        assert_eq!(out, "name,age\nDoe, Jane,41");

        let fields: Vec<&str> = out.lines().nth(1).unwrap().split(',').collect();
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_round_trip_on_safe_data() {
        let input = preview(json!([
            {"name": "Alice", "age": 30, "active": true},
            {"name": "Bob", "age": 25.5, "active": false},
            {"name": "Carol", "age": null, "active": true}
        ]));
        let out = legacy(&input);

        let mut lines = out.split('\n');
        let header: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(header, input.header().unwrap());

        for (line, row) in lines.zip(input.rows()) {
            let values: Vec<&str> = line.split(',').collect();
            assert_eq!(values.len(), header.len());
            for (column, value) in header.iter().zip(values) {
                assert_eq!(row.text_of(column), value);
            }
        }
    }

    #[test]
    fn test_escaped_mode_quotes_special_values() {
        let input = preview(json!([
            {"name": "Doe, Jane", "quote": "say \"hi\"", "note": "line1\nline2"},
            {"name": "Plain", "quote": "", "note": "ok"}
        ]));
        let out = CsvEncoder::new(CsvMode::Escaped).encode(&input).unwrap();
        assert_eq!(
            out.content,
            "name,quote,note\n\"Doe, Jane\",\"say \"\"hi\"\"\",\"line1\nline2\"\nPlain,,ok"
        );

        let mut reader = csv::ReaderBuilder::new().from_reader(out.as_bytes());
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "Doe, Jane");
        assert_eq!(&records[0][1], "say \"hi\"");
        assert_eq!(&records[0][2], "line1\nline2");
    }

    #[test]
    fn test_escaped_matches_legacy_on_safe_data() {
        let input = preview(json!([
            {"age": "30", "city": "NYC"},
            {"age": "25", "city": "LA"}
        ]));
        let escaped = CsvEncoder::new(CsvMode::Escaped).encode(&input).unwrap();
        assert_eq!(escaped.content, legacy(&input));
    }

    #[test]
    fn test_empty_preview_is_rejected() {
        let result = CsvEncoder::default().encode(&TabularPreview::default());
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_mime_type() {
        let input = preview(json!([{"a": 1}]));
        let out = CsvEncoder::default().encode(&input).unwrap();
        assert_eq!(out.mime_type, "text/csv;charset=utf-8;");
        assert_eq!(out.rows, 1);
    }
}
