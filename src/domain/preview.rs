// ============================================================
// TABULAR PREVIEW
// ============================================================
// Rows of named cells as returned by the cleaning service

use serde::de::{Deserializer, Error as DeError};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// A single cell of a preview row
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    /// Arrays and objects are kept verbatim
    Nested(Value),
}

impl CellValue {
    /// Text shown on screen and written to the export.
    /// Null renders as the empty string.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(value) => value.to_string(),
            CellValue::Number(number) => format_number(number),
            CellValue::Text(text) => text.clone(),
            CellValue::Nested(value) => value.to_string(),
        }
    }
}

fn format_number(number: &Number) -> String {
    match number.as_f64() {
        Some(value) => format_js_number(value),
        None => number.to_string(),
    }
}

/// Number text as a browser prints it (`Number.prototype.toString`):
/// `30.0` -> `30`, `-0.0` -> `0`, `1e21` -> `1e+21`, `1e-7` -> `1e-7`.
pub fn format_js_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return match value {
            v if v.is_nan() => "NaN".to_string(),
            v if v > 0.0 => "Infinity".to_string(),
            _ => "-Infinity".to_string(),
        };
    }

    // Shortest round-trip digits and their decimal exponent.
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        format!("{}.{}", &digits[..n as usize], &digits[n as usize..])
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let sign = if n - 1 < 0 { '-' } else { '+' };
        let rest = if k > 1 {
            format!("{}.{}", &digits[..1], &digits[1..])
        } else {
            digits
        };
        format!("{}e{}{}", rest, sign, (n - 1).abs())
    };

    if value < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

/// Canonical array index (`"0"`, `"2020"`, not `"01"`), the keys a JS
/// object enumerates first.
fn is_array_index(key: &str) -> bool {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if key.len() > 1 && key.starts_with('0') {
        return false;
    }
    matches!(key.parse::<u64>(), Ok(index) if index < u32::MAX as u64)
}

/// Reorder keys the way `Object.keys` lists them: array indices
/// ascending, then every other key in insertion order.
pub fn object_key_order<'a>(keys: &[&'a str]) -> Vec<&'a str> {
    let mut indices: Vec<&str> = keys.iter().copied().filter(|k| is_array_index(k)).collect();
    indices.sort_by_key(|k| k.parse::<u64>().unwrap_or(0));
    indices.extend(keys.iter().copied().filter(|k| !is_array_index(k)));
    indices
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(value) => CellValue::Bool(value),
            Value::Number(number) => CellValue::Number(number),
            Value::String(text) => CellValue::Text(text),
            other => CellValue::Nested(other),
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(Number::from(value))
    }
}

impl From<CellValue> for Value {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::Null => Value::Null,
            CellValue::Bool(value) => Value::Bool(value),
            CellValue::Number(number) => Value::Number(number),
            CellValue::Text(text) => Value::String(text),
            CellValue::Nested(value) => value,
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Value::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(CellValue::from)
    }
}

/// One preview row. Cells keep the order they arrived in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; replaces an existing cell in place.
    pub fn with(mut self, column: &str, value: impl Into<CellValue>) -> Self {
        self.insert(column.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, column: String, value: CellValue) {
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// Display text of `column`; missing cells render like null.
    pub fn text_of(&self, column: &str) -> String {
        self.get(column)
            .map(CellValue::display_text)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Object(object) => Ok(Row::from(object)),
            other => Err(D::Error::custom(format!(
                "preview row must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl From<Map<String, Value>> for Row {
    fn from(object: Map<String, Value>) -> Self {
        Self {
            cells: object
                .into_iter()
                .map(|(name, value)| (name, CellValue::from(value)))
                .collect(),
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Ordered preview rows. The first row defines the column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabularPreview {
    rows: Vec<Row>,
}

impl TabularPreview {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names of the first row, or `None` when there are no rows.
    pub fn header(&self) -> Option<Vec<&str>> {
        self.rows.first().map(|row| row.columns().collect())
    }
}
