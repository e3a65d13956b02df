//! JSON, CSV and table shapes.

use crate::ChartSpec;
use derive_getters::Getters;
use quarry_core::{AnalyzedQuery, Row};
use quarry_error::{ExportError, ExportErrorKind, QuarryResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PagedRows;

/// Widest a table column is ever reported.
pub const MAX_COLUMN_WIDTH: usize = 50;

/// Formatted payload of a successful envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormattedData {
    /// Columns, rows and a summary
    Json(JsonData),
    /// RFC 4180 text
    Csv(String),
    /// Rows with display widths
    Table(TableData),
    /// Chart specification
    Chart(ChartSpec),
    /// One page of rows
    Paged(PagedRows),
}

impl FormattedData {
    /// Columns and rows, for shapes that carry them.
    pub fn tabular(&self) -> Option<(&[String], &[Row])> {
        match self {
            FormattedData::Json(data) => Some((&data.columns, &data.rows)),
            FormattedData::Table(data) => Some((&data.columns, &data.rows)),
            FormattedData::Paged(data) => Some((data.columns(), data.rows())),
            FormattedData::Csv(_) | FormattedData::Chart(_) => None,
        }
    }
}

/// Summary attached to JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct JsonSummary {
    total_rows: usize,
    query_type: String,
    confidence: f64,
}

/// JSON output shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct JsonData {
    columns: Vec<String>,
    rows: Vec<Row>,
    summary: JsonSummary,
}

/// Table output shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct TableData {
    columns: Vec<String>,
    rows: Vec<Row>,
    /// Display width per column, aligned with `columns`
    column_widths: Vec<usize>,
    total_rows: usize,
}

/// Text of a cell: strings unquoted, null empty, anything else as JSON.
///
/// # Examples
///
/// ```
/// use quarry_result::value_text;
/// use serde_json::json;
///
/// assert_eq!(value_text(&json!("Beijing")), "Beijing");
/// assert_eq!(value_text(&json!(42)), "42");
/// assert_eq!(value_text(&json!(null)), "");
/// ```
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Columns to use: the given ones, else the first row's keys.
pub(crate) fn effective_columns(rows: &[Row], columns: &[String]) -> Vec<String> {
    if columns.is_empty() {
        rows.first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    } else {
        columns.to_vec()
    }
}

/// JSON shape with a summary of the query.
pub fn format_json(rows: &[Row], columns: &[String], query: &AnalyzedQuery) -> JsonData {
    JsonData {
        columns: columns.to_vec(),
        rows: rows.to_vec(),
        summary: JsonSummary {
            total_rows: rows.len(),
            query_type: query.intent().intent().to_string(),
            confidence: *query.confidence_score(),
        },
    }
}

/// CSV text with a header row; empty input gives an empty string.
///
/// # Errors
///
/// Returns an export error if the CSV writer fails.
pub fn format_csv(rows: &[Row], columns: &[String]) -> QuarryResult<String> {
    if rows.is_empty() {
        return Ok(String::new());
    }
    let columns = effective_columns(rows, columns);
    let serialize_error = |e: &dyn std::fmt::Display| {
        ExportError::new(ExportErrorKind::Serialize(format!("CSV: {}", e)))
    };

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer
        .write_record(&columns)
        .map_err(|e| serialize_error(&e))?;
    for row in rows {
        let record = columns
            .iter()
            .map(|column| row.get(column).map(value_text).unwrap_or_default());
        writer.write_record(record).map_err(|e| serialize_error(&e))?;
    }
    let bytes = writer.into_inner().map_err(|e| serialize_error(&e))?;
    Ok(String::from_utf8(bytes).map_err(|e| serialize_error(&e))?)
}

/// Table shape with per-column display widths.
pub fn format_table(rows: &[Row], columns: &[String]) -> TableData {
    let columns = effective_columns(rows, columns);
    let column_widths = columns
        .iter()
        .map(|column| {
            rows.iter()
                .map(|row| {
                    row.get(column)
                        .map(|value| value_text(value).chars().count())
                        .unwrap_or(0)
                })
                .fold(column.chars().count(), usize::max)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();

    TableData {
        columns,
        rows: rows.to_vec(),
        column_widths,
        total_rows: rows.len(),
    }
}
