//! Chart specifications chosen from the request intent.

use crate::formatters::{effective_columns, value_text};
use quarry_core::{Intent, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pie charts with more slices than this fall back to a table.
const MAX_PIE_SLICES: usize = 20;

/// A renderable chart, or the table it degraded to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartSpec {
    /// Vertical or horizontal bars
    Bar {
        /// Bars run left to right
        horizontal: bool,
        /// Labels and series
        data: ChartData,
        /// Display options
        options: ChartOptions,
    },
    /// Line per series
    Line {
        /// Labels and series
        data: ChartData,
        /// Display options
        options: ChartOptions,
    },
    /// One slice per row
    Pie {
        /// Labels and the single series
        data: ChartData,
        /// Display options
        options: ChartOptions,
    },
    /// Data unsuited to a chart
    Table {
        /// Column order
        columns: Vec<String>,
        /// Rows as returned
        data: Vec<Row>,
        /// Why no chart was drawn
        message: String,
    },
    /// Nothing to plot
    #[serde(rename = "chart")]
    Empty {
        /// Always empty
        data: Vec<Row>,
        /// Why no chart was drawn
        error: String,
    },
}

/// Labels and series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// One label per row, from the first column
    pub labels: Vec<String>,
    /// One series per value column
    pub datasets: Vec<Dataset>,
}

/// Colour of a series: one for all points, or one per point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Colors {
    /// Same colour for every point
    Single(String),
    /// One colour per point
    Each(Vec<String>),
}

/// One series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Series name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Values, one per label
    pub data: Vec<Value>,
    /// Fill colour
    pub background_color: Colors,
    /// Line / border colour
    pub border_color: Colors,
    /// Border width in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    /// Line smoothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
}

/// Display options in the shape chart front ends expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    /// Resize with the container
    pub responsive: bool,
    /// Legend and title
    pub plugins: ChartPlugins,
}

/// Legend and title settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPlugins {
    /// Legend placement
    pub legend: Legend,
    /// Chart title
    pub title: Title,
}

/// Legend placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    /// "top", "right", ...
    pub position: String,
}

/// Chart title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    /// Show the title
    pub display: bool,
    /// Title text
    pub text: String,
}

impl ChartOptions {
    fn new(legend: &str, title: &str) -> Self {
        Self {
            responsive: true,
            plugins: ChartPlugins {
                legend: Legend {
                    position: legend.to_string(),
                },
                title: Title {
                    display: true,
                    text: title.to_string(),
                },
            },
        }
    }
}

/// Chart for `rows`, typed by `intent`.
///
/// Statistics draw bars, trends lines, distributions pies, rankings
/// horizontal bars; anything else, or data without a value column, is
/// returned as a table.
pub fn format_chart(rows: &[Row], columns: &[String], intent: Intent) -> ChartSpec {
    if rows.is_empty() {
        return ChartSpec::Empty {
            data: Vec::new(),
            error: "no data to chart".to_string(),
        };
    }
    let columns = effective_columns(rows, columns);

    match intent {
        Intent::Statistics => bar_chart(rows, &columns, false),
        Intent::Ranking => bar_chart(rows, &columns, true),
        Intent::Trend => line_chart(rows, &columns),
        Intent::Distribution => pie_chart(rows, &columns),
        _ => table_chart(rows, &columns),
    }
}

fn channel(value: i64) -> i64 {
    value.clamp(0, 255)
}

fn rgba(r: i64, g: i64, b: i64, alpha: f64) -> String {
    format!("rgba({}, {}, {}, {})", channel(r), channel(g), channel(b), alpha)
}

fn labels(rows: &[Row], column: &str) -> Vec<String> {
    rows.iter()
        .map(|row| row.get(column).map(value_text).unwrap_or_default())
        .collect()
}

fn series(rows: &[Row], column: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| row.get(column).cloned().unwrap_or(Value::from(0)))
        .collect()
}

fn bar_chart(rows: &[Row], columns: &[String], horizontal: bool) -> ChartSpec {
    if columns.len() < 2 {
        return table_chart(rows, columns);
    }

    let datasets = columns[1..]
        .iter()
        .zip(1i64..)
        .map(|(column, i)| {
            let (r, g, b) = (54 + 30 * i, 162 - 20 * i, 235 - 10 * i);
            Dataset {
                label: Some(column.clone()),
                data: series(rows, column),
                background_color: Colors::Single(rgba(r, g, b, 0.6)),
                border_color: Colors::Single(rgba(r, g, b, 1.0)),
                border_width: Some(1),
                tension: None,
            }
        })
        .collect();

    ChartSpec::Bar {
        horizontal,
        data: ChartData {
            labels: labels(rows, &columns[0]),
            datasets,
        },
        options: ChartOptions::new("top", "Statistics"),
    }
}

fn line_chart(rows: &[Row], columns: &[String]) -> ChartSpec {
    if columns.len() < 2 {
        return table_chart(rows, columns);
    }

    let datasets = columns[1..]
        .iter()
        .zip(1i64..)
        .map(|(column, i)| {
            let (r, g, b) = (75 + 20 * i, 192 - 15 * i, 192 - 10 * i);
            Dataset {
                label: Some(column.clone()),
                data: series(rows, column),
                background_color: Colors::Single(rgba(r, g, b, 0.2)),
                border_color: Colors::Single(rgba(r, g, b, 1.0)),
                border_width: None,
                tension: Some(0.1),
            }
        })
        .collect();

    ChartSpec::Line {
        data: ChartData {
            labels: labels(rows, &columns[0]),
            datasets,
        },
        options: ChartOptions::new("top", "Trend"),
    }
}

fn pie_chart(rows: &[Row], columns: &[String]) -> ChartSpec {
    if columns.len() < 2 || rows.len() > MAX_PIE_SLICES {
        return table_chart(rows, columns);
    }

    let colors: Vec<String> = (0..rows.len())
        .map(|i| format!("hsl({}, 70%, 50%)", (i as f64 * 137.5) % 360.0))
        .collect();

    ChartSpec::Pie {
        data: ChartData {
            labels: labels(rows, &columns[0]),
            datasets: vec![Dataset {
                label: None,
                data: series(rows, &columns[1]),
                background_color: Colors::Each(colors.clone()),
                border_color: Colors::Each(colors),
                border_width: Some(1),
                tension: None,
            }],
        },
        options: ChartOptions::new("right", "Distribution"),
    }
}

fn table_chart(rows: &[Row], columns: &[String]) -> ChartSpec {
    ChartSpec::Table {
        columns: columns.to_vec(),
        data: rows.to_vec(),
        message: "data shown as a table".to_string(),
    }
}
