//! Reshaping raw execution results for callers.
//!
//! [`ResultProcessor`] wraps an [`quarry_core::ExecutionOutcome`] in a
//! [`ResultEnvelope`] holding one of the [`FormattedData`] shapes. Envelopes
//! can then be paginated or exported to JSON / CSV files.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chart;
mod envelope;
mod export;
mod formatters;
mod pagination;
mod processor;

pub use chart::{
    ChartData, ChartOptions, ChartPlugins, ChartSpec, Colors, Dataset, Legend, Title, format_chart,
};
pub use envelope::{QuerySummary, ResultEnvelope, ResultMetadata};
pub use export::{ExportFormat, export_envelope};
pub use formatters::{
    FormattedData, JsonData, JsonSummary, MAX_COLUMN_WIDTH, TableData, format_csv, format_json,
    format_table, value_text,
};
pub use pagination::{PagedRows, Pagination, paginate};
pub use processor::ResultProcessor;
