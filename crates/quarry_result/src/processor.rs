//! Outcome to envelope.

use crate::{
    FormattedData, PagedRows, QuerySummary, ResultEnvelope, ResultMetadata, format_chart,
    format_csv, format_json, format_table,
};
use quarry_core::{AnalyzedQuery, ExecutionOutcome, OutputFormat};
use tracing::{debug, instrument, warn};

/// Wraps execution outcomes in envelopes.
///
/// Stateless; one instance serves every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultProcessor;

impl ResultProcessor {
    /// Create a processor.
    pub fn new() -> Self {
        Self
    }

    /// Format a successful outcome, or report a failed one.
    ///
    /// Never fails: formatter errors become failure envelopes.
    #[instrument(skip(self, outcome, query), fields(task_id = ?outcome.task_id(), success = *outcome.success()))]
    pub fn process(
        &self,
        outcome: &ExecutionOutcome,
        query: &AnalyzedQuery,
        format: OutputFormat,
    ) -> ResultEnvelope {
        let mut metadata = ResultMetadata::new(format).with_execution_time(*outcome.execution_time());
        if let Some(task_id) = outcome.task_id() {
            metadata = metadata.with_task_id(task_id.clone());
        }

        if !*outcome.success() {
            let error = outcome
                .error()
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
            return ResultEnvelope::failure(error, metadata);
        }

        let metadata = metadata
            .with_row_count(*outcome.row_count())
            .with_query_summary(QuerySummary::from_query(query));
        let rows = outcome.rows();
        let columns = outcome.columns();

        let data = match format {
            OutputFormat::Json => FormattedData::Json(format_json(rows, columns, query)),
            OutputFormat::Csv => match format_csv(rows, columns) {
                Ok(text) => FormattedData::Csv(text),
                Err(e) => {
                    warn!(error = %e, "CSV formatting failed");
                    return ResultEnvelope::failure(e.to_string(), metadata);
                }
            },
            OutputFormat::Table => FormattedData::Table(format_table(rows, columns)),
            OutputFormat::Chart => {
                FormattedData::Chart(format_chart(rows, columns, *query.intent().intent()))
            }
        };

        debug!(format = %format, rows = rows.len(), "Formatted result");
        ResultEnvelope::succeeded(data, metadata)
    }

    /// Replace tabular data with one page of it.
    ///
    /// Failures and non-tabular payloads (CSV text, charts) pass through.
    pub fn paginate(&self, envelope: ResultEnvelope, page: usize, page_size: usize) -> ResultEnvelope {
        envelope.map_data(|data| match data.tabular() {
            Some((columns, rows)) => {
                FormattedData::Paged(PagedRows::new(columns, rows, page, page_size))
            }
            None => data,
        })
    }
}
