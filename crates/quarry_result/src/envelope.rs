//! The uniform response wrapper.

use crate::FormattedData;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use quarry_core::{AnalyzedQuery, OutputFormat};
use serde::{Deserialize, Serialize};

/// Short description of the query behind a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct QuerySummary {
    original_query: String,
    intent: String,
    data_source: String,
    has_conditions: bool,
    has_aggregations: bool,
    confidence_score: f64,
}

impl QuerySummary {
    /// Summarize an analyzed query.
    pub fn from_query(query: &AnalyzedQuery) -> Self {
        Self {
            original_query: query.original_query().clone(),
            intent: query.intent().intent().to_string(),
            data_source: query.data_source().table().clone(),
            has_conditions: !query.conditions().is_empty(),
            has_aggregations: query.aggregation().is_some(),
            confidence_score: *query.confidence_score(),
        }
    }
}

/// Facts about how a result was produced.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct ResultMetadata {
    #[setters(strip_option, into)]
    task_id: Option<String>,
    /// Backend seconds
    execution_time: f64,
    row_count: usize,
    format: OutputFormat,
    timestamp: DateTime<Utc>,
    #[setters(strip_option)]
    query_summary: Option<QuerySummary>,
}

impl ResultMetadata {
    /// Metadata stamped now, for the given format.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            task_id: None,
            execution_time: 0.0,
            row_count: 0,
            format,
            timestamp: Utc::now(),
            query_summary: None,
        }
    }
}

/// Success or failure of one request, with metadata.
///
/// A failure never carries formatted data; the two constructors are the
/// only way to build one.
///
/// # Examples
///
/// ```
/// use quarry_core::OutputFormat;
/// use quarry_result::{ResultEnvelope, ResultMetadata};
///
/// let envelope = ResultEnvelope::failure("not connected", ResultMetadata::new(OutputFormat::Json));
/// assert!(!*envelope.success());
/// assert!(envelope.data().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ResultEnvelope {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<FormattedData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    metadata: ResultMetadata,
    /// Analyzed-query and task details added by the agent
    #[serde(skip_serializing_if = "Option::is_none")]
    query_info: Option<serde_json::Value>,
    /// Position in a batch
    #[serde(skip_serializing_if = "Option::is_none")]
    batch_index: Option<usize>,
}

impl ResultEnvelope {
    /// Successful result.
    pub fn succeeded(data: FormattedData, metadata: ResultMetadata) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata,
            query_info: None,
            batch_index: None,
        }
    }

    /// Failed result.
    pub fn failure(error: impl Into<String>, metadata: ResultMetadata) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metadata,
            query_info: None,
            batch_index: None,
        }
    }

    /// Attach query and task details.
    pub fn with_query_info(mut self, query_info: serde_json::Value) -> Self {
        self.query_info = Some(query_info);
        self
    }

    /// Tag with a batch position.
    pub fn with_batch_index(mut self, index: usize) -> Self {
        self.batch_index = Some(index);
        self
    }

    /// Replace the payload of a successful envelope; failures are returned
    /// unchanged.
    pub(crate) fn map_data(mut self, f: impl FnOnce(FormattedData) -> FormattedData) -> Self {
        self.data = self.data.map(f);
        self
    }
}
