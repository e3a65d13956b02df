//! Types exchanged with the language-model collaborator.

use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// One completion request.
///
/// # Examples
///
/// ```
/// use quarry_core::NluRequest;
///
/// let request = NluRequest::builder()
///     .system_prompt("You analyse queries.")
///     .user_prompt("count users yesterday")
///     .build()
///     .unwrap();
///
/// assert_eq!(*request.max_tokens(), 4000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, Builder)]
#[builder(setter(into))]
pub struct NluRequest {
    /// Instructions for the model
    system_prompt: String,
    /// The request being analysed
    user_prompt: String,
    /// Sampling temperature
    #[builder(default = "0.7")]
    temperature: f32,
    /// Completion budget
    #[builder(default = "4000")]
    max_tokens: u32,
}

impl NluRequest {
    /// Create a new builder.
    pub fn builder() -> NluRequestBuilder {
        NluRequestBuilder::default()
    }
}

/// What the language model understood about a request.
///
/// Every field is optional; an empty string is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NluAnalysis {
    /// Business entity the request is about
    pub data_entity: Option<String>,
    /// Query type as the model names it
    pub query_type: Option<String>,
    /// Filter conditions, in prose
    pub conditions: Option<String>,
    /// Aggregations, in prose
    pub aggregations: Option<String>,
    /// Time range, in prose
    pub time_range: Option<String>,
    /// Output requirements, in prose
    pub output_requirements: Option<String>,
    /// One-line description
    pub description: Option<String>,
    /// True when the model could not be consulted
    #[serde(default)]
    pub fallback: bool,
}
