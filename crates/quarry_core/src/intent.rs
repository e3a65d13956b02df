//! Intent classification results.

use serde::{Deserialize, Serialize};

/// Coarse purpose of an analytic request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Intent {
    /// Counts, sums and totals
    Statistics,
    /// Open-ended analysis
    Analysis,
    /// Change over time
    Trend,
    /// Side-by-side comparison
    Comparison,
    /// Row filtering and lookup
    Filter,
    /// Grouped aggregation
    Aggregation,
    /// Top-N and ordering
    Ranking,
    /// Shares and proportions
    Distribution,
    /// Relationships between measures
    Correlation,
    /// Could not be determined
    Unknown,
}

impl Intent {
    /// Scored intents in tie-break order: on equal scores the earlier entry wins.
    pub const PRIORITY: [Intent; 9] = [
        Intent::Statistics,
        Intent::Analysis,
        Intent::Trend,
        Intent::Comparison,
        Intent::Filter,
        Intent::Aggregation,
        Intent::Ranking,
        Intent::Distribution,
        Intent::Correlation,
    ];

    /// Intents that tend to scan and combine more data.
    pub fn is_analytical(self) -> bool {
        matches!(self, Intent::Analysis | Intent::Trend | Intent::Correlation)
    }
}

/// Business entity named in a request.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Entity {
    /// Users / customers
    User,
    /// Orders
    Order,
    /// Products
    Product,
}

/// Coarse parameters pulled out of the raw text alongside the intent.
///
/// Each field is filled by the first matching phrase in a fixed priority list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentParameters {
    /// Time-range phrase as written (e.g. "last 7 days")
    pub time_range: Option<String>,
    /// Aggregation-function phrase as written (e.g. "average")
    pub aggregation: Option<String>,
    /// First numeric literal in the text
    pub limit: Option<u64>,
    /// Entity keyword
    pub entity: Option<Entity>,
}

/// Outcome of classifying one request.
///
/// # Examples
///
/// ```
/// use quarry_core::{Intent, IntentParameters, IntentResult};
///
/// let result = IntentResult::new(Intent::Trend, 1.7, IntentParameters::default(), "sales trend");
/// assert_eq!(*result.confidence(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct IntentResult {
    /// Winning intent
    intent: Intent,
    /// Confidence in [0, 1]
    confidence: f64,
    /// Secondary extractions
    parameters: IntentParameters,
    /// The text that was classified
    raw_text: String,
}

impl IntentResult {
    /// Build a result; confidence is clamped into [0, 1].
    pub fn new(
        intent: Intent,
        confidence: f64,
        parameters: IntentParameters,
        raw_text: impl Into<String>,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            intent,
            confidence,
            parameters,
            raw_text: raw_text.into(),
        }
    }
}
