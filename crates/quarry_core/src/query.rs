//! The analyzed-query intermediate representation.

use crate::{DataSourceRef, IntentResult, NluAnalysis};
use chrono::NaiveDate;
use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Comparison operators a condition may use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter, strum::Display,
)]
pub enum Operator {
    /// `=`
    #[serde(rename = "=")]
    #[strum(serialize = "=")]
    Eq,
    /// `>`
    #[serde(rename = ">")]
    #[strum(serialize = ">")]
    Gt,
    /// `<`
    #[serde(rename = "<")]
    #[strum(serialize = "<")]
    Lt,
    /// `>=`
    #[serde(rename = ">=")]
    #[strum(serialize = ">=")]
    Ge,
    /// `<=`
    #[serde(rename = "<=")]
    #[strum(serialize = "<=")]
    Le,
    /// `LIKE`
    #[serde(rename = "like")]
    #[strum(serialize = "like")]
    Like,
    /// `IN (...)`
    #[serde(rename = "in")]
    #[strum(serialize = "in")]
    In,
    /// `BETWEEN a AND b`
    #[serde(rename = "between")]
    #[strum(serialize = "between")]
    Between,
}

impl Operator {
    /// SQL spelling of the operator.
    pub fn sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::Between => "BETWEEN",
        }
    }
}

/// A scalar value on the right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
#[serde(untagged)]
pub enum Literal {
    /// Boolean
    Bool(bool),
    /// Integer
    Integer(i64),
    /// Floating point
    Float(f64),
    /// Text, rendered single-quoted
    Text(String),
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<NaiveDate> for Literal {
    fn from(value: NaiveDate) -> Self {
        Literal::Text(value.format("%Y-%m-%d").to_string())
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    /// Lower and upper bound for `BETWEEN`
    Range {
        /// Lower bound
        low: Literal,
        /// Upper bound
        high: Literal,
    },
    /// Members for `IN`
    List(Vec<Literal>),
    /// Any other comparison
    Single(Literal),
}

impl From<Literal> for ConditionValue {
    fn from(value: Literal) -> Self {
        ConditionValue::Single(value)
    }
}

macro_rules! single_value_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ConditionValue {
                fn from(value: $ty) -> Self {
                    ConditionValue::Single(Literal::from(value))
                }
            }
        )*
    };
}

single_value_from!(&str, String, i64, f64, bool, NaiveDate);

/// How a condition joins the one before it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogicalOp {
    /// Both must hold
    #[default]
    And,
    /// Either may hold
    Or,
}

/// One predicate.
///
/// # Examples
///
/// ```
/// use quarry_core::{Operator, QueryCondition};
///
/// let cond = QueryCondition::new("status", Operator::Eq, "paid");
/// assert_eq!(cond.field(), "status");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct QueryCondition {
    field: String,
    operator: Operator,
    value: ConditionValue,
    #[serde(default)]
    join: LogicalOp,
}

impl QueryCondition {
    /// Condition joined with AND.
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<ConditionValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            join: LogicalOp::And,
        }
    }

    /// Change how this condition joins the previous one.
    pub fn with_join(mut self, join: LogicalOp) -> Self {
        self.join = join;
        self
    }
}

/// One aggregate column: `<function> as <alias>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Aggregate {
    alias: String,
    function: String,
}

impl Aggregate {
    /// Aggregate with the given output alias and SQL expression.
    pub fn new(alias: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            function: function.into(),
        }
    }
}

/// Grouping and aggregation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct AggregationSpec {
    group_by: Vec<String>,
    aggregates: Vec<Aggregate>,
}

impl AggregationSpec {
    /// Empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group-by field; repeated fields are ignored.
    pub fn with_group_by(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.group_by.contains(&field) {
            self.group_by.push(field);
        }
        self
    }

    /// Add an aggregate column; an existing alias is replaced.
    pub fn with_aggregate(mut self, alias: impl Into<String>, function: impl Into<String>) -> Self {
        let aggregate = Aggregate::new(alias, function);
        match self.aggregates.iter_mut().find(|a| a.alias == aggregate.alias) {
            Some(existing) => *existing = aggregate,
            None => self.aggregates.push(aggregate),
        }
        self
    }

    /// True when there is nothing to group or aggregate.
    pub fn is_empty(&self) -> bool {
        self.group_by.is_empty() && self.aggregates.is_empty()
    }
}

/// Temporal filter on the source's date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeWindow {
    /// Fixed bounds; either may be open
    Absolute {
        /// Inclusive start
        start: Option<NaiveDate>,
        /// Inclusive end
        end: Option<NaiveDate>,
    },
    /// The last `days` days up to today
    Relative {
        /// Window length in days
        days: u32,
    },
}

impl TimeWindow {
    /// Window covering exactly one day.
    pub fn single_day(day: NaiveDate) -> Self {
        TimeWindow::Absolute {
            start: Some(day),
            end: Some(day),
        }
    }

    /// Length in days for relative windows.
    pub fn relative_days(&self) -> Option<u32> {
        match self {
            TimeWindow::Relative { days } => Some(*days),
            TimeWindow::Absolute { .. } => None,
        }
    }
}

/// Presentation format for results.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    /// Columns, rows and a summary
    #[default]
    Json,
    /// Delimited text
    Csv,
    /// Rows with display widths
    Table,
    /// Chart specification
    Chart,
}

impl OutputFormat {
    /// Parse a format name; unknown names become JSON.
    pub fn from_name(name: &str) -> Self {
        name.trim().parse().unwrap_or_default()
    }
}

/// Sort direction.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum SortDirection {
    /// Ascending
    Asc,
    /// Descending
    #[default]
    Desc,
}

/// How the caller wants the result shaped.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct OutputSpec {
    format: OutputFormat,
    #[setters(strip_option)]
    limit: Option<u64>,
    #[setters(strip_option, into)]
    sort_by: Option<String>,
    sort_direction: SortDirection,
}

/// Structured form of a free-text request.
///
/// Built once by the compiler and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct AnalyzedQuery {
    /// Text as the user wrote it
    original_query: String,
    /// Classifier output
    intent: IntentResult,
    /// Resolved table
    data_source: DataSourceRef,
    /// Ordered predicates
    #[builder(default)]
    conditions: Vec<QueryCondition>,
    /// Grouping and aggregation, when requested
    #[builder(setter(into, strip_option), default)]
    aggregation: Option<AggregationSpec>,
    /// Time filter, when requested
    #[builder(setter(into, strip_option), default)]
    time_window: Option<TimeWindow>,
    /// Presentation
    #[builder(default)]
    output: OutputSpec,
    /// What the language model understood
    #[builder(default)]
    analysis: NluAnalysis,
    /// One-line description
    #[builder(default)]
    description: String,
    /// Combined confidence in [0, 1]
    confidence_score: f64,
}

impl AnalyzedQuery {
    /// Create a new builder.
    pub fn builder() -> AnalyzedQueryBuilder {
        AnalyzedQueryBuilder::default()
    }
}

impl AnalyzedQueryBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.confidence_score {
            Some(score) if !(0.0..=1.0).contains(&score) => {
                Err(format!("confidence_score must be in [0, 1], got {}", score))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_is_an_ordered_set() {
        let spec = AggregationSpec::new()
            .with_group_by("province")
            .with_group_by("city")
            .with_group_by("province");
        assert_eq!(spec.group_by(), &vec!["province".to_string(), "city".to_string()]);
    }

    #[test]
    fn test_unknown_format_defaults_to_json() {
        assert_eq!(OutputFormat::from_name("xlsx"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_name("CSV"), OutputFormat::Csv);
    }

    #[test]
    fn test_operator_serializes_as_symbol() {
        let json = serde_json::to_string(&Operator::Ge).unwrap();
        assert_eq!(json, "\">=\"");
        assert_eq!(Operator::Between.sql(), "BETWEEN");
    }

    #[test]
    fn test_time_window_tagged() {
        let json = serde_json::to_value(TimeWindow::Relative { days: 7 }).unwrap();
        assert_eq!(json["kind"], "relative");
        assert_eq!(json["days"], 7);
    }
}
