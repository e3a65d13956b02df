//! Fixed phrase rules turning request text into IR fragments.
//!
//! Every table is scanned in order; matching is substring-based on lowercased
//! text.

use chrono::{Datelike, Duration, NaiveDate};
use quarry_core::{
    AggregationSpec, Intent, NluAnalysis, Operator, OutputFormat, OutputSpec, QueryCondition,
    SortDirection, TimeWindow,
};
use quarry_error::{ConfigError, QuarryResult};
use regex::Regex;

use crate::classifier::first_number;

/// Right-hand side of a condition rule.
#[derive(Debug, Clone, Copy)]
enum RuleValue {
    Text(&'static str),
    Integer(i64),
}

/// Condition rules: phrases, field, value. Only the first rule per field
/// applies, so longer phrases that contain shorter ones come first.
const CONDITION_RULES: &[(&[&str], &str, RuleValue)] = &[
    (&["inactive", "未激活", "不活跃"], "status", RuleValue::Text("inactive")),
    (&["active", "活跃"], "status", RuleValue::Text("active")),
    (&["unpaid", "未支付"], "status", RuleValue::Text("unpaid")),
    (&["paid", "已支付"], "status", RuleValue::Text("paid")),
    (&["refunded", "refund", "退款"], "status", RuleValue::Text("refunded")),
    (&["new user", "新用户"], "is_new", RuleValue::Integer(1)),
    (&["vip", "会员"], "level", RuleValue::Text("vip")),
];

/// Phrases that ask for grouping.
const GROUPING_TRIGGERS: &[&str] = &["group by", "grouped by", "per ", "for each", "分组", "按"];

/// Group-by field table, in priority order.
const GROUP_FIELDS: &[(&[&str], &str)] = &[
    (&["province", "省份", "省"], "province"),
    (&["city", "城市"], "city"),
    (&["date", "day", "daily", "日期", "每天", "天"], "date"),
];

/// Aggregate function table: phrases, alias, SQL expression.
const AGGREGATE_FUNCTIONS: &[(&[&str], &str, &str)] = &[
    (&["count", "how many", "number of", "计数", "数量"], "count", "count(*)"),
    (&["sum", "total", "求和", "总额", "总计"], "total", "sum(amount)"),
    (&["average", "avg", "mean", "平均"], "avg_amount", "avg(amount)"),
    (&["max", "highest", "最大", "最高"], "max_amount", "max(amount)"),
    (&["min", "lowest", "最小", "最低"], "min_amount", "min(amount)"),
];

/// Fixed relative windows.
const RELATIVE_PHRASES: &[(&[&str], u32)] = &[
    (&["past week", "过去一周", "最近一周"], 7),
    (&["past month", "过去一个月", "最近一个月"], 30),
    (&["past quarter", "过去一个季度", "最近三个月"], 90),
];

/// Output-format keywords; checked in this order.
const FORMAT_KEYWORDS: &[(&[&str], OutputFormat)] = &[
    (&["chart", "graph", "plot", "图表", "可视化"], OutputFormat::Chart),
    (&["csv", "export", "导出"], OutputFormat::Csv),
    (&["table", "表格"], OutputFormat::Table),
];

const ASCENDING_PHRASES: &[&str] = &["ascending", "lowest", "升序"];

const RELATIVE_DAYS_PATTERN: &str = r"(?:last|past)\s+(\d+)\s+days?|(?:最近|过去|近)(\d+)天";

/// Compiled rule set.
#[derive(Debug, Clone)]
pub(crate) struct Rules {
    relative_days: Regex,
}

impl Rules {
    /// Compile the pattern-based rules.
    pub(crate) fn new() -> QuarryResult<Self> {
        let relative_days = Regex::new(RELATIVE_DAYS_PATTERN)
            .map_err(|e| ConfigError::new(format!("Invalid relative-days pattern: {}", e)))?;
        Ok(Self { relative_days })
    }

    /// Conditions implied by literal phrases.
    pub(crate) fn conditions(&self, lowered: &str) -> Vec<QueryCondition> {
        let mut fields: Vec<&str> = Vec::new();
        let mut conditions = Vec::new();

        for (phrases, field, value) in CONDITION_RULES {
            if fields.contains(field) || !contains_any(lowered, phrases) {
                continue;
            }
            fields.push(*field);
            let condition = match value {
                RuleValue::Text(text) => QueryCondition::new(*field, Operator::Eq, *text),
                RuleValue::Integer(n) => QueryCondition::new(*field, Operator::Eq, *n),
            };
            conditions.push(condition);
        }

        conditions
    }

    /// Grouping and aggregates, only when a grouping phrase is present.
    pub(crate) fn aggregation(&self, lowered: &str) -> Option<AggregationSpec> {
        if !contains_any(lowered, GROUPING_TRIGGERS) {
            return None;
        }

        let mut spec = AggregationSpec::new();
        if let Some((_, field)) = GROUP_FIELDS
            .iter()
            .find(|(phrases, _)| contains_any(lowered, phrases))
        {
            spec = spec.with_group_by(*field);
        }
        for (phrases, alias, function) in AGGREGATE_FUNCTIONS {
            if contains_any(lowered, phrases) {
                spec = spec.with_aggregate(*alias, *function);
            }
        }

        (!spec.is_empty()).then_some(spec)
    }

    /// Time window named by the text, relative to `today`.
    pub(crate) fn time_window(&self, lowered: &str, today: NaiveDate) -> Option<TimeWindow> {
        if let Some(captures) = self.relative_days.captures(lowered) {
            let days = captures
                .get(1)
                .or_else(|| captures.get(2))
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .filter(|days| *days > 0);
            if let Some(days) = days {
                return Some(TimeWindow::Relative { days });
            }
        }

        if contains_any(lowered, &["yesterday", "昨天"]) {
            return Some(TimeWindow::single_day(today - Duration::days(1)));
        }
        if contains_any(lowered, &["today", "今天"]) {
            return Some(TimeWindow::single_day(today));
        }

        if let Some((_, days)) = RELATIVE_PHRASES
            .iter()
            .find(|(phrases, _)| contains_any(lowered, phrases))
        {
            return Some(TimeWindow::Relative { days: *days });
        }

        if contains_any(lowered, &["this month", "本月"]) {
            return Some(TimeWindow::Absolute {
                start: today.with_day(1),
                end: None,
            });
        }
        if contains_any(lowered, &["this year", "今年"]) {
            return Some(TimeWindow::Absolute {
                start: NaiveDate::from_ymd_opt(today.year(), 1, 1),
                end: None,
            });
        }

        None
    }

    /// Presentation settings.
    pub(crate) fn output(
        &self,
        lowered: &str,
        analysis: &NluAnalysis,
        intent: Intent,
        aggregation: Option<&AggregationSpec>,
    ) -> OutputSpec {
        let requirements = analysis
            .output_requirements
            .as_deref()
            .map(str::to_lowercase);
        let format = requirements
            .as_deref()
            .and_then(detect_format)
            .or_else(|| detect_format(lowered))
            .unwrap_or_default();

        let mut output = OutputSpec::default().with_format(format);
        if let Some(limit) = first_number(lowered) {
            output = output.with_limit(limit);
        }
        if intent == Intent::Ranking
            && let Some(first) = aggregation.and_then(|spec| spec.aggregates().first())
        {
            output = output.with_sort_by(first.alias().as_str());
        }
        if contains_any(lowered, ASCENDING_PHRASES) {
            output = output.with_sort_direction(SortDirection::Asc);
        }

        output
    }
}

fn detect_format(text: &str) -> Option<OutputFormat> {
    FORMAT_KEYWORDS
        .iter()
        .find(|(phrases, _)| contains_any(text, phrases))
        .map(|(_, format)| *format)
}

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| text.contains(phrase))
}
