//! Rendering IR fragments as SQL text.

use chrono::{Days, NaiveDate};
use quarry_core::{ConditionValue, Literal, LogicalOp, Operator, QueryCondition, TimeWindow};
use quarry_error::{QuarryResult, SqlError, SqlErrorKind};

/// Whether `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
///
/// # Examples
///
/// ```
/// use quarry_sql::is_identifier;
///
/// assert!(is_identifier("user_info"));
/// assert!(!is_identifier("user_info; DROP TABLE x"));
/// assert!(!is_identifier("1st"));
/// ```
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Single-quote `text`, doubling embedded quotes.
///
/// # Examples
///
/// ```
/// use quarry_sql::quote_literal;
///
/// assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
/// ```
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// `name` if it is a plain identifier, else an error naming its `role`.
pub(crate) fn identifier<'a>(role: &str, name: &'a str) -> QuarryResult<&'a str> {
    if is_identifier(name) {
        Ok(name)
    } else {
        Err(SqlError::new(SqlErrorKind::InvalidIdentifier {
            role: role.to_string(),
            name: name.to_string(),
        })
        .into())
    }
}

fn invalid(message: String) -> SqlError {
    SqlError::new(SqlErrorKind::Validation(message))
}

pub(crate) fn literal(value: &Literal) -> QuarryResult<String> {
    match value {
        Literal::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Literal::Integer(n) => Ok(n.to_string()),
        Literal::Float(f) if f.is_finite() => Ok(f.to_string()),
        Literal::Float(f) => Err(invalid(format!("non-finite number {} in condition", f)).into()),
        Literal::Text(text) => Ok(quote_literal(text)),
    }
}

/// One condition, without its join keyword.
pub(crate) fn condition(cond: &QueryCondition) -> QuarryResult<String> {
    let field = identifier("condition field", cond.field())?;
    let op = *cond.operator();

    let rhs = match (op, cond.value()) {
        (Operator::In, ConditionValue::List(items)) if !items.is_empty() => {
            let rendered = items.iter().map(literal).collect::<QuarryResult<Vec<_>>>()?;
            format!("({})", rendered.join(", "))
        }
        (Operator::In, ConditionValue::Single(item)) => format!("({})", literal(item)?),
        (Operator::Between, ConditionValue::Range { low, high }) => {
            format!("{} AND {}", literal(low)?, literal(high)?)
        }
        (Operator::Between, ConditionValue::List(items)) if items.len() == 2 => {
            format!("{} AND {}", literal(&items[0])?, literal(&items[1])?)
        }
        (Operator::In | Operator::Between, _) => {
            return Err(invalid(format!("{} on '{}' needs a matching value", op.sql(), field)).into());
        }
        (_, ConditionValue::Single(item)) => literal(item)?,
        (_, _) => {
            return Err(invalid(format!("{} on '{}' needs a single value", op.sql(), field)).into());
        }
    };

    Ok(format!("{} {} {}", field, op.sql(), rhs))
}

/// Conditions joined by their own logical operators; grouped when any OR is
/// present so a following AND binds to the whole group.
pub(crate) fn condition_group(conditions: &[QueryCondition]) -> QuarryResult<Option<String>> {
    let mut rendered = String::new();
    let mut has_or = false;

    for (i, cond) in conditions.iter().enumerate() {
        let text = condition(cond)?;
        if i > 0 {
            if *cond.join() == LogicalOp::Or {
                has_or = true;
            }
            rendered.push_str(&format!(" {} ", cond.join()));
        }
        rendered.push_str(&text);
    }

    Ok(match rendered.is_empty() {
        true => None,
        false if has_or => Some(format!("({})", rendered)),
        false => Some(rendered),
    })
}

/// Date predicate for a window on `column`.
pub(crate) fn time_predicate(
    window: &TimeWindow,
    column: &str,
    today: NaiveDate,
) -> QuarryResult<Option<String>> {
    let column = identifier("date column", column)?;
    let date = |d: NaiveDate| quote_literal(&d.format("%Y-%m-%d").to_string());

    Ok(match *window {
        TimeWindow::Relative { days } => {
            let start = today
                .checked_sub_days(Days::new(u64::from(days)))
                .ok_or_else(|| {
                    invalid(format!("Time window of {} days reaches before the calendar", days))
                })?;
            Some(format!(
                "{} >= {} AND {} <= {}",
                column,
                date(start),
                column,
                date(today)
            ))
        }
        TimeWindow::Absolute {
            start: Some(start),
            end: Some(end),
        } if start == end => Some(format!("{} = {}", column, date(start))),
        TimeWindow::Absolute {
            start: Some(start),
            end: Some(end),
        } => Some(format!(
            "{} >= {} AND {} <= {}",
            column,
            date(start),
            column,
            date(end)
        )),
        TimeWindow::Absolute {
            start: Some(start),
            end: None,
        } => Some(format!("{} >= {}", column, date(start))),
        TimeWindow::Absolute {
            start: None,
            end: Some(end),
        } => Some(format!("{} <= {}", column, date(end))),
        TimeWindow::Absolute {
            start: None,
            end: None,
        } => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_operator_table() {
        let cases = [
            (QueryCondition::new("age", Operator::Ge, 18_i64), "age >= 18"),
            (QueryCondition::new("name", Operator::Like, "%li%"), "name LIKE '%li%'"),
            (
                QueryCondition::new(
                    "city",
                    Operator::In,
                    ConditionValue::List(vec!["Beijing".into(), "Shanghai".into()]),
                ),
                "city IN ('Beijing', 'Shanghai')",
            ),
            (
                QueryCondition::new(
                    "amount",
                    Operator::Between,
                    ConditionValue::Range {
                        low: 10_i64.into(),
                        high: 20.5.into(),
                    },
                ),
                "amount BETWEEN 10 AND 20.5",
            ),
        ];
        for (cond, expected) in cases {
            assert_eq!(condition(&cond).unwrap(), expected);
        }
    }

    #[test]
    fn test_mismatched_values_are_rejected() {
        let cond = QueryCondition::new("age", Operator::Between, 3_i64);
        assert!(condition(&cond).is_err());
        let cond = QueryCondition::new("age", Operator::In, ConditionValue::List(vec![]));
        assert!(condition(&cond).is_err());
        let cond = QueryCondition::new("age", Operator::Eq, f64::NAN);
        assert!(condition(&cond).is_err());
    }

    #[test]
    fn test_bad_field_is_rejected() {
        let cond = QueryCondition::new("a = 1 OR 1", Operator::Eq, 1_i64);
        assert!(condition(&cond).is_err());
    }

    #[test]
    fn test_or_groups_are_parenthesised() {
        let conditions = vec![
            QueryCondition::new("status", Operator::Eq, "paid"),
            QueryCondition::new("level", Operator::Eq, "vip").with_join(LogicalOp::Or),
        ];
        assert_eq!(
            condition_group(&conditions).unwrap().as_deref(),
            Some("(status = 'paid' OR level = 'vip')")
        );
        assert_eq!(condition_group(&[]).unwrap(), None);
    }

    #[test]
    fn test_time_predicates() {
        let today = day(20);
        let relative = time_predicate(&TimeWindow::Relative { days: 7 }, "date", today).unwrap();
        assert_eq!(
            relative.as_deref(),
            Some("date >= '2024-05-13' AND date <= '2024-05-20'")
        );
        let single = time_predicate(&TimeWindow::single_day(day(19)), "dt", today).unwrap();
        assert_eq!(single.as_deref(), Some("dt = '2024-05-19'"));
        let open = TimeWindow::Absolute { start: None, end: Some(day(1)) };
        assert_eq!(
            time_predicate(&open, "date", today).unwrap().as_deref(),
            Some("date <= '2024-05-01'")
        );
    }

    #[test]
    fn test_window_before_the_calendar_is_rejected() {
        let err = time_predicate(&TimeWindow::Relative { days: u32::MAX }, "date", day(20))
            .unwrap_err();
        assert!(err.to_string().contains("reaches before the calendar"), "{}", err);
    }
}
