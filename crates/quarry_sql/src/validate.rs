//! Structural checks on generated statements.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Findings from [`validate_sql`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct SqlValidation {
    /// Problems that make the statement unusable
    errors: Vec<String>,
    /// Problems worth reporting that do not block execution
    warnings: Vec<String>,
}

impl SqlValidation {
    /// True when no errors were found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check that `sql` is a plausible SELECT statement.
///
/// Parentheses inside single-quoted literals are ignored. An unterminated
/// literal is reported as a warning.
///
/// # Examples
///
/// ```
/// use quarry_sql::validate_sql;
///
/// assert!(validate_sql("SELECT * FROM t WHERE name = 'a)'").is_valid());
/// assert!(!validate_sql("DELETE FROM t").is_valid());
/// ```
pub fn validate_sql(sql: &str) -> SqlValidation {
    let mut validation = SqlValidation::default();
    let upper = sql.trim().to_uppercase();

    if !upper.starts_with("SELECT") {
        validation
            .errors
            .push("statement must start with SELECT".to_string());
    }
    if !upper.contains("FROM") {
        validation
            .errors
            .push("statement must contain FROM".to_string());
    }

    let mut depth: i64 = 0;
    let mut in_literal = false;
    for ch in sql.chars() {
        match ch {
            '\'' => in_literal = !in_literal,
            '(' if !in_literal => depth += 1,
            ')' if !in_literal => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            _ => {}
        }
    }

    if depth != 0 {
        validation
            .errors
            .push("unbalanced parentheses".to_string());
    }
    if in_literal && depth >= 0 {
        validation
            .warnings
            .push("unterminated string literal".to_string());
    }

    validation
}
