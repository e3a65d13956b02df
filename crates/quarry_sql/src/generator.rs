//! IR to dialect-specific statements.

use crate::render::{condition_group, identifier, time_predicate};
use crate::validate_sql;
use chrono::NaiveDate;
use quarry_core::{AnalyzedQuery, Dialect, SqlBundle};
use quarry_error::{QuarryResult, SqlError, SqlErrorKind};
use tracing::{debug, instrument, warn};

/// Rows fetched by the sample statement unless configured otherwise.
pub const DEFAULT_SAMPLE_SIZE: u64 = 5;

/// Renders analyzed queries into SQL.
///
/// Immutable after construction; safe to share across tasks.
///
/// # Examples
///
/// ```
/// use quarry_core::Dialect;
/// use quarry_sql::SqlGenerator;
///
/// let generator = SqlGenerator::new();
/// assert_eq!(generator.resolve_dialect("ClickHouse"), Dialect::ClickHouse);
/// assert_eq!(generator.resolve_dialect("oracle"), Dialect::Hive);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_getters::Getters)]
pub struct SqlGenerator {
    sample_size: u64,
    reference_date: Option<NaiveDate>,
}

impl Default for SqlGenerator {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            reference_date: None,
        }
    }
}

/// Pieces shared by the three statements.
struct Clauses {
    select: String,
    from: String,
    predicate: Option<String>,
    group_by: Option<String>,
}

impl Clauses {
    fn where_clause(&self) -> String {
        self.predicate
            .as_ref()
            .map(|p| format!(" WHERE {}", p))
            .unwrap_or_default()
    }

    fn group_by_clause(&self) -> String {
        self.group_by
            .as_ref()
            .map(|g| format!(" GROUP BY {}", g))
            .unwrap_or_default()
    }
}

impl SqlGenerator {
    /// Generator with the default sample size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows fetched by the sample statement.
    pub fn with_sample_size(mut self, sample_size: u64) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Pin "today" for relative time windows.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Parse a dialect name; unknown names fall back to Hive.
    pub fn resolve_dialect(&self, name: &str) -> Dialect {
        match name.trim().parse::<Dialect>() {
            Ok(dialect) => dialect,
            Err(_) => {
                warn!(dialect = name, "Unsupported SQL dialect, falling back to hive");
                Dialect::Hive
            }
        }
    }

    /// Generate for a dialect given by name, recording a warning when the
    /// name is not supported.
    ///
    /// # Errors
    ///
    /// As [`generate`](Self::generate).
    pub fn generate_named(&self, query: &AnalyzedQuery, dialect: &str) -> QuarryResult<SqlBundle> {
        let resolved = self.resolve_dialect(dialect);
        let bundle = self.generate(query, resolved)?;
        if resolved.as_ref() == dialect.trim().to_lowercase() {
            return Ok(bundle);
        }
        let mut warnings = bundle.warnings().clone();
        warnings.insert(
            0,
            format!("unsupported dialect '{}', generated hive SQL", dialect),
        );
        Ok(SqlBundle::new(
            bundle.sql().clone(),
            bundle.count_sql().clone(),
            bundle.sample_sql().clone(),
            resolved,
            warnings,
        ))
    }

    /// Generate the main, count and sample statements.
    ///
    /// # Errors
    ///
    /// Returns a SQL error if a table, field or alias is not a plain
    /// identifier, a condition value does not fit its operator, or any
    /// statement fails validation.
    #[instrument(skip(self, query), fields(dialect = %dialect, source = %query.data_source().name()))]
    pub fn generate(&self, query: &AnalyzedQuery, dialect: Dialect) -> QuarryResult<SqlBundle> {
        let clauses = self.clauses(query, dialect)?;
        let output = query.output();

        let mut sql = format!(
            "SELECT {} FROM {}{}{}",
            clauses.select,
            clauses.from,
            clauses.where_clause(),
            clauses.group_by_clause()
        );
        if let Some(sort_by) = output.sort_by() {
            let field = identifier("sort field", sort_by)?;
            sql.push_str(&format!(" ORDER BY {} {}", field, output.sort_direction()));
        }
        if let Some(limit) = output.limit() {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let count_sql = format!(
            "SELECT COUNT(*) AS total_count FROM {}{}",
            clauses.from,
            clauses.where_clause()
        );
        let sample_sql = format!(
            "SELECT {} FROM {}{}{} LIMIT {}",
            clauses.select,
            clauses.from,
            clauses.where_clause(),
            clauses.group_by_clause(),
            self.sample_size
        );

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for (label, statement) in [("main", &sql), ("count", &count_sql), ("sample", &sample_sql)] {
            let validation = validate_sql(statement);
            errors.extend(validation.errors().iter().map(|e| format!("{}: {}", label, e)));
            for warning in validation.warnings() {
                if !warnings.contains(warning) {
                    warnings.push(warning.clone());
                }
            }
        }
        if !errors.is_empty() {
            warn!(errors = ?errors, "Generated SQL failed validation");
            return Err(SqlError::new(SqlErrorKind::Validation(errors.join("; "))).into());
        }

        debug!(sql = %sql, warnings = warnings.len(), "Generated SQL");
        Ok(SqlBundle::new(sql, count_sql, sample_sql, dialect, warnings))
    }

    fn clauses(&self, query: &AnalyzedQuery, dialect: Dialect) -> QuarryResult<Clauses> {
        let source = query.data_source();
        let table = identifier("table", source.table())?;
        let from = match source.database() {
            Some(database) if dialect.supports_qualified_names() => {
                format!("{}.{}", identifier("database", database)?, table)
            }
            _ => table.to_string(),
        };

        let mut select = Vec::new();
        let mut group_by = None;
        if let Some(aggregation) = query.aggregation() {
            for aggregate in aggregation.aggregates() {
                let alias = identifier("alias", aggregate.alias())?;
                select.push(format!("{} as {}", aggregate.function(), alias));
            }
            let mut fields = Vec::new();
            for field in aggregation.group_by() {
                let field = identifier("group-by field", field)?;
                if !aggregation.aggregates().iter().any(|a| a.alias() == field) {
                    select.push(field.to_string());
                }
                fields.push(field);
            }
            if !fields.is_empty() {
                group_by = Some(fields.join(", "));
            }
        }
        let select = if select.is_empty() {
            "*".to_string()
        } else {
            select.join(", ")
        };

        let today = self
            .reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let conditions = condition_group(query.conditions())?;
        let window = match query.time_window() {
            Some(window) => time_predicate(window, source.date_column(), today)?,
            None => None,
        };
        let predicate = match (conditions, window) {
            (Some(c), Some(w)) => Some(format!("{} AND {}", c, w)),
            (c, w) => c.or(w),
        };

        Ok(Clauses {
            select,
            from,
            predicate,
            group_by,
        })
    }
}
