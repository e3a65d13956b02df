//! SQL generation and validation errors.

/// Reasons a generated statement is rejected.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SqlErrorKind {
    /// Structural validation failed; carries every problem found, joined
    #[display("Validation failed: {}", _0)]
    Validation(String),
    /// A table, field or alias name is not a plain identifier
    #[display("Invalid identifier for {}: '{}'", role, name)]
    InvalidIdentifier {
        /// What the identifier names (table, field, alias, ...)
        role: String,
        /// The rejected text
        name: String,
    },
}

/// SQL error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("SQL Error: {} at line {} in {}", kind, line, file)]
pub struct SqlError {
    /// The kind of error that occurred
    pub kind: SqlErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl SqlError {
    /// Create a new SQL error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SqlErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
