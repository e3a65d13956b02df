//! Query execution error types.

/// Failures reported while a backend runs a statement.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum ExecutionErrorKind {
    /// The backend rejected or failed the query
    #[display("Query failed: {}", _0)]
    Query(String),
    /// The backend did not finish within the task timeout
    #[display("Timed out after {} seconds", _0)]
    Timeout(u64),
    /// The job was cancelled before it finished
    #[display("Cancelled: {}", _0)]
    Cancelled(String),
    /// The backend answered with something we could not interpret
    #[display("Unexpected response: {}", _0)]
    Protocol(String),
}

/// Execution error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Execution Error: {} at line {} in {}", kind, line, file)]
pub struct ExecutionError {
    /// The kind of error that occurred
    pub kind: ExecutionErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ExecutionError {
    /// Create a new execution error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ExecutionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
