//! Result export errors.

/// Kinds of export errors.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ExportErrorKind {
    /// Attempted to export a failed result
    #[display("Cannot export a failed result: {}", _0)]
    FailedResult(String),
    /// The envelope holds nothing exportable in the requested format
    #[display("Nothing to export: {}", _0)]
    NoData(String),
    /// Failed to write the output file
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to serialize the payload
    #[display("Serialization failed: {}", _0)]
    Serialize(String),
}

/// Export error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Export Error: {} at line {} in {}", kind, line, file)]
pub struct ExportError {
    /// The kind of error that occurred
    pub kind: ExportErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ExportError {
    /// Create a new export error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ExportErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
