//! Backend connection error types.

/// A backend could not be reached, or was used before connecting.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Connection Error: {} at line {} in {}", message, line, file)]
pub struct ConnectionError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConnectionError {
    /// Create a new ConnectionError with the given message at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
