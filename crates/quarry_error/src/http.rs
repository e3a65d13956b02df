//! Transport failures talking to an execution backend.

/// A backend request that never produced a readable response: refused
/// connection, timeout, or a body that could not be read.
///
/// HTTP status errors reported by the backend itself are execution errors,
/// not transport errors.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("HTTP Error: {} at line {} in {}", message, line, file)]
pub struct HttpError {
    /// What was being sent and the transport's complaint
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl HttpError {
    /// Transport failure described by `message`.
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry_error::HttpError;
    ///
    /// let err = HttpError::new("Livy statement request failed: connection refused");
    /// assert!(err.message.starts_with("Livy statement"));
    /// ```
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
