//! NLU collaborator error types.

/// Ways a round trip to the language-model collaborator can fail.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum NluErrorKind {
    /// No API key was configured for the provider
    #[display("Missing API key: set {}", _0)]
    MissingApiKey(String),
    /// The request never produced a response
    #[display("Request failed: {}", _0)]
    Request(String),
    /// The provider answered with a non-success status
    #[display("API error (status {}): {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Error body returned by the provider
        message: String,
    },
    /// The response carried no completion text
    #[display("Empty response from provider")]
    EmptyResponse,
    /// The completion text was not the expected JSON object
    #[display("Unparseable response: {}", _0)]
    Parse(String),
    /// The driver is not backed by any provider
    #[display("NLU is disabled")]
    Disabled,
}

impl NluErrorKind {
    /// Whether a retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            NluErrorKind::Request(_) => true,
            NluErrorKind::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// NLU error with location tracking.
///
/// # Examples
///
/// ```
/// use quarry_error::{NluError, NluErrorKind};
///
/// let err = NluError::new(NluErrorKind::Api { status: 503, message: "busy".into() });
/// assert!(err.kind.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("NLU Error: {} at line {} in {}", kind, line, file)]
pub struct NluError {
    /// The kind of error that occurred
    pub kind: NluErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl NluError {
    /// Create a new NLU error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: NluErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
