//! Top-level error wrapper types.

use crate::{
    BuilderError, ConfigError, ConnectionError, ExecutionError, ExportError, HttpError, JsonError,
    NluError, SqlError, TaskError,
};

/// Every error the workspace can raise.
///
/// # Examples
///
/// ```
/// use quarry_error::{QuarryError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: QuarryError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum QuarryErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Backend connection error
    #[from(ConnectionError)]
    Connection(ConnectionError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// NLU collaborator error
    #[from(NluError)]
    Nlu(NluError),
    /// SQL validation error
    #[from(SqlError)]
    Sql(SqlError),
    /// Query execution error
    #[from(ExecutionError)]
    Execution(ExecutionError),
    /// Task lifecycle error
    #[from(TaskError)]
    Task(TaskError),
    /// Export error
    #[from(ExportError)]
    Export(ExportError),
}

/// Quarry error with kind discrimination.
///
/// # Examples
///
/// ```
/// use quarry_error::{QuarryResult, ConfigError};
///
/// fn might_fail() -> QuarryResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Quarry Error: {}", _0)]
pub struct QuarryError(Box<QuarryErrorKind>);

impl QuarryError {
    /// Create a new error from a kind.
    pub fn new(kind: QuarryErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &QuarryErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to QuarryErrorKind
impl<T> From<T> for QuarryError
where
    T: Into<QuarryErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Quarry operations.
pub type QuarryResult<T> = std::result::Result<T, QuarryError>;
