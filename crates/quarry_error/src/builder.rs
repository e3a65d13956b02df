//! Errors from assembling structured values out of partial parts.

/// Why a value could not be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BuilderErrorKind {
    /// A required part was never supplied, or a supplied part was rejected
    #[display("Cannot assemble {}: {}", target, reason)]
    Incomplete {
        /// What was being assembled, e.g. "analyzed query"
        target: &'static str,
        /// Builder message naming the missing or rejected part
        reason: String,
    },
}

/// Assembly error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Builder Error: {} at line {} in {}", kind, line, file)]
pub struct BuilderError {
    kind: BuilderErrorKind,
    line: u32,
    file: &'static str,
}

impl BuilderError {
    /// Assembly of `target` failed for `reason`.
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry_error::{BuilderError, BuilderErrorKind};
    ///
    /// let err = BuilderError::incomplete("analyzed query", "`intent` must be initialized");
    /// assert!(matches!(err.kind(), BuilderErrorKind::Incomplete { target: "analyzed query", .. }));
    /// ```
    #[track_caller]
    pub fn incomplete(target: &'static str, reason: impl Into<String>) -> Self {
        Self::new(BuilderErrorKind::Incomplete {
            target,
            reason: reason.into(),
        })
    }

    /// Create a new builder error with caller location tracking.
    #[track_caller]
    pub fn new(kind: BuilderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &BuilderErrorKind {
        &self.kind
    }
}
