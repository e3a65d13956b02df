//! Task lifecycle errors.

/// Task lifecycle violations.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum TaskErrorKind {
    /// The requested status change is not in the transition table
    #[display("Invalid status transition for task {}: {} -> {}", task_id, from, to)]
    InvalidTransition {
        /// Task identifier
        task_id: String,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
    /// Priority outside 1..=5
    #[display("Priority {} out of range 1..=5", _0)]
    InvalidPriority(u8),
}

/// Task error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Task Error: {} at line {} in {}", kind, line, file)]
pub struct TaskError {
    /// The kind of error that occurred
    pub kind: TaskErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TaskError {
    /// Create a new task error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TaskErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
