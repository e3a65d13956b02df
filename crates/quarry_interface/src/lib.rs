//! Trait definitions for the collaborators of the Quarry pipeline.
//!
//! - [`NluDriver`] - language-model round trip used for deep query understanding
//! - [`ExecutionBackend`] - runs generated SQL against a data platform

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ExecutionBackend, NluDriver};
pub use types::{BackendStatus, HealthStatus};
