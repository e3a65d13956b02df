//! Error types for the Quarry workspace.
//!
//! Every concern gets its own error struct that records the source location
//! where it was raised:
//! - `*ErrorKind` enums name the specific condition
//! - `*Error` structs wrap a kind (or a message) with line and file
//! - constructors use `#[track_caller]` so the location is captured for free
//!
//! # Examples
//!
//! ```
//! use quarry_error::{QuarryResult, ConnectionError};
//!
//! fn connect() -> QuarryResult<()> {
//!     Err(ConnectionError::new("livy at localhost:8998 refused the connection"))?
//! }
//!
//! assert!(connect().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod connection;
mod error;
mod execution;
mod export;
mod http;
mod json;
mod nlu;
mod sql;
mod task;

pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use connection::ConnectionError;
pub use error::{QuarryError, QuarryErrorKind, QuarryResult};
pub use execution::{ExecutionError, ExecutionErrorKind};
pub use export::{ExportError, ExportErrorKind};
pub use http::HttpError;
pub use json::JsonError;
pub use nlu::{NluError, NluErrorKind};
pub use sql::{SqlError, SqlErrorKind};
pub use task::{TaskError, TaskErrorKind};
