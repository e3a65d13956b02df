//! SQL synthesis for the Quarry pipeline.
//!
//! [`SqlGenerator`] renders an [`quarry_core::AnalyzedQuery`] into a main,
//! count and sample statement for one [`quarry_core::Dialect`], and refuses
//! to hand back anything that fails [`validate_sql`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod generator;
mod render;
mod validate;

pub use generator::{DEFAULT_SAMPLE_SIZE, SqlGenerator};
pub use render::{is_identifier, quote_literal};
pub use validate::{SqlValidation, validate_sql};
