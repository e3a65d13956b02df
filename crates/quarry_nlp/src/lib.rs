//! Intent classification and query compilation.
//!
//! [`IntentClassifier`] scores raw text against fixed keyword tables.
//! [`QueryCompiler`] combines its output with a language-model round trip
//! into an [`quarry_core::AnalyzedQuery`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classifier;
mod compiler;
mod extraction;
mod keywords;
mod prompt;
mod rules;

pub use classifier::IntentClassifier;
pub use compiler::QueryCompiler;
pub use extraction::{extract_json_object, parse_analysis};
pub use keywords::intent_keywords;
pub use prompt::{SYSTEM_PROMPT, fallback_analysis, user_prompt};
