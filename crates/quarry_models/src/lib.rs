//! Language-model clients for Quarry.
//!
//! [`NluClient`] is the closed set of drivers the pipeline can use:
//! - [`OpenAiCompatibleClient`] - any `/chat/completions` endpoint (SiliconFlow by default)
//! - [`OfflineNlu`] - never answers, so the compiler falls back to rule-based analysis

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod dto;
mod offline;
mod openai_compat;

pub use client::NluClient;
pub use dto::{ChatChoice, ChatMessage, ChatRequest, ChatRequestBuilder, ChatResponse, ChatRole};
pub use offline::OfflineNlu;
pub use openai_compat::OpenAiCompatibleClient;
