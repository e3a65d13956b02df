//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the quarry binary.

mod commands;
mod render;
mod run;

pub use commands::{Cli, Commands};
pub use run::{
    build_agent, handle_batch, handle_engines, handle_estimate, handle_preview, handle_query,
    handle_status,
};
