//! Turning analyzed queries into executable tasks.
//!
//! - [`TaskBuilder`] generates SQL, picks a task type, sizes resources and
//!   attaches the backend's cluster settings
//! - [`CostModel`] scores complexity and estimates run time

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod cluster;
mod cost;

pub use builder::TaskBuilder;
pub use cluster::cluster_template;
pub use cost::{CostEstimate, CostModel};
