//! Inspection analysis pipeline.
//!
//! - `types`: request, outcome and error types
//! - `context`: per-discipline technical sheet builders
//! - `orchestrator`: the `Inspector` service

mod context;
mod orchestrator;
mod types;

pub use context::*;
pub use orchestrator::Inspector;
pub use types::*;
