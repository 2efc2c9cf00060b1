//! Output formatters for run reports.
//!
//! - [`text`]: the human-readable report
//! - [`json`]: machine-readable JSON for scripting

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;
