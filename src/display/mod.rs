//! Plain-text reports.
pub mod summary;

pub use summary::{format_effects, format_summary, summarize, PathSummary};
