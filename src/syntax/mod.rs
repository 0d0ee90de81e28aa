//! Front end: arrow-notation and equation-notation parsers.
//!
//! Both notations produce the same `ArrowRecord` stream, which the model
//! compiler resolves against the variable universe.
pub mod arrows;
pub mod equations;
mod error;

pub use arrows::{parse_arrows, render_arrows, ArrowRecord, ParamToken};
pub use equations::normalize_equations;
pub use error::SpecError;
