//! Non-fatal findings of a compilation. Each one records a deterministic
//! resolution of an ambiguous model text.
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompileWarning {
    #[error("Parameter '{parameter}' on line {line}: start {ignored} ignored, kept {kept}")]
    ConflictingStart { parameter: String, line: usize, kept: f64, ignored: f64 },
    #[error("Duplicate arrow on line {line} ignored (in `{source_line}`)")]
    DuplicateArrow { line: usize, source_line: String },
    #[error("Start value {value} on line {line} ignored: the arrow is fixed")]
    StartOnFixed { line: usize, value: f64 },
    #[error("Added variance parameter '{parameter}' for '{variable}'")]
    DefaultVariance { variable: String, parameter: String },
}
