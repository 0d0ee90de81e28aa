//! Compile-time errors. Every variant tied to a source line carries its
//! 1-based number and the offending text.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecError {
    #[error("Grammar error on line {line}: {reason} (in `{source_line}`)")]
    Grammar { line: usize, source_line: String, reason: String },
    #[error("Unknown variable '{name}' on line {line} (in `{source_line}`)")]
    UnknownVariable { line: usize, source_line: String, name: String },
    #[error("Invalid lag '{token}' on line {line}: expected an integer >= 0 (in `{source_line}`)")]
    InvalidLag { line: usize, source_line: String, token: String },
    #[error("Self loop on '{variable}' at lag 0 on line {line} (in `{source_line}`)")]
    SelfLoop { line: usize, source_line: String, variable: String },
    #[error("Variable '{name}' is listed more than once")]
    DuplicateVariable { name: String },
}

impl SpecError {
    pub(crate) fn grammar(line: usize, source_line: &str, reason: impl Into<String>) -> Self {
        SpecError::Grammar { line, source_line: source_line.to_string(), reason: reason.into() }
    }

    /// Source line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            SpecError::Grammar { line, .. }
            | SpecError::UnknownVariable { line, .. }
            | SpecError::InvalidLag { line, .. }
            | SpecError::SelfLoop { line, .. } => Some(*line),
            SpecError::DuplicateVariable { .. } => None,
        }
    }
}
