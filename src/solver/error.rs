//! Defines the error types for the solver module.
use crate::compute::AssemblyError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    /// `I - A_0` is singular; `variables` are the cyclic lag-0 blocks at fault.
    #[error(
        "Non-identifiable structure: simultaneous feedback among {variables:?} has unit gain \
         (I - A_0 is singular)"
    )]
    NonIdentifiableStructure { variables: Vec<String> },
    /// The infinite-horizon sum does not converge.
    #[error(
        "Infinite-horizon effect diverges: companion spectral radius {spectral_radius} is not \
         below 1; use a finite horizon"
    )]
    DivergentSeries { spectral_radius: f64 },
    /// A path matrix holds NaN or an infinity.
    #[error("Path matrix at lag {lag} has non-finite entries")]
    NonFiniteMatrix { lag: u32 },
    #[error("Unknown variable '{name}'")]
    UnknownVariable { name: String },
    #[error("Matrices cover {actual} variables, the model has {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}
