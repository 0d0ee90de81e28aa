//! Crate-level error covering every stage of the pipeline.
use crate::compute::AssemblyError;
use crate::solver::SolveError;
use crate::syntax::SpecError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DsemError {
    #[error("Specification error: {0}")]
    Spec(#[from] SpecError),
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("Solver error: {0}")]
    Solve(#[from] SolveError),
}

impl DsemError {
    /// True for conditions a caller can work around, such as falling back to
    /// a finite horizon after a divergent long-run request.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DsemError::Solve(SolveError::DivergentSeries { .. }))
    }
}
