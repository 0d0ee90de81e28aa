//! Parallel assembly over many parameter vectors.
use super::assembler::Assembler;
use super::matrices::{AssemblyError, PathMatrixSet};
use crate::config::AssemblyOptions;
use crate::model::Model;
use rayon::prelude::*;

/// Assembles every vector independently; results keep the input order.
pub fn assemble_batch(
    model: &Model,
    options: &AssemblyOptions,
    vectors: &[Vec<f64>],
) -> Vec<Result<PathMatrixSet, AssemblyError>> {
    vectors
        .par_iter()
        .map(|params| Assembler::new(model, options.clone()).assemble(params))
        .collect()
}
