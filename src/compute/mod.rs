//! Turns a compiled model plus a parameter vector into matrices.
pub mod assembler;
pub mod batch;
pub mod matrices;

pub use assembler::Assembler;
pub use batch::assemble_batch;
pub use matrices::{AssemblyError, PathMatrixSet};
