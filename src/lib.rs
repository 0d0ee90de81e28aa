//! Compiler and path-algebra engine for dynamic structural equation models.
//!
//! Text (arrow or equation notation) compiles to a [`Model`]; a parameter
//! vector assembles it into per-lag matrices; the solver turns those into
//! total, long-run and cumulative effects.

pub mod analysis;
pub mod compute;
pub mod config;
pub mod display;
pub mod error;
pub mod model;
pub mod solver;
pub mod store;
pub mod syntax;

#[cfg(feature = "python")]
pub mod bindings {
    pub mod python;
}

pub use compute::{assemble_batch, Assembler, AssemblyError, PathMatrixSet};
pub use config::{AssemblyOptions, CompileOptions, DefaultVariances, SolverOptions};
pub use error::DsemError;
pub use model::{CompileWarning, Compiler, Model};
pub use solver::{
    total_effects, total_effects_batch, EffectRow, EffectSolver, EffectTable, SolveError,
    Structure,
};
pub use store::{ArrowKind, ArrowSpec, ParamId, ParamRef, ParameterTable, VarId, Variables};
pub use syntax::SpecError;

// --- Python Module Definition ---
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Defines the `_core` extension module.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<bindings::python::PyModel>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
