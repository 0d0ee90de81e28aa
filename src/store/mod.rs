//! Immutable building blocks of a compiled model: the variable universe,
//! arrows and the free-parameter symbol table.
pub mod registry;
pub mod types;

pub use registry::{unique_name, ParameterEntry, ParameterTable, StartConflict};
pub use types::{arrow_key, ArrowKey, ArrowKind, ArrowSpec, ParamId, ParamRef, VarId, Variables};
