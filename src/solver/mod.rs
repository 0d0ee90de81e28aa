//! Solves the assembled lag system for total, long-run and cumulative effects.
pub mod companion;
pub mod effects;
mod error;
pub mod reduced;

pub use companion::Companion;
pub use effects::{
    total_effects, total_effects_batch, EffectRow, EffectSolver, EffectTable, Structure,
};
pub use error::SolveError;
