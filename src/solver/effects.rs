//! Total, long-run and cumulative effects of one assembled model.
use super::companion::Companion;
use super::error::SolveError;
use super::reduced::reduce;
use crate::analysis::topology;
use crate::compute::{Assembler, PathMatrixSet};
use crate::config::{AssemblyOptions, SolverOptions};
use crate::model::Model;
use crate::store::{VarId, Variables};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRow {
    pub from: String,
    pub to: String,
    pub lag: u32,
    /// Response of `to` at `t` to a unit innovation in `from` at `t - lag`.
    pub total_effect: f64,
    /// The arrow coefficient `A_lag[to, from]`, zero when there is no arrow.
    pub direct_effect: f64,
}

/// Rows ordered by lag, then `from`, then `to` in universe order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectTable {
    rows: Vec<EffectRow>,
}

impl EffectTable {
    pub fn rows(&self) -> &[EffectRow] { &self.rows }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn get(&self, from: &str, to: &str, lag: u32) -> Option<&EffectRow> {
        self.rows.iter().find(|r| r.lag == lag && r.from == from && r.to == to)
    }

    /// Every lag of one `(from, to)` pair.
    pub fn pair<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
    ) -> impl Iterator<Item = &'a EffectRow> + 'a {
        self.rows.iter().filter(move |r| r.from == from && r.to == to)
    }

    pub fn to_json(&self) -> serde_json::Result<String> { serde_json::to_string(&self.rows) }
}

/// Shape of the simultaneous (lag-0) network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Structure {
    /// Acyclic: causes come before their effects.
    Recursive { order: Vec<String> },
    /// Strongly connected lag-0 blocks with feedback.
    Cyclic { blocks: Vec<Vec<String>> },
}

pub struct EffectSolver<'a> {
    model: &'a Model,
    matrices: &'a PathMatrixSet,
    options: SolverOptions,
    reduced: DMatrix<f64>,
    companion: Companion,
}

impl<'a> EffectSolver<'a> {
    /// Reduces the simultaneous block and builds the companion form.
    pub fn new(
        model: &'a Model,
        matrices: &'a PathMatrixSet,
        options: SolverOptions,
    ) -> Result<Self, SolveError> {
        let expected = model.variables().len();
        if matrices.n_vars() != expected {
            return Err(SolveError::DimensionMismatch { expected, actual: matrices.n_vars() });
        }

        let non_finite = |a: &DMatrix<f64>| a.iter().any(|v| !v.is_finite());
        if let Some(lag) = matrices.paths().iter().position(non_finite) {
            return Err(SolveError::NonFiniteMatrix { lag: lag as u32 });
        }

        let reduced = reduce(&matrices.paths()[0], model.variables(), options.singular_tolerance)?;
        let companion = Companion::new(&reduced, matrices.paths());
        debug!(
            n_vars = expected,
            max_lag = matrices.max_lag(),
            order = companion.order(),
            "Built companion form"
        );

        Ok(Self { model, matrices, options, reduced, companion })
    }

    /// `R = (I - A_0)^{-1}`.
    pub fn reduced_form(&self) -> &DMatrix<f64> { &self.reduced }

    pub fn companion(&self) -> &Companion { &self.companion }

    /// `Psi_d` for `d = 0..=horizon`; `Psi_0 = R`.
    pub fn impulse_responses(&self, horizon: u32) -> Vec<DMatrix<f64>> {
        self.companion
            .propagate(horizon)
            .into_iter()
            .map(|phi| phi * &self.reduced)
            .collect()
    }

    /// Every `(from, to, lag)` effect up to `horizon`.
    pub fn total_effects(&self, horizon: u32) -> EffectTable {
        let vars = self.model.variables();
        let n = vars.len();
        let psi = self.impulse_responses(horizon);

        let mut rows = Vec::with_capacity(psi.len() * n * n);
        for (lag, m) in psi.iter().enumerate() {
            let lag = lag as u32;
            let direct = self.matrices.path(lag);
            for (from_id, from) in vars.iter() {
                for (to_id, to) in vars.iter() {
                    let (f, t) = (from_id.index(), to_id.index());
                    rows.push(EffectRow {
                        from: from.to_string(),
                        to: to.to_string(),
                        lag,
                        total_effect: m[(t, f)],
                        direct_effect: direct.map_or(0.0, |a| a[(t, f)]),
                    });
                }
            }
        }
        debug!(horizon, rows = rows.len(), "Computed total effects");
        EffectTable { rows }
    }

    /// Effect of a unit innovation in `from` at `t - lag` on `to` at `t`.
    pub fn total_effect(&self, from: &str, to: &str, lag: u32) -> Result<f64, SolveError> {
        let (f, t) = (lookup(self.model.variables(), from)?, lookup(self.model.variables(), to)?);
        let psi = self.impulse_responses(lag);
        Ok(psi[lag as usize][(t.index(), f.index())])
    }

    pub fn spectral_radius(&self) -> f64 { self.companion.spectral_radius() }

    pub fn is_stable(&self) -> bool { self.spectral_radius() < 1.0 - self.options.stability_margin }

    /// `sum_{d>=0} Psi_d`, only defined for a stable system.
    pub fn long_run_effects(&self) -> Result<DMatrix<f64>, SolveError> {
        let spectral_radius = self.spectral_radius();
        debug!(spectral_radius, "Checking stability");
        if spectral_radius.is_nan() || spectral_radius >= 1.0 - self.options.stability_margin {
            warn!(spectral_radius, "Long-run effect requested on a non-stable system");
            return Err(SolveError::DivergentSeries { spectral_radius });
        }
        let block = self
            .companion
            .long_run_block()
            .ok_or(SolveError::DivergentSeries { spectral_radius })?;
        Ok(block * &self.reduced)
    }

    pub fn long_run_effect(&self, from: &str, to: &str) -> Result<f64, SolveError> {
        let (f, t) = (lookup(self.model.variables(), from)?, lookup(self.model.variables(), to)?);
        Ok(self.long_run_effects()?[(t.index(), f.index())])
    }

    /// `sum_{d=0}^{horizon} Psi_d`; always finite.
    pub fn cumulative_effects(&self, horizon: u32) -> DMatrix<f64> {
        let n = self.reduced.nrows();
        self.impulse_responses(horizon)
            .into_iter()
            .fold(DMatrix::zeros(n, n), |acc, psi| acc + psi)
    }

    /// Reduced-form innovation covariance `R S_0 R^T`.
    pub fn reduced_covariance(&self) -> DMatrix<f64> {
        let s0 = &self.matrices.covariances()[0];
        &self.reduced * s0 * self.reduced.transpose()
    }

    pub fn structure(&self) -> Structure {
        let a0 = &self.matrices.paths()[0];
        let vars = self.model.variables();
        let names = |ids: Vec<usize>| -> Vec<String> {
            ids.into_iter().map(|i| vars.name(VarId::new(i)).to_string()).collect()
        };
        match topology::sort(a0) {
            Ok(order) => Structure::Recursive { order: names(order) },
            Err(_) => Structure::Cyclic {
                blocks: topology::cyclic_blocks(a0).into_iter().map(names).collect(),
            },
        }
    }
}

fn lookup(vars: &Variables, name: &str) -> Result<VarId, SolveError> {
    vars.get(name).ok_or_else(|| SolveError::UnknownVariable { name: name.to_string() })
}

/// Assembles `params` and tabulates effects up to `horizon`.
pub fn total_effects(
    model: &Model,
    params: &[f64],
    horizon: u32,
    assembly: &AssemblyOptions,
    solver: &SolverOptions,
) -> Result<EffectTable, SolveError> {
    let matrices = Assembler::new(model, assembly.clone()).assemble(params)?;
    Ok(EffectSolver::new(model, &matrices, solver.clone())?.total_effects(horizon))
}

/// `total_effects` for many parameter vectors in parallel; input order is kept.
pub fn total_effects_batch(
    model: &Model,
    vectors: &[Vec<f64>],
    horizon: u32,
    assembly: &AssemblyOptions,
    solver: &SolverOptions,
) -> Vec<Result<EffectTable, SolveError>> {
    vectors
        .par_iter()
        .map(|params| total_effects(model, params, horizon, assembly, solver))
        .collect()
}
