use crate::compute::{Assembler, PathMatrixSet};
use crate::config::{AssemblyOptions, CompileOptions, DefaultVariances, SolverOptions};
use crate::display::summary;
use crate::model::{Compiler, Model};
use crate::solver::EffectSolver;
use crate::store::Variables;
use nalgebra::DMatrix;
use pyo3::exceptions::{PyArithmeticError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

type EffectTuple = (String, String, u32, f64, f64);

#[pyclass(name = "_Model")]
#[derive(Debug, Clone)]
pub struct PyModel {
    inner: Model,
    assembly: AssemblyOptions,
    solver: SolverOptions,
}

#[pymethods]
impl PyModel {
    #[staticmethod]
    #[pyo3(signature = (text, variables, default_variances = "floor"))]
    pub fn from_arrows(
        text: &str,
        variables: Vec<String>,
        default_variances: &str,
    ) -> PyResult<Self> {
        let vars = Variables::new(variables).map_err(value_error)?;
        let options = compile_options(default_variances)?;
        let inner = Compiler::new(&vars, &options).compile_arrows(text).map_err(value_error)?;
        Ok(Self::wrap(inner))
    }

    #[staticmethod]
    #[pyo3(signature = (text, variables, default_variances = "floor"))]
    pub fn from_equations(
        text: &str,
        variables: Vec<String>,
        default_variances: &str,
    ) -> PyResult<Self> {
        let vars = Variables::new(variables).map_err(value_error)?;
        let options = compile_options(default_variances)?;
        let inner = Compiler::new(&vars, &options).compile_equations(text).map_err(value_error)?;
        Ok(Self::wrap(inner))
    }

    #[staticmethod]
    pub fn from_json(json: &str) -> PyResult<Self> {
        Model::from_json(json).map(Self::wrap).map_err(value_error)
    }

    pub fn to_json(&self) -> PyResult<String> { self.inner.to_json().map_err(value_error) }

    pub fn set_variance_floor(&mut self, floor: f64) { self.assembly.variance_floor = floor; }

    #[getter]
    pub fn variables(&self) -> Vec<String> { self.inner.variables().names().to_vec() }

    #[getter]
    pub fn parameter_names(&self) -> Vec<String> {
        self.inner.parameters().names().map(String::from).collect()
    }

    #[getter]
    pub fn start_values(&self) -> Vec<f64> { self.inner.start_values() }

    #[getter]
    pub fn max_lag(&self) -> u32 { self.inner.max_lag() }

    #[getter]
    pub fn warnings(&self) -> Vec<String> {
        self.inner.warnings().iter().map(|w| w.to_string()).collect()
    }

    pub fn render_arrows(&self) -> String { self.inner.render_arrows() }

    /// Returns `(paths, covariances)`, one nested list per lag.
    #[allow(clippy::type_complexity)]
    pub fn assemble(&self, params: Vec<f64>) -> PyResult<(Vec<Vec<Vec<f64>>>, Vec<Vec<Vec<f64>>>)> {
        let set = self.matrices(&params)?;
        Ok((
            set.paths().iter().map(to_rows).collect(),
            set.covariances().iter().map(to_rows).collect(),
        ))
    }

    /// `(from, to, lag, total_effect, direct_effect)` rows.
    pub fn total_effects(&self, params: Vec<f64>, horizon: u32) -> PyResult<Vec<EffectTuple>> {
        let set = self.matrices(&params)?;
        let solver = self.solver_for(&set)?;
        Ok(solver
            .total_effects(horizon)
            .rows()
            .iter()
            .map(|r| (r.from.clone(), r.to.clone(), r.lag, r.total_effect, r.direct_effect))
            .collect())
    }

    /// Raises `ArithmeticError` when the lag system is not stable.
    pub fn long_run_effects(&self, params: Vec<f64>) -> PyResult<Vec<Vec<f64>>> {
        let set = self.matrices(&params)?;
        let solver = self.solver_for(&set)?;
        let long_run = solver
            .long_run_effects()
            .map_err(|e| PyArithmeticError::new_err(e.to_string()))?;
        Ok(to_rows(&long_run))
    }

    pub fn cumulative_effects(&self, params: Vec<f64>, horizon: u32) -> PyResult<Vec<Vec<f64>>> {
        let set = self.matrices(&params)?;
        let solver = self.solver_for(&set)?;
        Ok(to_rows(&solver.cumulative_effects(horizon)))
    }

    pub fn spectral_radius(&self, params: Vec<f64>) -> PyResult<f64> {
        let set = self.matrices(&params)?;
        let solver = self.solver_for(&set)?;
        Ok(solver.spectral_radius())
    }

    #[pyo3(signature = (estimates, std_errors = None))]
    pub fn summary(&self, estimates: Vec<f64>, std_errors: Option<Vec<f64>>) -> PyResult<String> {
        let rows = summary::summarize(&self.inner, &estimates, std_errors.as_deref())
            .map_err(value_error)?;
        Ok(summary::format_summary(&rows))
    }

    fn __repr__(&self) -> String {
        format!(
            "_Model(variables={}, parameters={}, max_lag={})",
            self.inner.variables().len(),
            self.inner.n_parameters(),
            self.inner.max_lag()
        )
    }
}

impl PyModel {
    fn wrap(inner: Model) -> Self {
        Self { inner, assembly: AssemblyOptions::default(), solver: SolverOptions::default() }
    }

    fn matrices(&self, params: &[f64]) -> PyResult<PathMatrixSet> {
        Assembler::new(&self.inner, self.assembly.clone()).assemble(params).map_err(value_error)
    }

    fn solver_for<'a>(&'a self, set: &'a PathMatrixSet) -> PyResult<EffectSolver<'a>> {
        EffectSolver::new(&self.inner, set, self.solver.clone()).map_err(runtime_error)
    }
}

fn compile_options(default_variances: &str) -> PyResult<CompileOptions> {
    let default_variances = match default_variances {
        "floor" => DefaultVariances::Floor,
        "free" => DefaultVariances::FreeParameters,
        other => {
            return Err(PyValueError::new_err(format!("Unknown default_variances '{}'", other)))
        }
    };
    Ok(CompileOptions { default_variances, ..Default::default() })
}

fn to_rows(m: &DMatrix<f64>) -> Vec<Vec<f64>> {
    m.row_iter().map(|r| r.iter().copied().collect()).collect()
}

fn value_error(e: impl std::fmt::Display) -> PyErr { PyValueError::new_err(e.to_string()) }

fn runtime_error(e: impl std::fmt::Display) -> PyErr { PyRuntimeError::new_err(e.to_string()) }
