//! matrices.rs
//! Per-lag path and covariance matrices for one parameter vector.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

pub use self::error::AssemblyError;
mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum AssemblyError {
        #[error("Parameter vector has length {actual}, the model has {expected} free parameters")]
        ParameterLength { expected: usize, actual: usize },
        #[error("Parameter '{name}' (index {index}) is not a finite number")]
        NonFinite { index: usize, name: String },
    }
}

/// `paths[lag][(to, from)]` is the coefficient of `from` at `t - lag` in the
/// equation for `to`. `covariances[lag]` is symmetric.
///
/// Built fresh for every parameter vector; owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathMatrixSet {
    paths: Vec<DMatrix<f64>>,
    covariances: Vec<DMatrix<f64>>,
}

impl PathMatrixSet {
    /// All-zero matrices for lags `0..=max_lag`.
    pub(crate) fn zeros(n_vars: usize, max_lag: u32) -> Self {
        let count = max_lag as usize + 1;
        Self {
            paths: vec![DMatrix::zeros(n_vars, n_vars); count],
            covariances: vec![DMatrix::zeros(n_vars, n_vars); count],
        }
    }

    pub fn n_vars(&self) -> usize { self.paths[0].nrows() }

    pub fn max_lag(&self) -> u32 { (self.paths.len() - 1) as u32 }

    pub fn path(&self, lag: u32) -> Option<&DMatrix<f64>> { self.paths.get(lag as usize) }

    pub fn covariance(&self, lag: u32) -> Option<&DMatrix<f64>> {
        self.covariances.get(lag as usize)
    }

    pub fn paths(&self) -> &[DMatrix<f64>] { &self.paths }

    pub fn covariances(&self) -> &[DMatrix<f64>] { &self.covariances }

    pub(crate) fn path_mut(&mut self, lag: u32) -> &mut DMatrix<f64> {
        &mut self.paths[lag as usize]
    }

    pub(crate) fn covariance_mut(&mut self, lag: u32) -> &mut DMatrix<f64> {
        &mut self.covariances[lag as usize]
    }
}
