//! Scatters arrow coefficients into per-lag matrices.
use super::matrices::{AssemblyError, PathMatrixSet};
use crate::config::AssemblyOptions;
use crate::model::Model;
use crate::store::{ArrowKind, ParamId};

pub struct Assembler<'a> {
    model: &'a Model,
    options: AssemblyOptions,
}

impl<'a> Assembler<'a> {
    pub fn new(model: &'a Model, options: AssemblyOptions) -> Self {
        Self { model, options }
    }

    /// Builds the matrices for one parameter vector.
    ///
    /// Pure: repeated calls with the same vector give identical results.
    pub fn assemble(&self, params: &[f64]) -> Result<PathMatrixSet, AssemblyError> {
        // 1. Length check: the vector must match the parameter table.
        let expected = self.model.n_parameters();
        if params.len() != expected {
            return Err(AssemblyError::ParameterLength { expected, actual: params.len() });
        }
        if let Some(index) = params.iter().position(|v| !v.is_finite()) {
            let name = self.model.parameters().name(ParamId::new(index)).to_string();
            return Err(AssemblyError::NonFinite { index, name });
        }

        let n = self.model.variables().len();
        let mut set = PathMatrixSet::zeros(n, self.model.max_lag());
        let mut variance_set = vec![false; n];

        // 2. Scatter
        for arrow in self.model.arrows() {
            let value = arrow.parameter.resolve(params);
            let (to, from) = (arrow.to.index(), arrow.from.index());
            match arrow.kind {
                ArrowKind::Directed => set.path_mut(arrow.lag)[(to, from)] = value,
                ArrowKind::Covariance => {
                    let cov = set.covariance_mut(arrow.lag);
                    cov[(to, from)] = value;
                    cov[(from, to)] = value;
                    if arrow.lag == 0 && to == from {
                        variance_set[to] = true;
                    }
                }
            }
        }

        // 3. Variance floor for lag-0 variances no arrow sets.
        let cov0 = set.covariance_mut(0);
        for i in (0..n).filter(|&i| !variance_set[i]) {
            cov0[(i, i)] = self.options.variance_floor;
        }

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Variables;
    use nalgebra::DMatrix;
    use rstest::rstest;

    fn model(text: &str, names: &[&str]) -> Model {
        let vars = Variables::new(names.iter().copied()).unwrap();
        Model::from_arrows(text, &vars).unwrap()
    }

    #[test]
    fn test_single_arrow_scenario() {
        let m = model("x -> y, 0, beta", &["x", "y"]);
        let set = Assembler::new(&m, AssemblyOptions::default()).assemble(&[0.5]).unwrap();
        assert_eq!(set.max_lag(), 0);
        assert_eq!(set.path(0).unwrap(), &DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.5, 0.0]));
    }

    #[test]
    fn test_fixed_literal_is_reproduced_for_any_vector() {
        let m = model("x -> y, 1, 0.375\ny -> x, 0, b", &["x", "y"]);
        let asm = Assembler::new(&m, AssemblyOptions::default());
        for b in [-3.0, 0.0, 0.2, 10.0] {
            let set = asm.assemble(&[b]).unwrap();
            assert_eq!(set.path(1).unwrap()[(1, 0)], 0.375);
            assert_eq!(set.path(0).unwrap()[(0, 1)], b);
        }
    }

    #[test]
    fn test_shared_parameter_fills_every_cell() {
        let m = model("x -> y, 0, b\ny -> z, 2, b\nx -> z, 0, c", &["x", "y", "z"]);
        let set = Assembler::new(&m, AssemblyOptions::default()).assemble(&[0.7, -0.1]).unwrap();
        assert_eq!(set.path(0).unwrap()[(1, 0)], 0.7);
        assert_eq!(set.path(2).unwrap()[(2, 1)], 0.7);
        assert_eq!(set.path(0).unwrap()[(2, 0)], -0.1);
        // Lag 1 carries no arrows but still exists.
        assert_eq!(set.path(1).unwrap(), &DMatrix::zeros(3, 3));
    }

    #[test]
    fn test_covariances_are_symmetric_with_floor() {
        let m = model("x <-> y, 0, r\ny <-> y, 0, sy\nx <-> y, 1, 0.2", &["x", "y"]);
        let opts = AssemblyOptions { variance_floor: 0.05 };
        let set = Assembler::new(&m, opts).assemble(&[0.3, 2.0]).unwrap();

        let cov0 = set.covariance(0).unwrap();
        assert_eq!(cov0[(0, 1)], 0.3);
        assert_eq!(cov0[(1, 0)], 0.3);
        assert_eq!(cov0[(0, 0)], 0.05);
        assert_eq!(cov0[(1, 1)], 2.0);

        let cov1 = set.covariance(1).unwrap();
        assert_eq!((cov1[(0, 1)], cov1[(1, 0)], cov1[(0, 0)]), (0.2, 0.2, 0.0));
    }

    #[test]
    fn test_explicit_zero_variance_overrides_floor() {
        let m = model("x <-> x, 0, 0", &["x"]);
        let set = Assembler::new(&m, AssemblyOptions::default()).assemble(&[]).unwrap();
        assert_eq!(set.covariance(0).unwrap()[(0, 0)], 0.0);
    }

    #[test]
    fn test_wrong_vector_length() {
        let m = model("x -> y, 0, b", &["x", "y"]);
        let err = Assembler::new(&m, AssemblyOptions::default()).assemble(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err, AssemblyError::ParameterLength { expected: 1, actual: 2 });
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn test_non_finite_values_are_rejected(#[case] bad: f64) {
        let m = model("x -> y, 0, a\ny -> x, 0, b", &["x", "y"]);
        let asm = Assembler::new(&m, AssemblyOptions::default());
        assert_eq!(
            asm.assemble(&[0.1, bad]).unwrap_err(),
            AssemblyError::NonFinite { index: 1, name: "b".into() }
        );
    }
}
