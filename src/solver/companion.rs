//! Companion form of the reduced lag system.
use nalgebra::DMatrix;

/// `T = [[B_1 .. B_L], [I 0 ..], ..]` with `B_k = R * A_k`, of size `V * L`
/// where `L = max(max_lag, 1)`.
#[derive(Debug, Clone)]
pub struct Companion {
    matrix: DMatrix<f64>,
    n_vars: usize,
}

impl Companion {
    /// `paths` is the full per-lag list `[A_0, A_1, .., A_L]`; `A_0` is skipped.
    pub fn new(reduced: &DMatrix<f64>, paths: &[DMatrix<f64>]) -> Self {
        let n = reduced.nrows();
        let order = paths.len().saturating_sub(1).max(1);
        let size = n * order;
        let mut matrix = DMatrix::zeros(size, size);

        for (k, a_k) in paths.iter().enumerate().skip(1) {
            let b_k = reduced * a_k;
            matrix.view_mut((0, (k - 1) * n), (n, n)).copy_from(&b_k);
        }
        for k in 1..order {
            matrix.view_mut((k * n, (k - 1) * n), (n, n)).fill_with_identity();
        }

        Self { matrix, n_vars: n }
    }

    pub fn matrix(&self) -> &DMatrix<f64> { &self.matrix }

    pub fn order(&self) -> usize {
        if self.n_vars == 0 { 1 } else { self.matrix.nrows() / self.n_vars }
    }

    /// Largest eigenvalue modulus of `T`; infinite when `T` or any
    /// eigenvalue is not finite.
    pub fn spectral_radius(&self) -> f64 {
        if self.matrix.iter().any(|v| !v.is_finite()) {
            return f64::INFINITY;
        }
        if self.matrix.iter().all(|v| *v == 0.0) {
            return 0.0;
        }
        let mut radius = 0.0_f64;
        for eigenvalue in self.matrix.complex_eigenvalues().iter() {
            let modulus = eigenvalue.norm();
            if !modulus.is_finite() {
                return f64::INFINITY;
            }
            radius = radius.max(modulus);
        }
        radius
    }

    /// `Phi_d = (T^d)_{00}` for `d = 0..=horizon`.
    ///
    /// Only the first block row of `T^d` is carried, so each step is a
    /// `V x VL` by `VL x VL` product.
    pub fn propagate(&self, horizon: u32) -> Vec<DMatrix<f64>> {
        let n = self.n_vars;
        let size = self.matrix.nrows();
        let mut row = DMatrix::zeros(n, size);
        row.view_mut((0, 0), (n, n)).fill_with_identity();

        let mut out = Vec::with_capacity(horizon as usize + 1);
        out.push(row.columns(0, n).into_owned());
        for _ in 0..horizon {
            row = &row * &self.matrix;
            out.push(row.columns(0, n).into_owned());
        }
        out
    }

    /// `[(I - T)^{-1}]_{00}`, the sum of every `Phi_d` when the series converges.
    pub fn long_run_block(&self) -> Option<DMatrix<f64>> {
        let n = self.n_vars;
        let size = self.matrix.nrows();
        let inv = (DMatrix::<f64>::identity(size, size) - &self.matrix).try_inverse()?;
        Some(inv.view((0, 0), (n, n)).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Direct recurrence `Phi_d = sum_k B_k Phi_{d-k}` as an oracle.
    fn recurrence(b: &[DMatrix<f64>], n: usize, horizon: usize) -> Vec<DMatrix<f64>> {
        let mut phi: Vec<DMatrix<f64>> = vec![DMatrix::identity(n, n)];
        for d in 1..=horizon {
            let mut next = DMatrix::zeros(n, n);
            for (k, b_k) in b.iter().enumerate() {
                let lag = k + 1;
                if lag <= d {
                    next += b_k * &phi[d - lag];
                }
            }
            phi.push(next);
        }
        phi
    }

    #[test]
    fn test_layout() {
        let r = DMatrix::identity(2, 2);
        let a1 = DMatrix::from_row_slice(2, 2, &[0.1, 0.2, 0.3, 0.4]);
        let a2 = DMatrix::from_row_slice(2, 2, &[0.5, 0.0, 0.0, 0.6]);
        let c = Companion::new(&r, &[DMatrix::zeros(2, 2), a1.clone(), a2.clone()]);
        assert_eq!(c.order(), 2);
        assert_eq!(c.matrix().view((0, 0), (2, 2)).into_owned(), a1);
        assert_eq!(c.matrix().view((0, 2), (2, 2)).into_owned(), a2);
        assert_eq!(c.matrix().view((2, 0), (2, 2)).into_owned(), DMatrix::<f64>::identity(2, 2));
        assert_eq!(c.matrix().view((2, 2), (2, 2)).into_owned(), DMatrix::<f64>::zeros(2, 2));
    }

    #[test]
    fn test_propagation_matches_recurrence() {
        let r = DMatrix::from_row_slice(3, 3, &[1.0, 0.2, 0.0, 0.0, 1.0, 0.0, 0.3, 0.06, 1.0]);
        let a1 = DMatrix::from_row_slice(3, 3, &[0.4, 0.0, 0.1, 0.2, 0.3, 0.0, 0.0, -0.2, 0.5]);
        let a2 = DMatrix::from_row_slice(3, 3, &[0.0, 0.1, 0.0, -0.1, 0.0, 0.0, 0.05, 0.0, 0.1]);
        let b = vec![&r * &a1, &r * &a2];

        let c = Companion::new(&r, &[DMatrix::zeros(3, 3), a1, a2]);
        let phi = c.propagate(8);
        let oracle = recurrence(&b, 3, 8);
        assert_eq!(phi.len(), 9);
        for (got, want) in phi.iter().zip(&oracle) {
            assert_relative_eq!(got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_no_lags_is_a_single_zero_block() {
        let c = Companion::new(&DMatrix::identity(2, 2), &[DMatrix::zeros(2, 2)]);
        assert_eq!(c.order(), 1);
        assert_eq!(c.spectral_radius(), 0.0);
        let phi = c.propagate(2);
        assert_eq!(phi[0], DMatrix::<f64>::identity(2, 2));
        assert_eq!(phi[1], DMatrix::<f64>::zeros(2, 2));
    }

    #[test]
    fn test_spectral_radius_and_long_run() {
        let a1 = DMatrix::from_row_slice(1, 1, &[0.5]);
        let c = Companion::new(&DMatrix::identity(1, 1), &[DMatrix::zeros(1, 1), a1]);
        assert_relative_eq!(c.spectral_radius(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(c.long_run_block().unwrap()[(0, 0)], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_entries_have_infinite_radius() {
        let a1 = DMatrix::from_row_slice(2, 2, &[f64::NAN, 0.2, 0.0, 0.5]);
        let c = Companion::new(&DMatrix::identity(2, 2), &[DMatrix::zeros(2, 2), a1]);
        assert_eq!(c.spectral_radius(), f64::INFINITY);
    }

    #[test]
    fn test_complex_roots() {
        // Rotation scaled by 0.9: eigenvalues 0.9 * e^{+-i pi/2}.
        let a1 = DMatrix::from_row_slice(2, 2, &[0.0, -0.9, 0.9, 0.0]);
        let c = Companion::new(&DMatrix::identity(2, 2), &[DMatrix::zeros(2, 2), a1]);
        assert_relative_eq!(c.spectral_radius(), 0.9, epsilon = 1e-10);
    }
}
