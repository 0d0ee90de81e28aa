//! Simultaneous (lag-0) reduction: `R = (I - A_0)^{-1}`.
use super::error::SolveError;
use crate::analysis::topology::cyclic_blocks;
use crate::store::{VarId, Variables};
use nalgebra::DMatrix;

/// Inverts `I - A_0`.
///
/// `I - A_0` is block triangular over the strongly connected lag-0 blocks, so
/// it is singular exactly when one of the cyclic blocks is. Those blocks are
/// checked first so a failure names the variables involved.
pub fn reduce(
    a0: &DMatrix<f64>,
    variables: &Variables,
    tolerance: f64,
) -> Result<DMatrix<f64>, SolveError> {
    let n = a0.nrows();
    let lhs = DMatrix::<f64>::identity(n, n) - a0;

    // 1. Singular cyclic blocks
    let blocks = cyclic_blocks(a0);
    let mut implicated: Vec<usize> = Vec::new();
    for block in &blocks {
        let sub = DMatrix::from_fn(block.len(), block.len(), |r, c| lhs[(block[r], block[c])]);
        if is_singular(&sub, tolerance) {
            implicated.extend(block);
        }
    }
    if !implicated.is_empty() {
        implicated.sort_unstable();
        return Err(non_identifiable(&implicated, variables));
    }

    // 2. Inversion. A failure here is numerical; blame every cyclic block.
    match lhs.try_inverse() {
        Some(inv) if inv.iter().all(|v| v.is_finite()) => Ok(inv),
        _ => {
            let mut all: Vec<usize> = blocks.into_iter().flatten().collect();
            if all.is_empty() {
                all = (0..n).collect();
            }
            all.sort_unstable();
            Err(non_identifiable(&all, variables))
        }
    }
}

/// Smallest singular value at most `tolerance` times the largest. A block
/// with non-finite entries counts as singular.
pub(crate) fn is_singular(m: &DMatrix<f64>, tolerance: f64) -> bool {
    if m.is_empty() {
        return false;
    }
    if m.iter().any(|v| !v.is_finite()) {
        return true;
    }
    let sv = m.clone().svd(false, false).singular_values;
    let (max, min) = (sv.max(), sv.min());
    !(max > 0.0) || min <= tolerance * max
}

fn non_identifiable(indices: &[usize], variables: &Variables) -> SolveError {
    SolveError::NonIdentifiableStructure {
        variables: indices.iter().map(|&i| variables.name(VarId::new(i)).to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const TOL: f64 = 1e-10;

    fn feedback(a: f64, b: f64) -> DMatrix<f64> {
        // y -> x with `a`, x -> y with `b`.
        DMatrix::from_row_slice(2, 2, &[0.0, a, b, 0.0])
    }

    #[rstest]
    #[case(0.5, 0.4)]
    #[case(-1.5, 0.3)]
    #[case(2.0, 0.25)]
    #[case(3.0, 1.0)]
    fn test_two_cycle_closed_form(#[case] a: f64, #[case] b: f64) {
        let vars = Variables::new(["x", "y"]).unwrap();
        let r = reduce(&feedback(a, b), &vars, TOL).unwrap();
        let scale = 1.0 / (1.0 - a * b);
        let expected = DMatrix::from_row_slice(2, 2, &[1.0, a, b, 1.0]) * scale;
        assert_relative_eq!(r, expected, epsilon = 1e-12);
    }

    #[rstest]
    #[case(1.0, 1.0)]
    #[case(2.0, 0.5)]
    #[case(-4.0, -0.25)]
    fn test_unit_gain_is_non_identifiable(#[case] a: f64, #[case] b: f64) {
        let vars = Variables::new(["x", "y"]).unwrap();
        let err = reduce(&feedback(a, b), &vars, TOL).unwrap_err();
        let variables = vec!["x".into(), "y".into()];
        assert_eq!(err, SolveError::NonIdentifiableStructure { variables });
    }

    #[test]
    fn test_only_the_singular_block_is_named() {
        // w -> x plus a unit-gain cycle between y and z.
        let vars = Variables::new(["w", "x", "y", "z"]).unwrap();
        let mut a0 = DMatrix::zeros(4, 4);
        a0[(1, 0)] = 0.7;
        a0[(2, 3)] = 0.5;
        a0[(3, 2)] = 2.0;
        a0[(2, 1)] = 0.3;
        let err = reduce(&a0, &vars, TOL).unwrap_err();
        let variables = vec!["y".into(), "z".into()];
        assert_eq!(err, SolveError::NonIdentifiableStructure { variables });
    }

    #[test]
    fn test_nan_in_a_cycle_is_an_error_not_a_panic() {
        let vars = Variables::new(["x", "y"]).unwrap();
        let err = reduce(&feedback(f64::NAN, 0.2), &vars, TOL).unwrap_err();
        let variables = vec!["x".into(), "y".into()];
        assert_eq!(err, SolveError::NonIdentifiableStructure { variables });
    }

    #[test]
    fn test_acyclic_reduction() {
        let vars = Variables::new(["x", "y", "z"]).unwrap();
        let mut a0 = DMatrix::zeros(3, 3);
        a0[(1, 0)] = 0.5; // x -> y
        a0[(2, 1)] = 2.0; // y -> z
        let r = reduce(&a0, &vars, TOL).unwrap();
        // Indirect x -> z is the product along the chain.
        assert_relative_eq!(r[(2, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(r[(1, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(r[(0, 2)], 0.0, epsilon = 1e-12);
    }
}
