//! Small dense linear algebra for symmetric positive definite matrices.
//!
//! The vector-Gaussian operators need Cholesky factors, triangular solves and
//! the occasional explicit inverse on matrices of modest size. Everything here
//! works directly on `ndarray` types without an external LAPACK binding.

use crate::util::{HeraldError, Result};

use ndarray::{Array1, Array2};

/// Lower Cholesky factor L of a symmetric positive definite matrix, A = L L^T.
///
/// # Errors
/// * `HeraldError::DimensionMismatch` if the matrix is not square
/// * `HeraldError::NotPositiveDefinite` if a pivot is not strictly positive
pub fn cholesky(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(HeraldError::DimensionMismatch);
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return Err(HeraldError::NotPositiveDefinite);
        }
        l[[j, j]] = diag.sqrt();

        for i in (j + 1)..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / l[[j, j]];
        }
    }
    Ok(l)
}

/// Solve A x = b given the lower Cholesky factor L of A.
///
/// Forward substitution with L, then back substitution with L^T.
pub fn cholesky_solve(l: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = l.nrows();
    if b.len() != n {
        return Err(HeraldError::DimensionMismatch);
    }

    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    Ok(x)
}

/// Explicit inverse of a symmetric positive definite matrix via Cholesky.
///
/// Solves against each unit vector and symmetrizes the result to wash out
/// the last bits of rounding asymmetry.
pub fn spd_inverse(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    let l = cholesky(a)?;

    let mut inv = Array2::<f64>::zeros((n, n));
    let mut e = Array1::<f64>::zeros(n);
    for j in 0..n {
        e[j] = 1.0;
        let col = cholesky_solve(&l, &e)?;
        inv.column_mut(j).assign(&col);
        e[j] = 0.0;
    }

    let symmetrized = 0.5 * (&inv + &inv.t());
    Ok(symmetrized)
}

/// ln det A given the lower Cholesky factor L of A.
pub fn ln_det_from_cholesky(l: &Array2<f64>) -> f64 {
    2.0 * l.diag().iter().map(|d| d.ln()).sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn spd_example() -> Array2<f64> {
        array![[4.0, 2.0, 0.6], [2.0, 5.0, 1.5], [0.6, 1.5, 3.0]]
    }

    #[test]
    fn cholesky_reconstructs() {
        let a = spd_example();
        let l = cholesky(&a).unwrap();
        let rebuilt = l.dot(&l.t());
        for (x, y) in a.iter().zip(rebuilt.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
        // strictly lower triangular above the diagonal
        assert_eq!(l[[0, 1]], 0.0);
        assert_eq!(l[[0, 2]], 0.0);
        assert_eq!(l[[1, 2]], 0.0);
    }

    #[test]
    fn cholesky_rejects_indefinite() {
        let a = array![[1.0, 2.0], [2.0, 1.0]];
        assert_eq!(cholesky(&a), Err(HeraldError::NotPositiveDefinite));

        let rect = Array2::<f64>::zeros((2, 3));
        assert_eq!(cholesky(&rect), Err(HeraldError::DimensionMismatch));
    }

    #[test]
    fn solve_recovers_solution() {
        let a = spd_example();
        let x_true = array![1.0, -2.0, 0.5];
        let b = a.dot(&x_true);

        let l = cholesky(&a).unwrap();
        let x = cholesky_solve(&l, &b).unwrap();
        for (xi, ti) in x.iter().zip(x_true.iter()) {
            assert_abs_diff_eq!(xi, ti, epsilon = 1e-10);
        }
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let a = spd_example();
        let inv = spd_inverse(&a).unwrap();
        let eye = a.dot(&inv);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(eye[[i, j]], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn log_det_matches_direct() {
        let a = array![[2.0, 0.0], [0.0, 8.0]];
        let l = cholesky(&a).unwrap();
        assert_abs_diff_eq!(ln_det_from_cholesky(&l), 16f64.ln(), epsilon = 1e-12);
    }
}
