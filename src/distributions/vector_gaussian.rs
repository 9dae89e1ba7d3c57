//! A multivariate Gaussian belief in natural parameterization.
//!
//! Stored as (precision * mean, precision). Moment accessors go through the
//! Cholesky routines in `linalg`, so an improper precision matrix surfaces as
//! `NotPositiveDefinite` instead of silent NaNs.

use super::ExponentialFamily;
use crate::linalg::{cholesky, cholesky_solve, ln_det_from_cholesky, spd_inverse};
use crate::stable::LOG_SQRT_2PI;
use crate::util::{HeraldError, Result};

use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

#[derive(Clone, Debug, PartialEq)]
pub struct VectorGaussian {
    mean_times_precision: Array1<f64>,
    precision: Array2<f64>,
}

impl VectorGaussian {
    /// The (improper) uniform belief in `n` dimensions: all naturals zero.
    pub fn uniform(n: usize) -> Self {
        VectorGaussian {
            mean_times_precision: Array1::zeros(n),
            precision: Array2::zeros((n, n)),
        }
    }

    pub fn from_natural(mean_times_precision: Array1<f64>, precision: Array2<f64>) -> Result<Self> {
        let n = mean_times_precision.len();
        if precision.nrows() != n || precision.ncols() != n {
            return Err(HeraldError::DimensionMismatch);
        }
        Ok(VectorGaussian {
            mean_times_precision,
            precision,
        })
    }

    pub fn from_mean_and_covariance(mean: &Array1<f64>, covariance: &Array2<f64>) -> Result<Self> {
        let precision = spd_inverse(covariance)?;
        if precision.nrows() != mean.len() {
            return Err(HeraldError::DimensionMismatch);
        }
        Ok(VectorGaussian {
            mean_times_precision: precision.dot(mean),
            precision,
        })
    }

    pub fn dim(&self) -> usize {
        self.mean_times_precision.len()
    }

    pub fn mean_times_precision(&self) -> &Array1<f64> {
        &self.mean_times_precision
    }

    pub fn precision(&self) -> &Array2<f64> {
        &self.precision
    }

    /// Solve precision * mean = mean_times_precision.
    pub fn mean(&self) -> Result<Array1<f64>> {
        let l = cholesky(&self.precision)?;
        cholesky_solve(&l, &self.mean_times_precision)
    }

    pub fn covariance(&self) -> Result<Array2<f64>> {
        spd_inverse(&self.precision)
    }

    /// ln of the density at x.
    pub fn log_prob(&self, x: &Array1<f64>) -> Result<f64> {
        if x.len() != self.dim() {
            return Err(HeraldError::DimensionMismatch);
        }
        let l = cholesky(&self.precision)?;
        let mean = cholesky_solve(&l, &self.mean_times_precision)?;
        let d = x - &mean;
        let quad = d.dot(&self.precision.dot(&d));
        let n = self.dim() as f64;
        Ok(-n * LOG_SQRT_2PI + 0.5 * ln_det_from_cholesky(&l) - 0.5 * quad)
    }

    /// Draw x = mean + L^-T z with precision = L L^T and z standard normal.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Array1<f64>> {
        let l = cholesky(&self.precision)?;
        let mean = cholesky_solve(&l, &self.mean_times_precision)?;

        let n = self.dim();
        let z: Array1<f64> = (0..n).map(|_| StandardNormal.sample(rng)).collect();

        // back substitution with L^T alone
        let mut shift = Array1::<f64>::zeros(n);
        for i in (0..n).rev() {
            let mut sum = z[i];
            for k in (i + 1)..n {
                sum -= l[[k, i]] * shift[k];
            }
            shift[i] = sum / l[[i, i]];
        }
        Ok(mean + shift)
    }

    /// tau^T Lambda^-1 tau / 2 + (n ln 2 pi - ln det Lambda) / 2
    fn log_partition(&self) -> Result<f64> {
        let l = cholesky(&self.precision)?;
        let mean = cholesky_solve(&l, &self.mean_times_precision)?;
        let quad = self.mean_times_precision.dot(&mean);
        let n = self.dim() as f64;
        Ok(0.5 * quad + n * LOG_SQRT_2PI - 0.5 * ln_det_from_cholesky(&l))
    }
}

impl ExponentialFamily for VectorGaussian {
    fn product(&self, other: &Self) -> Result<Self> {
        if self.dim() != other.dim() {
            return Err(HeraldError::DimensionMismatch);
        }
        Ok(VectorGaussian {
            mean_times_precision: &self.mean_times_precision + &other.mean_times_precision,
            precision: &self.precision + &other.precision,
        })
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        if self.dim() != other.dim() {
            return Err(HeraldError::DimensionMismatch);
        }
        Ok(VectorGaussian {
            mean_times_precision: &self.mean_times_precision - &other.mean_times_precision,
            precision: &self.precision - &other.precision,
        })
    }

    fn log_normalizer(&self) -> f64 {
        self.log_partition().unwrap_or(f64::INFINITY)
    }

    fn log_average_of(&self, other: &Self) -> Result<f64> {
        if self.is_uniform() || other.is_uniform() {
            return Ok(0.0);
        }
        let combined = self.product(other)?;
        Ok(combined.log_partition()? - self.log_partition()? - other.log_partition()?)
    }

    fn is_proper(&self) -> bool {
        cholesky(&self.precision).is_ok()
    }

    fn is_uniform(&self) -> bool {
        self.mean_times_precision.iter().all(|&t| t == 0.0)
            && self.precision.iter().all(|&p| p == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn example() -> VectorGaussian {
        let mean = array![1.0, -1.0];
        let cov = array![[2.0, 0.5], [0.5, 1.0]];
        VectorGaussian::from_mean_and_covariance(&mean, &cov).unwrap()
    }

    #[test]
    fn moment_round_trip() {
        let g = example();
        let mean = g.mean().unwrap();
        assert_abs_diff_eq!(mean[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(mean[1], -1.0, epsilon = 1e-10);

        let cov = g.covariance().unwrap();
        assert_abs_diff_eq!(cov[[0, 0]], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(cov[[0, 1]], 0.5, epsilon = 1e-10);
        assert_abs_diff_eq!(cov[[1, 1]], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn product_then_ratio_recovers() {
        let a = example();
        let b = VectorGaussian::from_mean_and_covariance(
            &array![0.0, 2.0],
            &array![[1.0, 0.0], [0.0, 1.0]],
        )
        .unwrap();

        let restored = a.product(&b).unwrap().ratio(&b).unwrap();
        for (x, y) in restored
            .mean_times_precision()
            .iter()
            .zip(a.mean_times_precision().iter())
        {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
    }

    #[test]
    fn log_prob_reduces_to_scalar_case() {
        let g = VectorGaussian::from_mean_and_covariance(&array![0.5], &array![[2.0]]).unwrap();
        let scalar = crate::distributions::Gaussian::from_mean_and_variance(0.5, 2.0).unwrap();
        assert_abs_diff_eq!(
            g.log_prob(&array![1.25]).unwrap(),
            scalar.log_prob(1.25),
            epsilon = 1e-10
        );
    }

    #[test]
    fn log_average_reduces_to_scalar_case() {
        let a = VectorGaussian::from_mean_and_covariance(&array![1.0], &array![[2.0]]).unwrap();
        let b = VectorGaussian::from_mean_and_covariance(&array![-1.0], &array![[3.0]]).unwrap();

        let sa = crate::distributions::Gaussian::from_mean_and_variance(1.0, 2.0).unwrap();
        let sb = crate::distributions::Gaussian::from_mean_and_variance(-1.0, 3.0).unwrap();

        assert_abs_diff_eq!(
            a.log_average_of(&b).unwrap(),
            sa.log_average_of(&sb).unwrap(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn uniform_is_improper_unit() {
        let u = VectorGaussian::uniform(2);
        let g = example();
        assert!(!u.is_proper());
        assert!(u.mean().is_err());

        let prod = g.product(&u).unwrap();
        for (x, y) in prod.precision().iter().zip(g.precision().iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-12);
        }
    }
}
