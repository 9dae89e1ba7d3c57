//! Operators for the deterministic factor `result = matrix * operand` over
//! vector-Gaussian beliefs.
//!
//! Pushing a belief forward works in moment space (mean and covariance
//! transform directly); pushing a message back works in natural-parameter
//! space and needs no matrix inversion at all. Both coincide under EP and
//! VMP because the factor is deterministic and linear.

use crate::distributions::VectorGaussian;
use crate::util::{HeraldError, Result};

use ndarray::{Array1, Array2};

#[derive(Clone, Debug)]
pub struct MatrixVectorProduct {
    matrix: Array2<f64>,
}

impl MatrixVectorProduct {
    pub fn new(matrix: Array2<f64>) -> Result<Self> {
        if matrix.nrows() == 0 || matrix.ncols() == 0 {
            return Err(HeraldError::InvalidParameter(String::from(
                "matrix must be nonempty",
            )));
        }
        if matrix.iter().any(|m| m.is_nan()) {
            return Err(HeraldError::InvalidParameter(String::from(
                "matrix entries must be finite",
            )));
        }
        Ok(MatrixVectorProduct { matrix })
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Message to `result`: N(A mu, A Sigma A^T).
    ///
    /// # Errors
    /// * `HeraldError::NotPositiveDefinite` when the operand belief is
    ///   improper or the matrix is rank deficient (the pushed-forward
    ///   covariance then has no Gaussian message form)
    pub fn to_result(&self, operand: &VectorGaussian) -> Result<VectorGaussian> {
        if operand.dim() != self.matrix.ncols() {
            return Err(HeraldError::DimensionMismatch);
        }
        let mean = self.matrix.dot(&operand.mean()?);
        let covariance = self.matrix.dot(&operand.covariance()?).dot(&self.matrix.t());
        VectorGaussian::from_mean_and_covariance(&mean, &covariance)
    }

    /// Message to `operand`: the natural parameters of the result message
    /// pulled back through the matrix, Lambda = A^T Lambda_y A and
    /// tau = A^T tau_y. Frequently improper, which is fine for a message.
    pub fn to_operand(&self, result_msg: &VectorGaussian) -> Result<VectorGaussian> {
        if result_msg.dim() != self.matrix.nrows() {
            return Err(HeraldError::DimensionMismatch);
        }
        let tau = self.matrix.t().dot(result_msg.mean_times_precision());
        let lambda = self
            .matrix
            .t()
            .dot(result_msg.precision())
            .dot(&self.matrix);
        VectorGaussian::from_natural(tau, lambda)
    }

    /// ln of the density of an observed result under the pushed-forward
    /// operand belief.
    pub fn log_average_factor(
        &self,
        result: &Array1<f64>,
        operand: &VectorGaussian,
    ) -> Result<f64> {
        self.to_result(operand)?.log_prob(result)
    }

    /// Deterministic factors contribute no evidence of their own under EP.
    pub fn log_evidence_ratio(&self) -> f64 {
        0.0
    }

    /// Evaluate the factor at a point operand, for Gibbs sweeps and
    /// deterministic propagation.
    pub fn result(&self, operand: &Array1<f64>) -> Result<Array1<f64>> {
        if operand.len() != self.matrix.ncols() {
            return Err(HeraldError::DimensionMismatch);
        }
        Ok(self.matrix.dot(operand))
    }
}
