//! Operators for the deterministic factor `sum = left + right` over scalar
//! Gaussian beliefs.
//!
//! Convolution makes every message a mean/variance addition or subtraction.
//! Uniform inputs propagate to uniform outputs: with no information about one
//! operand there is none about the sum.

use crate::distributions::{ExponentialFamily, Gaussian};
use crate::util::Result;

/// Message to `sum`: means add, variances add. Identical under EP and VMP.
pub fn to_sum(left: &Gaussian, right: &Gaussian) -> Result<Gaussian> {
    if left.is_uniform() || right.is_uniform() {
        return Ok(Gaussian::uniform());
    }
    Gaussian::from_mean_and_variance(
        left.mean()? + right.mean()?,
        left.variance()? + right.variance()?,
    )
}

/// Message to one operand given the message on `sum` and the belief over the
/// other operand: the difference of means, with variances still adding.
pub fn to_operand(sum_msg: &Gaussian, other: &Gaussian) -> Result<Gaussian> {
    if sum_msg.is_uniform() || other.is_uniform() {
        return Ok(Gaussian::uniform());
    }
    Gaussian::from_mean_and_variance(
        sum_msg.mean()? - other.mean()?,
        sum_msg.variance()? + other.variance()?,
    )
}

/// ln of the density of an observed sum under the two operand beliefs.
pub fn log_average_factor(sum: f64, left: &Gaussian, right: &Gaussian) -> Result<f64> {
    Ok(to_sum(left, right)?.log_prob(sum))
}

/// Deterministic factors contribute no evidence of their own under EP.
pub fn log_evidence_ratio() -> f64 {
    0.0
}
