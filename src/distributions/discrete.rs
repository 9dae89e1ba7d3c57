//! A categorical belief over a finite domain, stored as unnormalized log
//! probabilities.
//!
//! Messages multiply and divide pointwise, so products and ratios are
//! elementwise additions and subtractions of the log vector. Normalization
//! happens only when probabilities are actually read out.

use super::ExponentialFamily;
use crate::stable::log_sum_exp;
use crate::util::{HeraldError, Result};

use ndarray::Array1;
use rand::Rng;

#[derive(Clone, Debug, PartialEq)]
pub struct Discrete {
    log_probs: Array1<f64>,
}

impl Discrete {
    /// The uniform belief over `n` outcomes.
    pub fn uniform(n: usize) -> Self {
        Discrete {
            log_probs: Array1::zeros(n),
        }
    }

    pub fn from_log_probs(log_probs: Array1<f64>) -> Self {
        Discrete { log_probs }
    }

    /// Construct from (possibly unnormalized) nonnegative weights.
    ///
    /// # Errors
    /// * `HeraldError::InvalidParameter` on a negative weight
    pub fn from_probs(probs: &[f64]) -> Result<Self> {
        if probs.iter().any(|&p| p < 0.0 || p.is_nan()) {
            return Err(HeraldError::InvalidParameter(String::from(
                "Discrete weights must be nonnegative",
            )));
        }
        Ok(Discrete {
            log_probs: probs.iter().map(|&p| p.ln()).collect(),
        })
    }

    /// The belief with all mass on outcome `index`.
    pub fn point_mass(index: usize, n: usize) -> Self {
        let mut log_probs = Array1::from_elem(n, f64::NEG_INFINITY);
        log_probs[index] = 0.0;
        Discrete { log_probs }
    }

    /// Number of outcomes in the domain.
    pub fn len(&self) -> usize {
        self.log_probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_probs.is_empty()
    }

    pub fn log_probs(&self) -> &Array1<f64> {
        &self.log_probs
    }

    /// The normalized probability vector.
    pub fn probs(&self) -> Result<Array1<f64>> {
        let z = self.log_normalizer();
        if !z.is_finite() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(self.log_probs.mapv(|lp| (lp - z).exp()))
    }

    /// Normalized P(outcome = index).
    pub fn prob(&self, index: usize) -> Result<f64> {
        let z = self.log_normalizer();
        if !z.is_finite() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok((self.log_probs[index] - z).exp())
    }

    /// The most probable outcome (lowest index wins ties).
    pub fn mode(&self) -> usize {
        let mut best = 0;
        for (i, &lp) in self.log_probs.iter().enumerate() {
            if lp > self.log_probs[best] {
                best = i;
            }
        }
        best
    }

    pub fn is_point_mass(&self) -> bool {
        self.log_probs
            .iter()
            .filter(|lp| **lp > f64::NEG_INFINITY)
            .count()
            == 1
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize> {
        let p = self.probs()?;
        let draw = rng.gen::<f64>();
        let mut acc = 0.0;
        for (i, &pi) in p.iter().enumerate() {
            acc += pi;
            if draw < acc {
                return Ok(i);
            }
        }
        // rounding pushed the cumulative sum just under 1
        Ok(p.len() - 1)
    }
}

impl ExponentialFamily for Discrete {
    fn product(&self, other: &Self) -> Result<Self> {
        if self.len() != other.len() {
            return Err(HeraldError::DimensionMismatch);
        }
        let log_probs = &self.log_probs + &other.log_probs;
        if log_probs.iter().all(|lp| *lp == f64::NEG_INFINITY) {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(Discrete { log_probs })
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        if self.len() != other.len() {
            return Err(HeraldError::DimensionMismatch);
        }
        let mut log_probs = Array1::zeros(self.len());
        for i in 0..self.len() {
            let (num, den) = (self.log_probs[i], other.log_probs[i]);
            log_probs[i] = if num == f64::NEG_INFINITY {
                // 0 / x = 0, including 0 / 0
                f64::NEG_INFINITY
            } else if den == f64::NEG_INFINITY {
                return Err(HeraldError::DivideByZero);
            } else {
                num - den
            };
        }
        Ok(Discrete { log_probs })
    }

    fn log_normalizer(&self) -> f64 {
        log_sum_exp(self.log_probs.as_slice().unwrap_or(&[]))
    }

    fn log_average_of(&self, other: &Self) -> Result<f64> {
        let combined = self.product(other)?;
        Ok(combined.log_normalizer() - self.log_normalizer() - other.log_normalizer())
    }

    fn is_proper(&self) -> bool {
        self.log_normalizer().is_finite()
    }

    fn is_uniform(&self) -> bool {
        self.log_probs.iter().all(|lp| *lp == 0.0)
    }
}
