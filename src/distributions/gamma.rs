//! A Gamma belief over a positive rate, in shape/rate parameterization.

use super::ExponentialFamily;
use crate::stable::{digamma, ln_gamma, trigamma};
use crate::util::{HeraldError, Result};

use rand::Rng;
use rand_distr::Distribution;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gamma {
    shape: f64,
    rate: f64,
}

impl Gamma {
    /// The uniform belief: shape one, rate zero (zero natural parameters).
    pub fn uniform() -> Self {
        Gamma {
            shape: 1.0,
            rate: 0.0,
        }
    }

    pub fn new(shape: f64, rate: f64) -> Self {
        Gamma { shape, rate }
    }

    pub fn shape(&self) -> f64 {
        self.shape
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn mean(&self) -> Result<f64> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(self.shape / self.rate)
    }

    pub fn variance(&self) -> Result<f64> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(self.shape / (self.rate * self.rate))
    }

    /// E[ln x] = digamma(shape) - ln(rate)
    pub fn mean_log(&self) -> Result<f64> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(digamma(self.shape) - self.rate.ln())
    }

    /// Var[ln x] = trigamma(shape)
    pub fn variance_log(&self) -> Result<f64> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(trigamma(self.shape))
    }

    /// Moment-matching projection: the Gamma with the given mean and variance.
    pub fn from_mean_and_variance(mean: f64, variance: f64) -> Result<Self> {
        if mean <= 0.0 || variance <= 0.0 || !mean.is_finite() || !variance.is_finite() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(Gamma {
            shape: mean * mean / variance,
            rate: mean / variance,
        })
    }

    /// ln p(x) of the density at x > 0.
    pub fn log_prob(&self, x: f64) -> f64 {
        self.shape * self.rate.ln() - ln_gamma(self.shape) + (self.shape - 1.0) * x.ln()
            - self.rate * x
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        let dist = rand_distr::Gamma::new(self.shape, 1.0 / self.rate)
            .map_err(|_| HeraldError::ImproperDistribution)?;
        Ok(dist.sample(rng))
    }
}

impl ExponentialFamily for Gamma {
    fn product(&self, other: &Self) -> Result<Self> {
        Ok(Gamma {
            shape: self.shape + other.shape - 1.0,
            rate: self.rate + other.rate,
        })
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        Ok(Gamma {
            shape: self.shape - other.shape + 1.0,
            rate: self.rate - other.rate,
        })
    }

    /// A(shape, rate) = ln Gamma(shape) - shape * ln(rate)
    fn log_normalizer(&self) -> f64 {
        ln_gamma(self.shape) - self.shape * self.rate.ln()
    }

    fn log_average_of(&self, other: &Self) -> Result<f64> {
        if self.is_uniform() || other.is_uniform() {
            return Ok(0.0);
        }
        let combined = self.product(other)?;
        if !combined.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(combined.log_normalizer() - self.log_normalizer() - other.log_normalizer())
    }

    fn is_proper(&self) -> bool {
        self.shape > 0.0 && self.rate > 0.0
    }

    fn is_uniform(&self) -> bool {
        self.shape == 1.0 && self.rate == 0.0
    }
}
