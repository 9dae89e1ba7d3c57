//! A Gaussian belief over a real variable in natural parameterization.
//!
//! The parameters are (mean * precision, precision). When the precision is
//! infinite the first field holds the mean itself; every accessor branches on
//! `is_point_mass` so the convention never leaks.

use super::ExponentialFamily;
use crate::stable::LOG_SQRT_2PI;
use crate::util::{HeraldError, Result};

use rand::Rng;
use rand_distr::Distribution;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gaussian {
    /// mean * precision, or the mean itself for a point mass
    mean_times_precision: f64,
    precision: f64,
}

impl Gaussian {
    /// The (improper) uniform belief: zero precision.
    pub fn uniform() -> Self {
        Gaussian {
            mean_times_precision: 0.0,
            precision: 0.0,
        }
    }

    pub fn from_natural(mean_times_precision: f64, precision: f64) -> Self {
        Gaussian {
            mean_times_precision,
            precision,
        }
    }

    pub fn from_mean_and_variance(mean: f64, variance: f64) -> Result<Self> {
        if variance < 0.0 || variance.is_nan() {
            return Err(HeraldError::InvalidParameter(format!(
                "Gaussian variance must be nonnegative, got {}",
                variance
            )));
        }
        if variance == 0.0 {
            return Ok(Gaussian::point_mass(mean));
        }
        if variance == f64::INFINITY {
            return Ok(Gaussian::uniform());
        }
        let precision = 1.0 / variance;
        Ok(Gaussian {
            mean_times_precision: mean * precision,
            precision,
        })
    }

    pub fn point_mass(mean: f64) -> Self {
        Gaussian {
            mean_times_precision: mean,
            precision: f64::INFINITY,
        }
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn mean_times_precision(&self) -> f64 {
        self.mean_times_precision
    }

    pub fn is_point_mass(&self) -> bool {
        self.precision == f64::INFINITY
    }

    pub fn mean(&self) -> Result<f64> {
        if self.is_point_mass() {
            return Ok(self.mean_times_precision);
        }
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(self.mean_times_precision / self.precision)
    }

    pub fn variance(&self) -> Result<f64> {
        if self.is_point_mass() {
            return Ok(0.0);
        }
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(1.0 / self.precision)
    }

    /// ln of the density at x.
    pub fn log_prob(&self, x: f64) -> f64 {
        if self.is_point_mass() {
            return if x == self.mean_times_precision {
                f64::INFINITY
            } else {
                f64::NEG_INFINITY
            };
        }
        let m = self.mean_times_precision / self.precision;
        let d = x - m;
        -LOG_SQRT_2PI + 0.5 * self.precision.ln() - 0.5 * d * d * self.precision
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        if self.is_point_mass() {
            return Ok(self.mean_times_precision);
        }
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        let dist = rand_distr::Normal::new(self.mean()?, self.variance()?.sqrt())
            .map_err(|_| HeraldError::ImproperDistribution)?;
        Ok(dist.sample(rng))
    }
}

impl ExponentialFamily for Gaussian {
    fn product(&self, other: &Self) -> Result<Self> {
        if self.is_point_mass() {
            if other.is_point_mass() && other.mean_times_precision != self.mean_times_precision {
                return Err(HeraldError::ImproperDistribution);
            }
            return Ok(*self);
        }
        if other.is_point_mass() {
            return Ok(*other);
        }
        Ok(Gaussian {
            mean_times_precision: self.mean_times_precision + other.mean_times_precision,
            precision: self.precision + other.precision,
        })
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        if other.is_point_mass() {
            if self.is_point_mass() && self.mean_times_precision == other.mean_times_precision {
                return Ok(Gaussian::uniform());
            }
            return Err(HeraldError::DivideByZero);
        }
        if self.is_point_mass() {
            return Ok(*self);
        }
        Ok(Gaussian {
            mean_times_precision: self.mean_times_precision - other.mean_times_precision,
            precision: self.precision - other.precision,
        })
    }

    /// A(tau, lambda) = tau^2 / (2 lambda) + 0.5 ln(2 pi / lambda)
    fn log_normalizer(&self) -> f64 {
        self.mean_times_precision * self.mean_times_precision / (2.0 * self.precision)
            + LOG_SQRT_2PI
            - 0.5 * self.precision.ln()
    }

    fn log_average_of(&self, other: &Self) -> Result<f64> {
        if self.is_uniform() || other.is_uniform() {
            return Ok(0.0);
        }
        if self.is_point_mass() {
            return Ok(other.log_prob(self.mean_times_precision));
        }
        if other.is_point_mass() {
            return Ok(self.log_prob(other.mean_times_precision));
        }
        if !self.is_proper() || !other.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        // int N(x; m1, v1) N(x; m2, v2) dx = N(m1 - m2; 0, v1 + v2)
        let v = self.variance()? + other.variance()?;
        let d = self.mean()? - other.mean()?;
        Ok(-LOG_SQRT_2PI - 0.5 * v.ln() - 0.5 * d * d / v)
    }

    fn is_proper(&self) -> bool {
        (self.precision > 0.0 || self.is_point_mass()) && self.mean_times_precision.is_finite()
    }

    fn is_uniform(&self) -> bool {
        self.precision == 0.0 && self.mean_times_precision == 0.0
    }
}
