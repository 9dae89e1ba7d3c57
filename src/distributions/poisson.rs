//! A belief over a count, stored as a conflated Poisson.
//!
//! The family is p(k) proportional to rate^k / (k!)^precision. Precision one
//! is the ordinary Poisson; precision zero with rate one is the uniform
//! belief over counts, which is what a ratio of two equal Poisson messages
//! leaves behind. Mixed precisions appear whenever Poisson messages are
//! multiplied or divided, so the general series forms are kept alongside the
//! precision-one closed forms.

use super::ExponentialFamily;
use crate::stable::{ln_factorial, log_add_exp};
use crate::util::{HeraldError, Result};

use rand::Rng;
use rand_distr::Distribution;

/// Series terms are abandoned once they fall this far below the peak.
const SERIES_LOG_TOLERANCE: f64 = 45.0;
const SERIES_MAX_TERMS: usize = 100_000;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Poisson {
    log_rate: f64,
    precision: f64,
}

impl Poisson {
    /// An ordinary Poisson with the given rate.
    pub fn standard(rate: f64) -> Result<Self> {
        if rate < 0.0 || rate.is_nan() {
            return Err(HeraldError::InvalidParameter(format!(
                "Poisson rate must be nonnegative, got {}",
                rate
            )));
        }
        Ok(Poisson {
            log_rate: rate.ln(),
            precision: 1.0,
        })
    }

    /// The uniform belief over counts: rate one, precision zero.
    pub fn uniform() -> Self {
        Poisson {
            log_rate: 0.0,
            precision: 0.0,
        }
    }

    pub fn from_log_rate_and_precision(log_rate: f64, precision: f64) -> Self {
        Poisson {
            log_rate,
            precision,
        }
    }

    pub fn log_rate(&self) -> f64 {
        self.log_rate
    }

    pub fn rate(&self) -> f64 {
        self.log_rate.exp()
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// ln of the unnormalized mass at count k.
    fn log_weight(&self, k: u64) -> f64 {
        if k == 0 {
            // avoids 0 * -inf when the rate itself is zero
            return 0.0;
        }
        k as f64 * self.log_rate - self.precision * ln_factorial(k)
    }

    /// ln P(k) under the normalized belief.
    pub fn log_prob(&self, k: u64) -> Result<f64> {
        Ok(self.log_weight(k) - self.series_log_normalizer()?)
    }

    /// Sum the series for (ln Z, E[k], E[k^2]) in one pass.
    fn series_moments(&self) -> Result<(f64, f64, f64)> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }

        let mut log_z = f64::NEG_INFINITY;
        let mut log_s1 = f64::NEG_INFINITY;
        let mut log_s2 = f64::NEG_INFINITY;
        let mut peak = f64::NEG_INFINITY;
        let mut prev = f64::NEG_INFINITY;

        for k in 0..SERIES_MAX_TERMS {
            let t = self.log_weight(k as u64);
            log_z = log_add_exp(log_z, t);
            if k > 0 {
                let lk = (k as f64).ln();
                log_s1 = log_add_exp(log_s1, lk + t);
                log_s2 = log_add_exp(log_s2, 2.0 * lk + t);
            }
            if t > peak {
                peak = t;
            }
            if t < prev && t < peak - SERIES_LOG_TOLERANCE {
                let mean = (log_s1 - log_z).exp();
                let second = (log_s2 - log_z).exp();
                return Ok((log_z, mean, second - mean * mean));
            }
            prev = t;
        }
        Err(HeraldError::General(String::from(
            "Poisson series did not converge; rate is too large for this precision",
        )))
    }

    fn series_log_normalizer(&self) -> Result<f64> {
        if self.precision == 1.0 {
            return Ok(self.rate());
        }
        if self.precision == 0.0 {
            if self.log_rate >= 0.0 {
                return Err(HeraldError::ImproperDistribution);
            }
            // geometric series: -ln(1 - rate)
            return Ok(-(-self.rate()).ln_1p());
        }
        self.series_moments().map(|(z, _, _)| z)
    }

    pub fn mean(&self) -> Result<f64> {
        if self.precision == 1.0 {
            return Ok(self.rate());
        }
        if self.precision == 0.0 {
            if self.log_rate >= 0.0 {
                return Err(HeraldError::ImproperDistribution);
            }
            let r = self.rate();
            return Ok(r / (1.0 - r));
        }
        self.series_moments().map(|(_, m, _)| m)
    }

    pub fn variance(&self) -> Result<f64> {
        if self.precision == 1.0 {
            return Ok(self.rate());
        }
        if self.precision == 0.0 {
            if self.log_rate >= 0.0 {
                return Err(HeraldError::ImproperDistribution);
            }
            let r = self.rate();
            return Ok(r / ((1.0 - r) * (1.0 - r)));
        }
        self.series_moments().map(|(_, _, v)| v)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<u64> {
        if self.precision == 1.0 {
            let rate = self.rate();
            if rate == 0.0 {
                return Ok(0);
            }
            let dist =
                rand_distr::Poisson::new(rate).map_err(|_| HeraldError::ImproperDistribution)?;
            let draw: f64 = dist.sample(rng);
            return Ok(draw as u64);
        }
        // inverse cdf against the normalized series
        let log_z = self.series_log_normalizer()?;
        let draw = rng.gen::<f64>();
        let mut acc = 0.0;
        for k in 0..SERIES_MAX_TERMS {
            acc += (self.log_weight(k as u64) - log_z).exp();
            if draw < acc {
                return Ok(k as u64);
            }
        }
        Err(HeraldError::General(String::from(
            "Poisson inverse-cdf sampling did not terminate",
        )))
    }
}

impl ExponentialFamily for Poisson {
    fn product(&self, other: &Self) -> Result<Self> {
        Ok(Poisson {
            log_rate: self.log_rate + other.log_rate,
            precision: self.precision + other.precision,
        })
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        Ok(Poisson {
            log_rate: self.log_rate - other.log_rate,
            precision: self.precision - other.precision,
        })
    }

    fn log_normalizer(&self) -> f64 {
        self.series_log_normalizer().unwrap_or(f64::INFINITY)
    }

    fn log_average_of(&self, other: &Self) -> Result<f64> {
        if self.is_uniform() || other.is_uniform() {
            return Ok(0.0);
        }
        let combined = self.product(other)?;
        let z = combined.series_log_normalizer()?;
        Ok(z - self.series_log_normalizer()? - other.series_log_normalizer()?)
    }

    fn is_proper(&self) -> bool {
        if self.log_rate.is_nan() || self.precision.is_nan() {
            return false;
        }
        self.precision > 0.0 || (self.precision == 0.0 && self.log_rate < 0.0)
    }

    fn is_uniform(&self) -> bool {
        self.log_rate == 0.0 && self.precision == 0.0
    }
}
