//! A Beta belief over a probability, stored as pseudo-counts.
//!
//! The counts (alpha, beta) are the natural parameters shifted by one, so a
//! product of beliefs adds counts and subtracts one, exactly the bookkeeping
//! a conjugate update performs.

use super::ExponentialFamily;
use crate::stable::{digamma, ln_beta};
use crate::util::{HeraldError, Result};

use rand::Rng;
use rand_distr::Distribution;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Beta {
    true_count: f64,
    false_count: f64,
}

impl Beta {
    /// The uniform belief Beta(1, 1).
    pub fn uniform() -> Self {
        Beta {
            true_count: 1.0,
            false_count: 1.0,
        }
    }

    pub fn new(true_count: f64, false_count: f64) -> Self {
        Beta {
            true_count,
            false_count,
        }
    }

    pub fn true_count(&self) -> f64 {
        self.true_count
    }

    pub fn false_count(&self) -> f64 {
        self.false_count
    }

    fn total(&self) -> f64 {
        self.true_count + self.false_count
    }

    /// E[p]
    pub fn mean(&self) -> Result<f64> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(self.true_count / self.total())
    }

    pub fn variance(&self) -> Result<f64> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        let s = self.total();
        Ok(self.true_count * self.false_count / (s * s * (s + 1.0)))
    }

    /// E[ln p], the sufficient-statistic expectation VMP messages need.
    pub fn mean_log(&self) -> Result<f64> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(digamma(self.true_count) - digamma(self.total()))
    }

    /// E[ln(1 - p)]
    pub fn mean_log_complement(&self) -> Result<f64> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(digamma(self.false_count) - digamma(self.total()))
    }

    /// Moment-matching projection: the Beta with the given mean and variance.
    ///
    /// # Errors
    /// * `HeraldError::ImproperDistribution` when no Beta has those moments
    ///   (variance must be positive and below mean * (1 - mean))
    pub fn from_mean_and_variance(mean: f64, variance: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&mean) || variance <= 0.0 {
            return Err(HeraldError::ImproperDistribution);
        }
        let total = mean * (1.0 - mean) / variance - 1.0;
        if total <= 0.0 || !total.is_finite() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(Beta {
            true_count: mean * total,
            false_count: (1.0 - mean) * total,
        })
    }

    /// ln p(x) of the density at x in (0, 1).
    pub fn log_prob(&self, x: f64) -> f64 {
        (self.true_count - 1.0) * x.ln() + (self.false_count - 1.0) * (-x).ln_1p()
            - ln_beta(self.true_count, self.false_count)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        let dist = rand_distr::Beta::new(self.true_count, self.false_count)
            .map_err(|_| HeraldError::ImproperDistribution)?;
        Ok(dist.sample(rng))
    }
}

impl ExponentialFamily for Beta {
    fn product(&self, other: &Self) -> Result<Self> {
        Ok(Beta {
            true_count: self.true_count + other.true_count - 1.0,
            false_count: self.false_count + other.false_count - 1.0,
        })
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        Ok(Beta {
            true_count: self.true_count - other.true_count + 1.0,
            false_count: self.false_count - other.false_count + 1.0,
        })
    }

    fn log_normalizer(&self) -> f64 {
        ln_beta(self.true_count, self.false_count)
    }

    fn log_average_of(&self, other: &Self) -> Result<f64> {
        let combined = self.product(other)?;
        if !combined.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(combined.log_normalizer() - self.log_normalizer() - other.log_normalizer())
    }

    fn is_proper(&self) -> bool {
        self.true_count > 0.0 && self.false_count > 0.0
    }

    fn is_uniform(&self) -> bool {
        self.true_count == 1.0 && self.false_count == 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn moments() {
        let b = Beta::new(3.0, 7.0);
        assert_abs_diff_eq!(b.mean().unwrap(), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(b.variance().unwrap(), 0.21 / 11.0, epsilon = 1e-12);
    }

    #[test]
    fn product_is_conjugate_bookkeeping() {
        // Beta(2, 1) x Beta(1, 3) keeps the combined pseudo-counts
        let a = Beta::new(2.0, 1.0);
        let b = Beta::new(1.0, 3.0);
        let prod = a.product(&b).unwrap();
        assert_eq!(prod, Beta::new(2.0, 3.0));

        let back = prod.ratio(&b).unwrap();
        assert_eq!(back, a);

        // uniform is the unit
        assert_eq!(a.product(&Beta::uniform()).unwrap(), a);
    }

    #[test]
    fn moment_matching_round_trip() {
        let b = Beta::new(4.5, 2.5);
        let matched =
            Beta::from_mean_and_variance(b.mean().unwrap(), b.variance().unwrap()).unwrap();
        assert_abs_diff_eq!(matched.true_count(), 4.5, epsilon = 1e-9);
        assert_abs_diff_eq!(matched.false_count(), 2.5, epsilon = 1e-9);

        // a variance at the Bernoulli limit has no Beta representation
        assert!(Beta::from_mean_and_variance(0.5, 0.25).is_err());
        assert!(Beta::from_mean_and_variance(0.5, 0.3).is_err());
    }

    #[test]
    fn mean_log_matches_digamma_identity() {
        let b = Beta::new(2.0, 5.0);
        // digamma(2) - digamma(7)
        let expected = digamma(2.0) - digamma(7.0);
        assert_abs_diff_eq!(b.mean_log().unwrap(), expected, epsilon = 1e-12);
        // complements swap the roles
        assert_abs_diff_eq!(
            b.mean_log_complement().unwrap(),
            digamma(5.0) - digamma(7.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn log_average_of_beta_bernoulli_conjugacy() {
        // int Beta(p; 2, 3) * Beta(p; 3, 1) dp via the partition ratio
        let a = Beta::new(2.0, 3.0);
        let b = Beta::new(3.0, 1.0);
        let expected = ln_beta(4.0, 3.0) - ln_beta(2.0, 3.0) - ln_beta(3.0, 1.0);
        assert_abs_diff_eq!(a.log_average_of(&b).unwrap(), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(
            a.log_average_of(&b).unwrap(),
            b.log_average_of(&a).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn improper_moments_are_errors() {
        let improper = Beta::new(0.5, 2.0).ratio(&Beta::new(2.0, 1.0)).unwrap();
        assert!(!improper.is_proper());
        assert_eq!(improper.mean(), Err(HeraldError::ImproperDistribution));
        assert_eq!(improper.variance(), Err(HeraldError::ImproperDistribution));
    }
}
