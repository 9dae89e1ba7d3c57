//! A Bernoulli belief over a boolean variable, stored as log odds.
//!
//! The log-odds form makes products and ratios of beliefs plain additions and
//! subtractions, and stays exact for point masses (infinite log odds) where
//! the probability form would round.

use super::ExponentialFamily;
use crate::stable::{log_add_exp, logit, sigmoid};
use crate::util::{HeraldError, Result};

use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bernoulli {
    /// ln(p / (1 - p))
    log_odds: f64,
}

impl Bernoulli {
    /// The uniform belief: even odds.
    pub fn uniform() -> Self {
        Bernoulli { log_odds: 0.0 }
    }

    pub fn from_log_odds(log_odds: f64) -> Self {
        Bernoulli { log_odds }
    }

    /// Construct from P(true).
    ///
    /// # Errors
    /// * `HeraldError::InvalidParameter` unless 0 <= p <= 1
    pub fn from_prob_true(p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(HeraldError::InvalidParameter(format!(
                "Bernoulli probability must lie in [0, 1], got {}",
                p
            )));
        }
        Ok(Bernoulli { log_odds: logit(p) })
    }

    /// The belief that places all mass on `value`.
    pub fn point_mass(value: bool) -> Self {
        Bernoulli {
            log_odds: if value {
                f64::INFINITY
            } else {
                f64::NEG_INFINITY
            },
        }
    }

    pub fn log_odds(&self) -> f64 {
        self.log_odds
    }

    pub fn prob_true(&self) -> f64 {
        sigmoid(self.log_odds)
    }

    pub fn mean(&self) -> f64 {
        self.prob_true()
    }

    pub fn variance(&self) -> f64 {
        let p = self.prob_true();
        p * (1.0 - p)
    }

    pub fn is_point_mass(&self) -> bool {
        self.log_odds.is_infinite()
    }

    /// ln P(x) under this belief.
    pub fn log_prob(&self, x: bool) -> f64 {
        // ln sigmoid(t) = -ln(1 + e^-t)
        if x {
            -log_add_exp(0.0, -self.log_odds)
        } else {
            -log_add_exp(0.0, self.log_odds)
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.prob_true()
    }
}

impl ExponentialFamily for Bernoulli {
    fn product(&self, other: &Self) -> Result<Self> {
        if self.is_point_mass() && other.is_point_mass() && self.log_odds != other.log_odds {
            // all mass on true times all mass on false leaves nothing
            return Err(HeraldError::ImproperDistribution);
        }
        if self.is_point_mass() {
            return Ok(*self);
        }
        if other.is_point_mass() {
            return Ok(*other);
        }
        Ok(Bernoulli {
            log_odds: self.log_odds + other.log_odds,
        })
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        if other.is_point_mass() {
            if self.log_odds == other.log_odds {
                // point mass over itself carries no information
                return Ok(Bernoulli::uniform());
            }
            return Err(HeraldError::DivideByZero);
        }
        if self.is_point_mass() {
            return Ok(*self);
        }
        Ok(Bernoulli {
            log_odds: self.log_odds - other.log_odds,
        })
    }

    fn log_normalizer(&self) -> f64 {
        // A(theta) = ln(1 + e^theta)
        log_add_exp(0.0, self.log_odds)
    }

    fn log_average_of(&self, other: &Self) -> Result<f64> {
        if self.is_point_mass() {
            return Ok(other.log_prob(self.log_odds == f64::INFINITY));
        }
        if other.is_point_mass() {
            return Ok(self.log_prob(other.log_odds == f64::INFINITY));
        }
        // ln(p1 q1 + p0 q0) = A(t1 + t2) - A(t1) - A(t2)
        let combined = Bernoulli {
            log_odds: self.log_odds + other.log_odds,
        };
        Ok(combined.log_normalizer() - self.log_normalizer() - other.log_normalizer())
    }

    fn is_proper(&self) -> bool {
        !self.log_odds.is_nan()
    }

    fn is_uniform(&self) -> bool {
        self.log_odds == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn prob_round_trip() {
        let b = Bernoulli::from_prob_true(0.3).unwrap();
        assert_abs_diff_eq!(b.prob_true(), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(b.variance(), 0.21, epsilon = 1e-12);

        assert!(Bernoulli::from_prob_true(1.2).is_err());
        assert!(Bernoulli::from_prob_true(-0.1).is_err());
    }

    #[test]
    fn product_multiplies_odds() {
        let a = Bernoulli::from_prob_true(0.8).unwrap();
        let b = Bernoulli::from_prob_true(0.8).unwrap();
        let prod = a.product(&b).unwrap();

        // P(true) proportional to 0.64 vs 0.04
        assert_abs_diff_eq!(prod.prob_true(), 0.64 / 0.68, epsilon = 1e-12);

        // uniform is the unit
        let u = Bernoulli::uniform();
        assert_abs_diff_eq!(
            a.product(&u).unwrap().log_odds(),
            a.log_odds(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn ratio_undoes_product() {
        let a = Bernoulli::from_log_odds(0.7);
        let b = Bernoulli::from_log_odds(-1.2);
        let recovered = a.product(&b).unwrap().ratio(&b).unwrap();
        assert_abs_diff_eq!(recovered.log_odds(), a.log_odds(), epsilon = 1e-12);
    }

    #[test]
    fn point_mass_rules() {
        let t = Bernoulli::point_mass(true);
        let f = Bernoulli::point_mass(false);
        let soft = Bernoulli::from_prob_true(0.4).unwrap();

        assert!(t.product(&f).is_err());
        assert_eq!(t.product(&soft).unwrap(), t);
        assert!(t.ratio(&t).unwrap().is_uniform());
        assert_eq!(soft.ratio(&t), Err(HeraldError::DivideByZero));
    }

    #[test]
    fn log_average_is_symmetric_mixture_mass() {
        let a = Bernoulli::from_prob_true(0.9).unwrap();
        let b = Bernoulli::from_prob_true(0.25).unwrap();

        let expected = (0.9f64 * 0.25 + 0.1 * 0.75).ln();
        assert_abs_diff_eq!(a.log_average_of(&b).unwrap(), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(
            a.log_average_of(&b).unwrap(),
            b.log_average_of(&a).unwrap(),
            epsilon = 1e-12
        );

        // against a point mass it is the log probability of that outcome
        let t = Bernoulli::point_mass(true);
        assert_abs_diff_eq!(a.log_average_of(&t).unwrap(), 0.9f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn log_prob_extremes_stay_finite_where_they_should() {
        let near_sure = Bernoulli::from_log_odds(40.0);
        assert!(near_sure.log_prob(true) > -1e-12);
        assert_abs_diff_eq!(near_sure.log_prob(false), -40.0, epsilon = 1e-9);
    }
}
