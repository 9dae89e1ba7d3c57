//! Operators for a two-level noisy channel: `sample ~ Bernoulli(pt)` when
//! `choice` is true and `sample ~ Bernoulli(pf)` when it is false, with fixed
//! leak probabilities `pt` and `pf`.
//!
//! Both arguments are boolean, the factor is linear in each argument's
//! sufficient statistics, and so the EP and VMP messages to `sample` coincide
//! with the mixture forms below; only the VMP message to `choice` differs
//! (geometric rather than arithmetic mixing).

use crate::distributions::{Bernoulli, ExponentialFamily};
use crate::stable::log_add_exp;
use crate::util::{HeraldError, Result};

use log::trace;
use rand::Rng;

/// Leak probabilities below this (or above one minus this) force the
/// log-domain branch of `to_choice`.
const FAST_PATH_MARGIN: f64 = 1e-10;

#[derive(Clone, Copy, Debug)]
pub struct BernoulliFromBool {
    prob_if_true: f64,
    prob_if_false: f64,
}

impl BernoulliFromBool {
    pub fn new(prob_if_true: f64, prob_if_false: f64) -> Result<Self> {
        for &p in &[prob_if_true, prob_if_false] {
            if !(0.0..=1.0).contains(&p) {
                return Err(HeraldError::InvalidParameter(format!(
                    "channel probability must lie in [0, 1], got {}",
                    p
                )));
            }
        }
        Ok(BernoulliFromBool {
            prob_if_true,
            prob_if_false,
        })
    }

    pub fn prob_if_true(&self) -> f64 {
        self.prob_if_true
    }

    pub fn prob_if_false(&self) -> f64 {
        self.prob_if_false
    }

    /// ln P(sample = true | choice) for a point choice.
    fn log_leak(&self, choice: bool) -> f64 {
        if choice {
            self.prob_if_true.ln()
        } else {
            self.prob_if_false.ln()
        }
    }

    /// ln P(sample = false | choice) for a point choice.
    fn log_leak_complement(&self, choice: bool) -> f64 {
        if choice {
            (-self.prob_if_true).ln_1p()
        } else {
            (-self.prob_if_false).ln_1p()
        }
    }

    /// Message to `sample`: the mixture of the two leaks under the choice
    /// belief. Identical under EP and VMP.
    pub fn to_sample(&self, choice: &Bernoulli) -> Result<Bernoulli> {
        let c = choice.prob_true();
        Bernoulli::from_prob_true(c * self.prob_if_true + (1.0 - c) * self.prob_if_false)
    }

    /// Message to `choice`: the likelihood ratio of the two channel settings
    /// under the sample belief.
    ///
    /// The fast path works in probability space. When a leak or the sample
    /// belief sits within `FAST_PATH_MARGIN` of deterministic, the products
    /// underflow and the ratio is formed in log space instead.
    pub fn to_choice(&self, sample: &Bernoulli) -> Result<Bernoulli> {
        let extreme = sample.is_point_mass()
            || [self.prob_if_true, self.prob_if_false]
                .iter()
                .any(|&p| p < FAST_PATH_MARGIN || p > 1.0 - FAST_PATH_MARGIN);

        if !extreme {
            let s = sample.prob_true();
            let if_true = s * self.prob_if_true + (1.0 - s) * (1.0 - self.prob_if_true);
            let if_false = s * self.prob_if_false + (1.0 - s) * (1.0 - self.prob_if_false);
            return Ok(Bernoulli::from_log_odds(if_true.ln() - if_false.ln()));
        }

        trace!("to_choice taking the log-domain branch");
        let lp_true = sample.log_prob(true);
        let lp_false = sample.log_prob(false);
        let if_true = log_add_exp(
            lp_true + self.log_leak(true),
            lp_false + self.log_leak_complement(true),
        );
        let if_false = log_add_exp(
            lp_true + self.log_leak(false),
            lp_false + self.log_leak_complement(false),
        );
        if if_true == f64::NEG_INFINITY && if_false == f64::NEG_INFINITY {
            // the observed sample is impossible under both channel settings
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(Bernoulli::from_log_odds(if_true - if_false))
    }

    /// ln of the factor averaged over both beliefs.
    pub fn log_average_factor(&self, sample: &Bernoulli, choice: &Bernoulli) -> Result<f64> {
        let lp_true = sample.log_prob(true);
        let lp_false = sample.log_prob(false);
        let if_true = log_add_exp(
            lp_true + self.log_leak(true),
            lp_false + self.log_leak_complement(true),
        );
        let if_false = log_add_exp(
            lp_true + self.log_leak(false),
            lp_false + self.log_leak_complement(false),
        );
        Ok(log_add_exp(
            choice.log_prob(true) + if_true,
            choice.log_prob(false) + if_false,
        ))
    }

    /// EP evidence contribution.
    pub fn log_evidence_ratio(&self, sample: &Bernoulli, choice: &Bernoulli) -> Result<f64> {
        Ok(self.log_average_factor(sample, choice)?
            - self.to_sample(choice)?.log_average_of(sample)?)
    }

    /// VMP message to `choice`: geometric mixing of the channel likelihoods
    /// under the sample belief.
    pub fn to_choice_vmp(&self, sample: &Bernoulli) -> Bernoulli {
        let s = sample.prob_true();
        let if_true = s * self.log_leak(true) + (1.0 - s) * self.log_leak_complement(true);
        let if_false = s * self.log_leak(false) + (1.0 - s) * self.log_leak_complement(false);
        Bernoulli::from_log_odds(if_true - if_false)
    }

    /// VMP message to `sample`.
    pub fn to_sample_vmp(&self, choice: &Bernoulli) -> Bernoulli {
        let c = choice.prob_true();
        let log_odds = c * (self.log_leak(true) - self.log_leak_complement(true))
            + (1.0 - c) * (self.log_leak(false) - self.log_leak_complement(false));
        Bernoulli::from_log_odds(log_odds)
    }

    /// VMP evidence bound contribution.
    pub fn average_log_factor(&self, sample: &Bernoulli, choice: &Bernoulli) -> f64 {
        let s = sample.prob_true();
        let c = choice.prob_true();
        c * (s * self.log_leak(true) + (1.0 - s) * self.log_leak_complement(true))
            + (1.0 - c) * (s * self.log_leak(false) + (1.0 - s) * self.log_leak_complement(false))
    }

    /// Gibbs draw of the sample given a point choice.
    pub fn sample_sample<R: Rng + ?Sized>(&self, rng: &mut R, choice: bool) -> bool {
        let p = if choice {
            self.prob_if_true
        } else {
            self.prob_if_false
        };
        rng.gen::<f64>() < p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn channel() -> BernoulliFromBool {
        BernoulliFromBool::new(0.9, 0.2).unwrap()
    }

    #[test]
    fn construction_validates() {
        assert!(BernoulliFromBool::new(1.5, 0.2).is_err());
        assert!(BernoulliFromBool::new(0.5, -0.1).is_err());
    }

    #[test]
    fn to_sample_mixes_leaks() {
        let ch = channel();
        let choice = Bernoulli::from_prob_true(0.5).unwrap();
        let msg = ch.to_sample(&choice).unwrap();
        assert_abs_diff_eq!(msg.prob_true(), 0.55, epsilon = 1e-12);

        // observed choices collapse onto the leaks themselves
        let msg = ch.to_sample(&Bernoulli::point_mass(true)).unwrap();
        assert_abs_diff_eq!(msg.prob_true(), 0.9, epsilon = 1e-12);
    }

    #[test]
    fn to_choice_observed_sample_is_likelihood_ratio() {
        let ch = channel();
        let msg = ch.to_choice(&Bernoulli::point_mass(true)).unwrap();
        assert_abs_diff_eq!(msg.log_odds(), (0.9f64 / 0.2).ln(), epsilon = 1e-12);

        let msg = ch.to_choice(&Bernoulli::point_mass(false)).unwrap();
        assert_abs_diff_eq!(msg.log_odds(), (0.1f64 / 0.8).ln(), epsilon = 1e-12);
    }

    #[test]
    fn fast_and_log_branches_agree() {
        // an interior configuration evaluated both ways: force the slow path
        // by observing the sample, then compare with the mixture computed on
        // a nearly observed sample through the fast path
        let ch = channel();
        let exact = ch.to_choice(&Bernoulli::point_mass(true)).unwrap();
        let nearly = ch
            .to_choice(&Bernoulli::from_prob_true(1.0 - 1e-13).unwrap())
            .unwrap();
        assert_abs_diff_eq!(exact.log_odds(), nearly.log_odds(), epsilon = 1e-9);
    }

    #[test]
    fn extreme_leak_survives_in_log_space() {
        // pt so small the probability-space product would underflow to a zero
        // ratio; the log branch keeps the exact odds
        let ch = BernoulliFromBool::new(1e-300, 0.5).unwrap();
        let msg = ch.to_choice(&Bernoulli::point_mass(true)).unwrap();
        assert_abs_diff_eq!(
            msg.log_odds(),
            (1e-300f64).ln() - 0.5f64.ln(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn impossible_observation_is_an_error() {
        let ch = BernoulliFromBool::new(0.0, 0.0).unwrap();
        assert!(ch.to_choice(&Bernoulli::point_mass(true)).is_err());
    }

    #[test]
    fn evidence_factorizes_for_observed_arguments() {
        let ch = channel();
        let lp = ch
            .log_average_factor(&Bernoulli::point_mass(false), &Bernoulli::point_mass(true))
            .unwrap();
        assert_abs_diff_eq!(lp, 0.1f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn evidence_ratio_vanishes_when_only_choice_is_soft() {
        // with the outgoing message to sample computed from the same choice
        // belief, the observed-sample evidence ratio collapses to zero
        let ch = channel();
        let choice = Bernoulli::from_prob_true(0.3).unwrap();
        let sample = Bernoulli::point_mass(true);
        let ler = ch.log_evidence_ratio(&sample, &choice).unwrap();
        assert_abs_diff_eq!(ler, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn vmp_choice_message_uses_expected_log_likelihoods() {
        let ch = channel();
        let sample = Bernoulli::from_prob_true(0.75).unwrap();
        let msg = ch.to_choice_vmp(&sample);
        let expected = 0.75 * (0.9f64.ln() - 0.2f64.ln()) + 0.25 * (0.1f64.ln() - 0.8f64.ln());
        assert_abs_diff_eq!(msg.log_odds(), expected, epsilon = 1e-12);
    }

    #[test]
    fn gibbs_draws_respect_the_point_choice() {
        let ch = BernoulliFromBool::new(1.0, 0.0).unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            assert!(ch.sample_sample(&mut rng, true));
            assert!(!ch.sample_sample(&mut rng, false));
        }
    }
}
