//! Operators for the factor `sample ~ Bernoulli(prob)` with a Beta belief
//! over `prob`.
//!
//! The pair is conjugate, so the message to `prob` is exact when the sample is
//! observed; only an uncertain sample needs the moment-matching projection.

use crate::distributions::{Bernoulli, Beta, ExponentialFamily};
use crate::projection::beta_site;
use crate::stable::log_add_exp;
use crate::util::Result;

use rand::Rng;

/// EP message to `sample`: a Bernoulli at the mean of the Beta belief.
pub fn to_sample(prob: &Beta) -> Result<Bernoulli> {
    Bernoulli::from_prob_true(prob.mean()?)
}

/// EP message to `prob`.
///
/// The observed (point-mass) case is the exact conjugate likelihood. The
/// uncertain case moment-matches the tilted distribution
/// `Beta(p) * (s p + (1 - s)(1 - p))` and divides out the cavity; the
/// branches exist because the general formula cancels catastrophically as s
/// approaches 0 or 1.
pub fn to_prob(sample: &Bernoulli, prob: &Beta) -> Result<Beta> {
    if sample.is_uniform() {
        return Ok(Beta::uniform());
    }
    if sample.is_point_mass() {
        // likelihood p or (1 - p) as a Beta-shaped message
        return Ok(if sample.prob_true() == 1.0 {
            Beta::new(2.0, 1.0)
        } else {
            Beta::new(1.0, 2.0)
        });
    }

    let s = sample.prob_true();
    let alpha = prob.true_count();
    let total = alpha + prob.false_count();

    // raw moments of the Beta cavity
    let m1 = alpha / total;
    let m2 = m1 * (alpha + 1.0) / (total + 1.0);
    let m3 = m2 * (alpha + 2.0) / (total + 2.0);

    let z = s * m1 + (1.0 - s) * (1.0 - m1);
    let tilted_mean = (s * m2 + (1.0 - s) * (m1 - m2)) / z;
    let tilted_second = (s * m3 + (1.0 - s) * (m2 - m3)) / z;
    let tilted_variance = tilted_second - tilted_mean * tilted_mean;

    beta_site(prob, tilted_mean, tilted_variance)
}

/// ln of the factor averaged over both beliefs: ln(s E[p] + (1-s)(1-E[p])).
pub fn log_average_factor(sample: &Bernoulli, prob: &Beta) -> Result<f64> {
    let m = prob.mean()?;
    // stay in log space so observed samples with extreme means stay exact
    Ok(log_add_exp(
        sample.log_prob(true) + m.ln(),
        sample.log_prob(false) + (-m).ln_1p(),
    ))
}

/// EP evidence contribution: the average factor minus the mass the outgoing
/// sample message already accounts for.
pub fn log_evidence_ratio(sample: &Bernoulli, prob: &Beta) -> Result<f64> {
    Ok(log_average_factor(sample, prob)? - to_sample(prob)?.log_average_of(sample)?)
}

/// VMP message to `sample`: log odds E[ln p] - E[ln(1 - p)].
pub fn to_sample_vmp(prob: &Beta) -> Result<Bernoulli> {
    Ok(Bernoulli::from_log_odds(
        prob.mean_log()? - prob.mean_log_complement()?,
    ))
}

/// VMP message to `prob`: soft counts from the sample belief.
pub fn to_prob_vmp(sample: &Bernoulli) -> Beta {
    let s = sample.prob_true();
    Beta::new(1.0 + s, 2.0 - s)
}

/// VMP evidence bound contribution: E[x] E[ln p] + E[1 - x] E[ln(1 - p)].
pub fn average_log_factor(sample: &Bernoulli, prob: &Beta) -> Result<f64> {
    let s = sample.prob_true();
    Ok(s * prob.mean_log()? + (1.0 - s) * prob.mean_log_complement()?)
}

/// Gibbs draw of the sample given a point value of the probability.
pub fn sample_sample<R: Rng + ?Sized>(rng: &mut R, prob: f64) -> bool {
    rng.gen::<f64>() < prob
}

/// Gibbs draw of the probability from its full conditional given an observed
/// sample and the Beta prior.
pub fn sample_prob<R: Rng + ?Sized>(rng: &mut R, sample: bool, prior: &Beta) -> Result<f64> {
    let conditional = if sample {
        Beta::new(prior.true_count() + 1.0, prior.false_count())
    } else {
        Beta::new(prior.true_count(), prior.false_count() + 1.0)
    };
    conditional.sample(rng)
}
