//! Operators for the factor `count ~ Poisson(rate)` with a Gamma belief over
//! the rate.
//!
//! An observed count is conjugate and exact. An uncertain count folds the
//! incoming count message into a series over counts: each count k contributes
//! a negative-binomial weight and conditional rate moments (a + k) / (b + 1),
//! and the tilted rate moments are the weighted averages. The series is
//! summed from zero for ordinary cavities and inside a window around its peak
//! once the cavity shape is large enough that the leading terms carry no
//! mass.

use crate::distributions::{ExponentialFamily, Gamma, Poisson};
use crate::projection::gamma_site;
use crate::stable::{ln_factorial, ln_gamma, log_sum_exp};
use crate::util::{HeraldError, Result};

use log::debug;
use rand::Rng;
use rand_distr::Distribution;

/// Above this cavity shape the tilted series is summed around its peak
/// instead of from zero.
const LARGE_SHAPE: f64 = 1e4;
const SERIES_LOG_TOLERANCE: f64 = 45.0;
const SERIES_MAX_TERMS: usize = 200_000;

/// Exact conjugate message to `rate` for an observed count: the likelihood
/// rate^k e^-rate as a Gamma-shaped message.
pub fn to_rate_observed(count: u64) -> Gamma {
    Gamma::new(count as f64 + 1.0, 1.0)
}

/// ln of the unnormalized weight of count k in the tilted series.
fn tilted_log_weight(count_msg: &Poisson, cavity: &Gamma, k: u64) -> f64 {
    let a = cavity.shape();
    let b = cavity.rate();
    let base = ln_gamma(a + k as f64) - k as f64 * (1.0 + b).ln() - ln_factorial(k);
    if k == 0 {
        base
    } else {
        base + k as f64 * count_msg.log_rate() - count_msg.precision() * ln_factorial(k)
    }
}

/// Sum the tilted series over a contiguous range of counts, returning
/// (ln Z, E[rate], E[rate^2]).
fn tilted_moments_over(
    count_msg: &Poisson,
    cavity: &Gamma,
    lo: u64,
    hi: u64,
) -> Result<(f64, f64, f64)> {
    let b1 = cavity.rate() + 1.0;
    let mut logs = Vec::new();
    let mut peak = f64::NEG_INFINITY;
    let mut peak_k = lo;
    let mut truncated = true;
    for k in lo..hi {
        let lw = tilted_log_weight(count_msg, cavity, k);
        if lw > peak {
            peak = lw;
            peak_k = k;
        }
        logs.push(lw);
        // once we are past the peak and far below it the tail is negligible
        if lw < peak - SERIES_LOG_TOLERANCE && k > peak_k {
            truncated = false;
            break;
        }
    }
    if peak == f64::NEG_INFINITY {
        return Err(HeraldError::ImproperDistribution);
    }
    if truncated && hi == SERIES_MAX_TERMS as u64 {
        return Err(HeraldError::General(String::from(
            "Poisson tilted series did not converge within the term limit",
        )));
    }

    let log_z = log_sum_exp(&logs);
    let mut m1 = 0.0;
    let mut m2 = 0.0;
    for (i, lw) in logs.iter().enumerate() {
        let k = lo + i as u64;
        let w = (lw - log_z).exp();
        let cond_mean = (cavity.shape() + k as f64) / b1;
        let cond_second = cond_mean * (cavity.shape() + k as f64 + 1.0) / b1;
        m1 += w * cond_mean;
        m2 += w * cond_second;
    }
    Ok((log_z, m1, m2))
}

/// Tilted rate moments under the cavity and an uncertain count message.
fn tilted_moments(count_msg: &Poisson, cavity: &Gamma) -> Result<(f64, f64, f64)> {
    if !cavity.is_proper() {
        return Err(HeraldError::ImproperDistribution);
    }
    // the series converges only while the count weights decay faster than
    // the negative-binomial tail grows
    let effective_precision = count_msg.precision() + 1.0;
    if effective_precision < 0.0
        || (effective_precision == 0.0
            && count_msg.log_rate() >= (1.0 + cavity.rate()).ln())
    {
        return Err(HeraldError::ImproperDistribution);
    }

    if cavity.shape() <= LARGE_SHAPE {
        return tilted_moments_over(count_msg, cavity, 0, SERIES_MAX_TERMS as u64);
    }

    // sharply peaked cavity: locate the peak by doubling, then sum a window
    debug!(
        "poisson tilted series using windowed summation (cavity shape {})",
        cavity.shape()
    );
    let mut best_k = 0u64;
    let mut best = tilted_log_weight(count_msg, cavity, 0);
    let mut k = 1u64;
    while k < u64::MAX / 2 {
        let lw = tilted_log_weight(count_msg, cavity, k);
        if lw > best {
            best = lw;
            best_k = k;
        } else if k > 4 * (best_k + 1) {
            break;
        }
        k *= 2;
    }
    let width = (10.0 * ((best_k as f64) + cavity.shape()).sqrt()) as u64 + 100;
    let lo = best_k.saturating_sub(width);
    let hi = best_k + width;
    tilted_moments_over(count_msg, cavity, lo, hi)
}

/// EP message to `rate` for an uncertain count.
pub fn to_rate(count_msg: &Poisson, cavity: &Gamma) -> Result<Gamma> {
    if count_msg.is_uniform() {
        return Ok(Gamma::uniform());
    }
    let (_, m1, m2) = tilted_moments(count_msg, cavity)?;
    gamma_site(cavity, m1, m2 - m1 * m1)
}

/// EP message to `count`: the negative-binomial marginal of the rate belief
/// projected onto a Poisson by matching the mean.
pub fn to_count(rate: &Gamma) -> Result<Poisson> {
    Poisson::standard(rate.mean()?)
}

/// Poisson log pmf at an observed count and point rate.
pub fn log_average_factor_at(count: u64, rate: f64) -> f64 {
    count as f64 * rate.ln() - rate - ln_factorial(count)
}

/// ln of the factor averaged over the rate belief at an observed count: the
/// negative-binomial marginal pmf.
pub fn log_average_factor(count: u64, rate: &Gamma) -> Result<f64> {
    if !rate.is_proper() {
        return Err(HeraldError::ImproperDistribution);
    }
    let a = rate.shape();
    let b = rate.rate();
    let k = count as f64;
    Ok(a * b.ln() - (a + k) * (1.0 + b).ln() + ln_gamma(a + k) - ln_gamma(a) - ln_factorial(count))
}

/// EP evidence contribution at an observed count.
pub fn log_evidence_ratio_observed(count: u64, rate: &Gamma) -> Result<f64> {
    log_average_factor(count, rate)
}

/// EP evidence contribution for an uncertain count message.
///
/// The tilted normalizer carries the count message unnormalized; restoring
/// the negative-binomial constant and the count normalizer turns it into
/// ln sum_k q(k) NB(k), from which the outgoing message's share is removed.
pub fn log_evidence_ratio(count_msg: &Poisson, rate: &Gamma) -> Result<f64> {
    if count_msg.is_uniform() {
        return Ok(0.0);
    }
    let count_log_z = count_msg.log_normalizer();
    if !count_log_z.is_finite() {
        return Err(HeraldError::ImproperDistribution);
    }
    let (log_z, _, _) = tilted_moments(count_msg, rate)?;
    let a = rate.shape();
    let b = rate.rate();
    let laf = log_z + a * b.ln() - a * (1.0 + b).ln() - ln_gamma(a) - count_log_z;
    Ok(laf - to_count(rate)?.log_average_of(count_msg)?)
}

/// VMP message to `rate`: pseudo-observation of the expected count.
pub fn to_rate_vmp(count_msg: &Poisson) -> Result<Gamma> {
    Ok(Gamma::new(count_msg.mean()? + 1.0, 1.0))
}

/// VMP message to `count`: a Poisson at the geometric-mean rate exp(E[ln r]).
pub fn to_count_vmp(rate: &Gamma) -> Result<Poisson> {
    Poisson::standard(rate.mean_log()?.exp())
}

/// VMP evidence bound contribution at an observed count:
/// k E[ln r] - E[r] - ln k!.
pub fn average_log_factor(count: u64, rate: &Gamma) -> Result<f64> {
    Ok(count as f64 * rate.mean_log()? - rate.mean()? - ln_factorial(count))
}

/// Gibbs draw of the count given a point rate.
pub fn sample_count<R: Rng + ?Sized>(rng: &mut R, rate: f64) -> Result<u64> {
    if rate < 0.0 || rate.is_nan() {
        return Err(HeraldError::InvalidParameter(format!(
            "Poisson rate must be nonnegative, got {}",
            rate
        )));
    }
    if rate == 0.0 {
        return Ok(0);
    }
    let dist = rand_distr::Poisson::new(rate).map_err(|_| HeraldError::ImproperDistribution)?;
    let draw: f64 = dist.sample(rng);
    Ok(draw as u64)
}

/// Gibbs draw of the rate from its full conditional given an observed count
/// and the Gamma prior.
pub fn sample_rate<R: Rng + ?Sized>(rng: &mut R, count: u64, prior: &Gamma) -> Result<f64> {
    Gamma::new(prior.shape() + count as f64, prior.rate() + 1.0).sample(rng)
}
