//! Operators for the factor `counts ~ Multinomial(n, probs)` with a Dirichlet
//! belief over the probability vector.
//!
//! Counts are observed in every use this factor supports; the interesting
//! messages flow toward `probs`, and the evidence is the Dirichlet-multinomial
//! (Polya) marginal.

use crate::distributions::{Dirichlet, ExponentialFamily};
use crate::stable::{ln_factorial, ln_gamma};
use crate::util::{HeraldError, Result};

use ndarray::Array1;
use rand::Rng;
use rand_distr::Distribution;

/// ln of the multinomial coefficient n! / prod_i x_i!.
fn ln_multinomial_coefficient(counts: &[u64]) -> f64 {
    let n: u64 = counts.iter().sum();
    ln_factorial(n) - counts.iter().map(|&x| ln_factorial(x)).sum::<f64>()
}

/// Message to `probs` for observed counts: the conjugate Dirichlet update.
/// Identical under EP and VMP.
pub fn to_probs(counts: &[u64], probs: &Dirichlet) -> Result<Dirichlet> {
    if counts.len() != probs.len() {
        return Err(HeraldError::DimensionMismatch);
    }
    Ok(Dirichlet::new(
        counts.iter().map(|&x| x as f64 + 1.0).collect(),
    ))
}

/// Multinomial log pmf at observed counts and a point probability vector.
pub fn log_average_factor_at(counts: &[u64], probs: &Array1<f64>) -> Result<f64> {
    if counts.len() != probs.len() {
        return Err(HeraldError::DimensionMismatch);
    }
    let mut acc = ln_multinomial_coefficient(counts);
    for (&x, &p) in counts.iter().zip(probs.iter()) {
        if x > 0 {
            acc += x as f64 * p.ln();
        }
    }
    Ok(acc)
}

/// ln of the factor averaged over the probs belief: the Polya log pmf.
pub fn log_average_factor(counts: &[u64], probs: &Dirichlet) -> Result<f64> {
    if counts.len() != probs.len() {
        return Err(HeraldError::DimensionMismatch);
    }
    if !probs.is_proper() {
        return Err(HeraldError::ImproperDistribution);
    }
    let n: u64 = counts.iter().sum();
    let total = probs.total();
    let mut acc = ln_multinomial_coefficient(counts) + ln_gamma(total)
        - ln_gamma(total + n as f64);
    for (&x, &alpha) in counts.iter().zip(probs.pseudo_counts().iter()) {
        acc += ln_gamma(alpha + x as f64) - ln_gamma(alpha);
    }
    Ok(acc)
}

/// EP evidence contribution: counts are observed, so nothing is double
/// counted and the ratio is the average factor itself.
pub fn log_evidence_ratio(counts: &[u64], probs: &Dirichlet) -> Result<f64> {
    log_average_factor(counts, probs)
}

/// VMP evidence bound contribution: ln coeff + sum_i x_i E[ln p_i].
pub fn average_log_factor(counts: &[u64], probs: &Dirichlet) -> Result<f64> {
    if counts.len() != probs.len() {
        return Err(HeraldError::DimensionMismatch);
    }
    let mean_log = probs.mean_log()?;
    let mut acc = ln_multinomial_coefficient(counts);
    for (&x, &ml) in counts.iter().zip(mean_log.iter()) {
        acc += x as f64 * ml;
    }
    Ok(acc)
}

/// Gibbs draw of the counts given the trial count and a point probability
/// vector: sequential binomial thinning of the remaining trials.
pub fn sample_counts<R: Rng + ?Sized>(
    rng: &mut R,
    trials: u64,
    probs: &Array1<f64>,
) -> Result<Vec<u64>> {
    if probs.iter().any(|&p| p < 0.0 || p.is_nan()) {
        return Err(HeraldError::InvalidParameter(String::from(
            "probability vector entries must be nonnegative",
        )));
    }
    let mut remaining_trials = trials;
    let mut remaining_mass: f64 = probs.sum();
    if remaining_mass <= 0.0 {
        return Err(HeraldError::DivideByZero);
    }

    let mut counts = Vec::with_capacity(probs.len());
    for &p in probs.iter() {
        if remaining_trials == 0 || remaining_mass <= 0.0 {
            counts.push(0);
            continue;
        }
        let share = (p / remaining_mass).clamp(0.0, 1.0);
        let draw = if share >= 1.0 {
            remaining_trials
        } else {
            let binomial = rand_distr::Binomial::new(remaining_trials, share)
                .map_err(|_| HeraldError::ImproperDistribution)?;
            binomial.sample(rng)
        };
        counts.push(draw);
        remaining_trials -= draw;
        remaining_mass -= p;
    }

    // rounding can leave trials unassigned; they belong to the final bin
    if remaining_trials > 0 {
        if let Some(last) = counts.last_mut() {
            *last += remaining_trials;
        }
    }
    Ok(counts)
}

/// Gibbs draw of the probability vector from its full conditional given
/// observed counts and the Dirichlet prior.
pub fn sample_probs<R: Rng + ?Sized>(
    rng: &mut R,
    counts: &[u64],
    prior: &Dirichlet,
) -> Result<Array1<f64>> {
    let conditional = prior.product(&to_probs(counts, prior)?)?;
    conditional.sample(rng)
}
