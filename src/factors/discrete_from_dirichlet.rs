//! Operators for the factor `sample ~ Discrete(probs)` with a Dirichlet
//! belief over the probability vector.
//!
//! Conjugate, so an observed sample yields the exact one-count Dirichlet
//! message. An uncertain sample moment-matches the tilted mean and raises the
//! total concentration by the single observation, which reproduces the exact
//! update in the observed limit.

use crate::distributions::{Dirichlet, Discrete, ExponentialFamily};
use crate::util::{HeraldError, Result};

use ndarray::Array1;
use rand::Rng;

/// EP message to `sample`: the mean of the Dirichlet belief.
pub fn to_sample(probs: &Dirichlet) -> Result<Discrete> {
    let mean = probs.mean()?;
    Ok(Discrete::from_log_probs(mean.mapv(f64::ln)))
}

/// EP message to `probs`.
pub fn to_probs(sample: &Discrete, probs: &Dirichlet) -> Result<Dirichlet> {
    if sample.len() != probs.len() {
        return Err(HeraldError::DimensionMismatch);
    }
    if sample.is_uniform() {
        return Ok(Dirichlet::uniform(probs.len()));
    }

    let q = sample.probs()?;
    let alpha = probs.pseudo_counts();
    let total = probs.total();
    if !probs.is_proper() {
        return Err(HeraldError::ImproperDistribution);
    }

    // w = sum_j q_j alpha_j; the tilted mean has a closed form because the
    // factor is linear in the probability vector
    let w = q.dot(alpha);
    if w == 0.0 {
        return Err(HeraldError::ImproperDistribution);
    }
    let tilted_mean = Array1::from_iter(
        alpha
            .iter()
            .zip(q.iter())
            .map(|(&a, &qi)| a * (w + qi) / ((total + 1.0) * w)),
    );

    let projected = Dirichlet::from_mean_and_total(&tilted_mean, total + 1.0)?;
    projected.ratio(probs)
}

/// ln of the factor averaged over both beliefs: ln sum_i q_i E[p_i].
pub fn log_average_factor(sample: &Discrete, probs: &Dirichlet) -> Result<f64> {
    if sample.len() != probs.len() {
        return Err(HeraldError::DimensionMismatch);
    }
    let q = sample.probs()?;
    let mean = probs.mean()?;
    Ok(q.dot(&mean).ln())
}

/// EP evidence contribution.
pub fn log_evidence_ratio(sample: &Discrete, probs: &Dirichlet) -> Result<f64> {
    Ok(log_average_factor(sample, probs)? - to_sample(probs)?.log_average_of(sample)?)
}

/// VMP message to `sample`: weights exp(E[ln p_i]).
pub fn to_sample_vmp(probs: &Dirichlet) -> Result<Discrete> {
    Ok(Discrete::from_log_probs(probs.mean_log()?))
}

/// VMP message to `probs`: the sample belief as soft counts.
pub fn to_probs_vmp(sample: &Discrete) -> Result<Dirichlet> {
    let q = sample.probs()?;
    Ok(Dirichlet::new(q + 1.0))
}

/// VMP evidence bound contribution: sum_i q_i E[ln p_i].
pub fn average_log_factor(sample: &Discrete, probs: &Dirichlet) -> Result<f64> {
    if sample.len() != probs.len() {
        return Err(HeraldError::DimensionMismatch);
    }
    let q = sample.probs()?;
    let mean_log = probs.mean_log()?;
    Ok(q.dot(&mean_log))
}

/// Gibbs draw of the sample given a point probability vector.
pub fn sample_sample<R: Rng + ?Sized>(rng: &mut R, probs: &Array1<f64>) -> Result<usize> {
    Discrete::from_log_probs(probs.mapv(f64::ln)).sample(rng)
}

/// Gibbs draw of the probability vector from its full conditional given an
/// observed sample and the Dirichlet prior.
pub fn sample_probs<R: Rng + ?Sized>(
    rng: &mut R,
    sample: usize,
    prior: &Dirichlet,
) -> Result<Array1<f64>> {
    if sample >= prior.len() {
        return Err(HeraldError::InvalidParameter(format!(
            "observed value {} outside domain of size {}",
            sample,
            prior.len()
        )));
    }
    let mut counts = prior.pseudo_counts().clone();
    counts[sample] += 1.0;
    Dirichlet::new(counts).sample(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn to_sample_is_mean() {
        let probs = Dirichlet::new(array![1.0, 2.0, 7.0]);
        let msg = to_sample(&probs).unwrap();
        assert_abs_diff_eq!(msg.prob(0).unwrap(), 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(msg.prob(2).unwrap(), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn observed_sample_gives_conjugate_update() {
        let prior = Dirichlet::new(array![2.0, 1.0, 1.5]);
        let msg = to_probs(&Discrete::point_mass(0, 3), &prior).unwrap();
        let posterior = prior.product(&msg).unwrap();
        for (a, b) in posterior
            .pseudo_counts()
            .iter()
            .zip(array![3.0, 1.0, 1.5].iter())
        {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn tilted_mean_matches_expectation_identity() {
        // E_tilted[p_i] = alpha_i (w + q_i) / ((S + 1) w); verify against a
        // direct computation from Dirichlet cross moments
        let prior = Dirichlet::new(array![2.0, 3.0, 5.0]);
        let sample = Discrete::from_probs(&[0.5, 0.25, 0.25]).unwrap();

        let msg = to_probs(&sample, &prior).unwrap();
        let posterior = prior.product(&msg).unwrap();
        let post_mean = posterior.mean().unwrap();

        // cross moments E[p_i p_j] = alpha_i (alpha_j + [i == j]) / (S (S+1))
        let alpha = [2.0, 3.0, 5.0];
        let q = [0.5, 0.25, 0.25];
        let s = 10.0;
        let z: f64 = (0..3).map(|j| q[j] * alpha[j] / s).sum();
        for i in 0..3 {
            let num: f64 = (0..3)
                .map(|j| {
                    let second = alpha[i] * (alpha[j] + if i == j { 1.0 } else { 0.0 })
                        / (s * (s + 1.0));
                    q[j] * second
                })
                .sum();
            assert_abs_diff_eq!(post_mean[i], num / z, epsilon = 1e-9);
        }
    }

    #[test]
    fn evidence_observed_is_log_mean() {
        let prior = Dirichlet::new(array![1.0, 2.0, 7.0]);
        let lp = log_average_factor(&Discrete::point_mass(2, 3), &prior).unwrap();
        assert_abs_diff_eq!(lp, 0.7f64.ln(), epsilon = 1e-12);

        let ler = log_evidence_ratio(&Discrete::point_mass(2, 3), &prior).unwrap();
        assert_abs_diff_eq!(ler, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn vmp_messages() {
        let prior = Dirichlet::new(array![2.0, 6.0]);
        let msg = to_sample_vmp(&prior).unwrap();
        let expected =
            crate::stable::digamma(2.0) - crate::stable::digamma(6.0);
        assert_abs_diff_eq!(
            msg.log_probs()[0] - msg.log_probs()[1],
            expected,
            epsilon = 1e-12
        );

        let soft = Discrete::from_probs(&[0.25, 0.75]).unwrap();
        let msg = to_probs_vmp(&soft).unwrap();
        assert_abs_diff_eq!(msg.pseudo_counts()[0], 1.25, epsilon = 1e-12);
        assert_abs_diff_eq!(msg.pseudo_counts()[1], 1.75, epsilon = 1e-12);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let prior = Dirichlet::uniform(3);
        let sample = Discrete::uniform(2);
        assert_eq!(
            to_probs(&sample, &prior),
            Err(HeraldError::DimensionMismatch)
        );
    }

    #[test]
    fn gibbs_probs_land_on_the_simplex() {
        let mut rng = rand::thread_rng();
        let prior = Dirichlet::new(array![1.0, 1.0, 1.0]);
        let draw = sample_probs(&mut rng, 1, &prior).unwrap();
        assert_abs_diff_eq!(draw.sum(), 1.0, epsilon = 1e-9);
        assert!(sample_probs(&mut rng, 7, &prior).is_err());
    }
}
