//! Moment-matching projection helpers shared by the EP operators.
//!
//! EP computes the moments of a tilted distribution (cavity times factor) and
//! projects back onto the cavity's family; the outgoing message is the
//! projection divided by the cavity. The projections here centralize the
//! degenerate-moment handling so the operators can stay close to their
//! formulas.

use crate::distributions::{Beta, ExponentialFamily, Gamma, Gaussian};
use crate::util::{HeraldError, Result};

use log::debug;

/// Project tilted moments onto a Beta and divide out the cavity.
///
/// # Errors
/// * `HeraldError::ImproperDistribution` when the tilted moments fit no Beta
pub fn beta_site(cavity: &Beta, tilted_mean: f64, tilted_variance: f64) -> Result<Beta> {
    let projected = match Beta::from_mean_and_variance(tilted_mean, tilted_variance) {
        Ok(p) => p,
        Err(e) => {
            debug!(
                "degenerate Beta projection: mean {} variance {}",
                tilted_mean, tilted_variance
            );
            return Err(e);
        }
    };
    projected.ratio(cavity)
}

/// Project tilted moments onto a Gamma and divide out the cavity.
pub fn gamma_site(cavity: &Gamma, tilted_mean: f64, tilted_variance: f64) -> Result<Gamma> {
    let projected = match Gamma::from_mean_and_variance(tilted_mean, tilted_variance) {
        Ok(p) => p,
        Err(e) => {
            debug!(
                "degenerate Gamma projection: mean {} variance {}",
                tilted_mean, tilted_variance
            );
            return Err(e);
        }
    };
    projected.ratio(cavity)
}

/// Project tilted moments onto a Gaussian and divide out the cavity.
///
/// A zero tilted variance collapses the site to a point mass; a negative one
/// has no Gaussian representation and is an error.
pub fn gaussian_site(cavity: &Gaussian, tilted_mean: f64, tilted_variance: f64) -> Result<Gaussian> {
    if tilted_variance < 0.0 || tilted_variance.is_nan() {
        debug!(
            "degenerate Gaussian projection: mean {} variance {}",
            tilted_mean, tilted_variance
        );
        return Err(HeraldError::ImproperDistribution);
    }
    if tilted_variance == 0.0 {
        return Ok(Gaussian::point_mass(tilted_mean));
    }
    let projected = Gaussian::from_mean_and_variance(tilted_mean, tilted_variance)?;
    let site = projected.ratio(cavity)?;
    if site.precision() < 0.0 {
        // legitimate for EP sites, but worth a trace when hunting oscillations
        debug!("negative-precision Gaussian site: {:?}", site);
    }
    Ok(site)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn beta_site_times_cavity_has_tilted_moments() {
        let cavity = Beta::new(2.0, 3.0);
        let site = beta_site(&cavity, 0.5, 0.02).unwrap();

        let rebuilt = cavity.product(&site).unwrap();
        assert_abs_diff_eq!(rebuilt.mean().unwrap(), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(rebuilt.variance().unwrap(), 0.02, epsilon = 1e-9);
    }

    #[test]
    fn gamma_site_times_cavity_has_tilted_moments() {
        let cavity = Gamma::new(3.0, 2.0);
        let site = gamma_site(&cavity, 2.0, 0.5).unwrap();

        let rebuilt = cavity.product(&site).unwrap();
        assert_abs_diff_eq!(rebuilt.mean().unwrap(), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rebuilt.variance().unwrap(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn gaussian_site_matches_worked_example() {
        // cavity N(0, 1), tilted moments (2, 0.5): the site must combine with
        // the cavity to give exactly those moments back
        let cavity = Gaussian::from_mean_and_variance(0.0, 1.0).unwrap();
        let site = gaussian_site(&cavity, 2.0, 0.5).unwrap();

        let rebuilt = cavity.product(&site).unwrap();
        assert_abs_diff_eq!(rebuilt.mean().unwrap(), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rebuilt.variance().unwrap(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_moments_are_errors_not_nans() {
        let cavity = Beta::new(2.0, 2.0);
        assert!(beta_site(&cavity, 0.5, 0.0).is_err());
        assert!(beta_site(&cavity, 0.5, 0.9).is_err());

        let gcavity = Gaussian::from_mean_and_variance(0.0, 1.0).unwrap();
        assert!(gaussian_site(&gcavity, 1.0, -0.5).is_err());
        // zero variance collapses to a point mass rather than erroring
        let point = gaussian_site(&gcavity, 1.0, 0.0).unwrap();
        assert!(point.is_point_mass());
    }
}
