//! A Dirichlet belief over a probability vector, stored as pseudo-counts.

use super::ExponentialFamily;
use crate::stable::{digamma, ln_gamma};
use crate::util::{HeraldError, Result};

use ndarray::Array1;
use rand::Rng;
use rand_distr::Distribution;

#[derive(Clone, Debug, PartialEq)]
pub struct Dirichlet {
    pseudo_counts: Array1<f64>,
}

impl Dirichlet {
    /// The uniform belief over the simplex: all pseudo-counts one.
    pub fn uniform(n: usize) -> Self {
        Dirichlet {
            pseudo_counts: Array1::ones(n),
        }
    }

    pub fn new(pseudo_counts: Array1<f64>) -> Self {
        Dirichlet { pseudo_counts }
    }

    /// A symmetric Dirichlet with every pseudo-count equal to `alpha`.
    pub fn symmetric(n: usize, alpha: f64) -> Self {
        Dirichlet {
            pseudo_counts: Array1::from_elem(n, alpha),
        }
    }

    pub fn len(&self) -> usize {
        self.pseudo_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pseudo_counts.is_empty()
    }

    pub fn pseudo_counts(&self) -> &Array1<f64> {
        &self.pseudo_counts
    }

    /// Sum of the pseudo-counts, often written S.
    pub fn total(&self) -> f64 {
        self.pseudo_counts.sum()
    }

    /// E[p], the normalized pseudo-counts.
    pub fn mean(&self) -> Result<Array1<f64>> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(&self.pseudo_counts / self.total())
    }

    /// E[ln p_i] = digamma(alpha_i) - digamma(S); the VMP sufficient
    /// statistics.
    pub fn mean_log(&self) -> Result<Array1<f64>> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        let ds = digamma(self.total());
        Ok(self.pseudo_counts.mapv(|a| digamma(a) - ds))
    }

    /// The Dirichlet with the given mean vector and total concentration.
    ///
    /// # Errors
    /// * `HeraldError::InvalidParameter` unless the mean is a distribution and
    ///   the total is positive
    pub fn from_mean_and_total(mean: &Array1<f64>, total: f64) -> Result<Self> {
        if total <= 0.0 || mean.iter().any(|&m| m < 0.0) {
            return Err(HeraldError::InvalidParameter(String::from(
                "Dirichlet mean must be nonnegative with positive total concentration",
            )));
        }
        if (mean.sum() - 1.0).abs() > 1e-6 {
            return Err(HeraldError::InvalidParameter(String::from(
                "Dirichlet mean must sum to one",
            )));
        }
        Ok(Dirichlet {
            pseudo_counts: mean * total,
        })
    }

    /// Draw a point on the simplex: normalized independent Gamma draws.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Array1<f64>> {
        if !self.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        let mut draws = Array1::zeros(self.len());
        for (i, &alpha) in self.pseudo_counts.iter().enumerate() {
            let gamma = rand_distr::Gamma::new(alpha, 1.0)
                .map_err(|_| HeraldError::ImproperDistribution)?;
            draws[i] = gamma.sample(rng);
        }
        let z = draws.sum();
        if z == 0.0 {
            return Err(HeraldError::DivideByZero);
        }
        Ok(draws / z)
    }
}

impl ExponentialFamily for Dirichlet {
    fn product(&self, other: &Self) -> Result<Self> {
        if self.len() != other.len() {
            return Err(HeraldError::DimensionMismatch);
        }
        Ok(Dirichlet {
            pseudo_counts: &self.pseudo_counts + &other.pseudo_counts - 1.0,
        })
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        if self.len() != other.len() {
            return Err(HeraldError::DimensionMismatch);
        }
        Ok(Dirichlet {
            pseudo_counts: &self.pseudo_counts - &other.pseudo_counts + 1.0,
        })
    }

    /// ln of the multivariate beta function at the pseudo-counts.
    fn log_normalizer(&self) -> f64 {
        let sum_ln_gamma: f64 = self.pseudo_counts.iter().map(|&a| ln_gamma(a)).sum();
        sum_ln_gamma - ln_gamma(self.total())
    }

    fn log_average_of(&self, other: &Self) -> Result<f64> {
        let combined = self.product(other)?;
        if !combined.is_proper() {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(combined.log_normalizer() - self.log_normalizer() - other.log_normalizer())
    }

    fn is_proper(&self) -> bool {
        !self.is_empty() && self.pseudo_counts.iter().all(|&a| a > 0.0)
    }

    fn is_uniform(&self) -> bool {
        self.pseudo_counts.iter().all(|&a| a == 1.0)
    }
}
