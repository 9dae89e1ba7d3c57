//! Operators for the factor `sample ~ Discrete(table[selector, :])` with a
//! fixed row-stochastic conditional probability table.
//!
//! Messages in both directions are matrix-vector products in probability
//! space; the factor is the discrete channel between two categorical
//! variables.

use crate::distributions::{Discrete, ExponentialFamily};
use crate::util::{HeraldError, Result};

use itertools::iproduct;
use ndarray::{Array1, Array2, Axis};
use rand::Rng;

#[derive(Clone, Debug)]
pub struct DiscreteFromDiscrete {
    /// Row j is the distribution of the sample given selector state j.
    table: Array2<f64>,
}

impl DiscreteFromDiscrete {
    /// # Errors
    /// * `HeraldError::InvalidParameter` if any entry is negative or any row
    ///   does not sum to one
    pub fn new(table: Array2<f64>) -> Result<Self> {
        if table.nrows() == 0 || table.ncols() == 0 {
            return Err(HeraldError::InvalidParameter(String::from(
                "conditional probability table must be nonempty",
            )));
        }
        if table.iter().any(|&p| p < 0.0 || p.is_nan()) {
            return Err(HeraldError::InvalidParameter(String::from(
                "conditional probability table entries must be nonnegative",
            )));
        }
        for (j, row) in table.axis_iter(Axis(0)).enumerate() {
            if (row.sum() - 1.0).abs() > 1e-6 {
                return Err(HeraldError::InvalidParameter(format!(
                    "conditional probability table row {} does not sum to one",
                    j
                )));
            }
        }
        Ok(DiscreteFromDiscrete { table })
    }

    pub fn selector_len(&self) -> usize {
        self.table.nrows()
    }

    pub fn sample_len(&self) -> usize {
        self.table.ncols()
    }

    /// Message to `sample`: the table contracted against the selector belief.
    /// Identical under EP; the VMP variant mixes log entries instead.
    pub fn to_sample(&self, selector: &Discrete) -> Result<Discrete> {
        if selector.len() != self.selector_len() {
            return Err(HeraldError::DimensionMismatch);
        }
        let q = selector.probs()?;
        let out = self.table.t().dot(&q);
        Ok(Discrete::from_log_probs(out.mapv(f64::ln)))
    }

    /// Message to `selector`: per-row likelihood of the sample belief.
    pub fn to_selector(&self, sample: &Discrete) -> Result<Discrete> {
        if sample.len() != self.sample_len() {
            return Err(HeraldError::DimensionMismatch);
        }
        let q = sample.probs()?;
        let lik = self.table.dot(&q);
        if lik.iter().all(|&l| l == 0.0) {
            return Err(HeraldError::ImproperDistribution);
        }
        Ok(Discrete::from_log_probs(lik.mapv(f64::ln)))
    }

    /// ln of the factor averaged over both beliefs:
    /// ln(selector^T table sample).
    pub fn log_average_factor(&self, selector: &Discrete, sample: &Discrete) -> Result<f64> {
        if selector.len() != self.selector_len() || sample.len() != self.sample_len() {
            return Err(HeraldError::DimensionMismatch);
        }
        let qs = selector.probs()?;
        let qx = sample.probs()?;
        Ok(qs.dot(&self.table.dot(&qx)).ln())
    }

    /// EP evidence contribution.
    pub fn log_evidence_ratio(&self, selector: &Discrete, sample: &Discrete) -> Result<f64> {
        Ok(self.log_average_factor(selector, sample)?
            - self.to_sample(selector)?.log_average_of(sample)?)
    }

    /// VMP message to `sample`: ln p_k = sum_j q_j ln table[j, k].
    ///
    /// Zero-probability selector states contribute nothing even against a
    /// zero table entry (the 0 ln 0 convention).
    pub fn to_sample_vmp(&self, selector: &Discrete) -> Result<Discrete> {
        if selector.len() != self.selector_len() {
            return Err(HeraldError::DimensionMismatch);
        }
        let q = selector.probs()?;
        let mut log_probs = Array1::zeros(self.sample_len());
        for k in 0..self.sample_len() {
            let mut acc = 0.0;
            for j in 0..self.selector_len() {
                if q[j] > 0.0 {
                    acc += q[j] * self.table[[j, k]].ln();
                }
            }
            log_probs[k] = acc;
        }
        Ok(Discrete::from_log_probs(log_probs))
    }

    /// VMP message to `selector`: ln l_j = sum_k q_k ln table[j, k].
    pub fn to_selector_vmp(&self, sample: &Discrete) -> Result<Discrete> {
        if sample.len() != self.sample_len() {
            return Err(HeraldError::DimensionMismatch);
        }
        let q = sample.probs()?;
        let mut log_probs = Array1::zeros(self.selector_len());
        for j in 0..self.selector_len() {
            let mut acc = 0.0;
            for k in 0..self.sample_len() {
                if q[k] > 0.0 {
                    acc += q[k] * self.table[[j, k]].ln();
                }
            }
            log_probs[j] = acc;
        }
        Ok(Discrete::from_log_probs(log_probs))
    }

    /// VMP evidence bound contribution.
    pub fn average_log_factor(&self, selector: &Discrete, sample: &Discrete) -> Result<f64> {
        if selector.len() != self.selector_len() || sample.len() != self.sample_len() {
            return Err(HeraldError::DimensionMismatch);
        }
        let qs = selector.probs()?;
        let qx = sample.probs()?;
        let mut acc = 0.0;
        for (j, k) in iproduct!(0..self.selector_len(), 0..self.sample_len()) {
            let w = qs[j] * qx[k];
            if w > 0.0 {
                acc += w * self.table[[j, k]].ln();
            }
        }
        Ok(acc)
    }

    /// Gibbs draw of the sample given a point selector.
    pub fn sample_sample<R: Rng + ?Sized>(&self, rng: &mut R, selector: usize) -> Result<usize> {
        if selector >= self.selector_len() {
            return Err(HeraldError::InvalidParameter(format!(
                "selector {} outside table with {} rows",
                selector,
                self.selector_len()
            )));
        }
        let row = self.table.row(selector).mapv(f64::ln);
        Discrete::from_log_probs(row).sample(rng)
    }
}
