//! A belief over strings with finite support.
//!
//! Support is kept in insertion order so repeated runs of an inference loop
//! produce identical printouts. Weights live in log space and follow the same
//! product/ratio algebra as the other finite-domain families.

use super::ExponentialFamily;
use crate::stable::log_sum_exp;
use crate::util::{HeraldError, Result};

use indexmap::IndexMap;
use rand::Rng;

#[derive(Clone, Debug, PartialEq)]
pub enum StringDist {
    /// The improper uniform belief over all strings; the unit of `product`.
    Uniform,

    /// Finite support with unnormalized log weights.
    Weighted(IndexMap<String, f64>),
}

impl StringDist {
    pub fn uniform() -> Self {
        StringDist::Uniform
    }

    /// All mass on one string.
    pub fn point_mass(s: &str) -> Self {
        let mut support = IndexMap::new();
        support.insert(String::from(s), 0.0);
        StringDist::Weighted(support)
    }

    /// Construct from (string, weight) pairs; weights need not be normalized.
    ///
    /// # Errors
    /// * `HeraldError::EmptySupport` when no pair is given
    /// * `HeraldError::InvalidParameter` on a negative or NaN weight
    pub fn from_weights<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut support = IndexMap::new();
        for (s, w) in pairs {
            if w < 0.0 || w.is_nan() {
                return Err(HeraldError::InvalidParameter(String::from(
                    "String weights must be nonnegative",
                )));
            }
            if w > 0.0 {
                let entry = support.entry(s.into()).or_insert(f64::NEG_INFINITY);
                *entry = crate::stable::log_add_exp(*entry, w.ln());
            }
        }
        if support.is_empty() {
            return Err(HeraldError::EmptySupport);
        }
        Ok(StringDist::Weighted(support))
    }

    /// The support with log weights, or None for the uniform belief.
    pub fn log_weights(&self) -> Option<&IndexMap<String, f64>> {
        match self {
            StringDist::Uniform => None,
            StringDist::Weighted(ref support) => Some(support),
        }
    }

    /// Normalized probability of `s`; zero off-support.
    pub fn prob(&self, s: &str) -> Result<f64> {
        match self {
            StringDist::Uniform => Err(HeraldError::ImproperDistribution),
            StringDist::Weighted(ref support) => {
                let z = self.log_normalizer();
                Ok(support.get(s).map_or(0.0, |lw| (lw - z).exp()))
            }
        }
    }

    /// The most probable string (first in insertion order wins ties).
    pub fn mode(&self) -> Result<&str> {
        match self {
            StringDist::Uniform => Err(HeraldError::ImproperDistribution),
            StringDist::Weighted(ref support) => {
                let mut best: Option<(&str, f64)> = None;
                for (s, &lw) in support {
                    match best {
                        Some((_, bw)) if lw <= bw => {}
                        _ => best = Some((s.as_str(), lw)),
                    }
                }
                best.map(|(s, _)| s).ok_or(HeraldError::EmptySupport)
            }
        }
    }

    pub fn is_point_mass(&self) -> bool {
        matches!(self, StringDist::Weighted(ref s) if s.len() == 1)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str> {
        match self {
            StringDist::Uniform => Err(HeraldError::ImproperDistribution),
            StringDist::Weighted(ref support) => {
                let z = self.log_normalizer();
                let draw = rng.gen::<f64>();
                let mut acc = 0.0;
                let mut last = None;
                for (s, &lw) in support {
                    acc += (lw - z).exp();
                    last = Some(s.as_str());
                    if draw < acc {
                        return Ok(s.as_str());
                    }
                }
                last.ok_or(HeraldError::EmptySupport)
            }
        }
    }
}

impl ExponentialFamily for StringDist {
    fn product(&self, other: &Self) -> Result<Self> {
        let (a, b) = match (self, other) {
            (StringDist::Uniform, _) => return Ok(other.clone()),
            (_, StringDist::Uniform) => return Ok(self.clone()),
            (StringDist::Weighted(a), StringDist::Weighted(b)) => (a, b),
        };

        let mut support = IndexMap::new();
        for (s, &wa) in a {
            if let Some(&wb) = b.get(s) {
                support.insert(s.clone(), wa + wb);
            }
        }
        if support.is_empty() {
            return Err(HeraldError::EmptySupport);
        }
        Ok(StringDist::Weighted(support))
    }

    fn ratio(&self, other: &Self) -> Result<Self> {
        let (a, b) = match (self, other) {
            (_, StringDist::Uniform) => return Ok(self.clone()),
            (StringDist::Uniform, StringDist::Weighted(_)) => {
                // uniform over a finite-support belief has no finite form
                return Err(HeraldError::ImproperDistribution);
            }
            (StringDist::Weighted(a), StringDist::Weighted(b)) => (a, b),
        };

        let mut support = IndexMap::new();
        for (s, &wa) in a {
            match b.get(s) {
                Some(&wb) => {
                    support.insert(s.clone(), wa - wb);
                }
                None => return Err(HeraldError::DivideByZero),
            }
        }
        if support.is_empty() {
            return Err(HeraldError::EmptySupport);
        }
        Ok(StringDist::Weighted(support))
    }

    fn log_normalizer(&self) -> f64 {
        match self {
            StringDist::Uniform => f64::INFINITY,
            StringDist::Weighted(ref support) => {
                let logs: Vec<f64> = support.values().cloned().collect();
                log_sum_exp(&logs)
            }
        }
    }

    fn log_average_of(&self, other: &Self) -> Result<f64> {
        if matches!(self, StringDist::Uniform) || matches!(other, StringDist::Uniform) {
            return Ok(0.0);
        }
        let combined = self.product(other)?;
        Ok(combined.log_normalizer() - self.log_normalizer() - other.log_normalizer())
    }

    fn is_proper(&self) -> bool {
        match self {
            StringDist::Uniform => false,
            StringDist::Weighted(ref support) => {
                !support.is_empty() && self.log_normalizer().is_finite()
            }
        }
    }

    fn is_uniform(&self) -> bool {
        matches!(self, StringDist::Uniform)
    }
}
