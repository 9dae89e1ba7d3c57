//! Operators for the deterministic factor `result = prefix + suffix` over
//! finite-support string beliefs.
//!
//! Every message is computed by enumeration: forward over all pairs, backward
//! over all consistent splits of each candidate result. The arguments must
//! have finite support; a uniform string belief cannot be enumerated and is
//! rejected up front.

use crate::distributions::{ExponentialFamily, StringDist};
use crate::stable::log_add_exp;
use crate::util::{HeraldError, Result};

use indexmap::IndexMap;
use itertools::iproduct;

fn weighted(dist: &StringDist) -> Result<&IndexMap<String, f64>> {
    dist.log_weights().ok_or_else(|| {
        HeraldError::InvalidParameter(String::from(
            "concat messages require finite-support string beliefs",
        ))
    })
}

fn accumulate(support: &mut IndexMap<String, f64>, key: String, log_weight: f64) {
    let entry = support.entry(key).or_insert(f64::NEG_INFINITY);
    *entry = log_add_exp(*entry, log_weight);
}

/// Message to `result`: all pairwise concatenations, log weights adding.
pub fn to_result(prefix: &StringDist, suffix: &StringDist) -> Result<StringDist> {
    let prefixes = weighted(prefix)?;
    let suffixes = weighted(suffix)?;

    let mut support = IndexMap::new();
    for ((p, &wp), (s, &ws)) in iproduct!(prefixes.iter(), suffixes.iter()) {
        let mut key = String::with_capacity(p.len() + s.len());
        key.push_str(p);
        key.push_str(s);
        accumulate(&mut support, key, wp + ws);
    }
    if support.is_empty() {
        return Err(HeraldError::EmptySupport);
    }
    Ok(StringDist::Weighted(support))
}

/// Message to `prefix`: for each candidate result, every split whose tail
/// lies in the suffix support contributes its head.
pub fn to_prefix(result: &StringDist, suffix: &StringDist) -> Result<StringDist> {
    let results = weighted(result)?;
    let suffixes = weighted(suffix)?;

    let mut support = IndexMap::new();
    for ((r, &wr), (s, &ws)) in iproduct!(results.iter(), suffixes.iter()) {
        if let Some(head) = r.strip_suffix(s.as_str()) {
            accumulate(&mut support, String::from(head), wr + ws);
        }
    }
    if support.is_empty() {
        return Err(HeraldError::EmptySupport);
    }
    Ok(StringDist::Weighted(support))
}

/// Message to `suffix`: mirror image of `to_prefix`.
pub fn to_suffix(result: &StringDist, prefix: &StringDist) -> Result<StringDist> {
    let results = weighted(result)?;
    let prefixes = weighted(prefix)?;

    let mut support = IndexMap::new();
    for ((r, &wr), (p, &wp)) in iproduct!(results.iter(), prefixes.iter()) {
        if let Some(tail) = r.strip_prefix(p.as_str()) {
            accumulate(&mut support, String::from(tail), wr + wp);
        }
    }
    if support.is_empty() {
        return Err(HeraldError::EmptySupport);
    }
    Ok(StringDist::Weighted(support))
}

/// ln of the factor averaged over all three beliefs.
pub fn log_average_factor(
    result: &StringDist,
    prefix: &StringDist,
    suffix: &StringDist,
) -> Result<f64> {
    to_result(prefix, suffix)?.log_average_of(result)
}

/// Deterministic factors contribute no evidence of their own under EP.
pub fn log_evidence_ratio() -> f64 {
    0.0
}

/// Evaluate the factor at point arguments.
pub fn result(prefix: &str, suffix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + suffix.len());
    out.push_str(prefix);
    out.push_str(suffix);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn forward_enumerates_pairs() {
        let prefix = StringDist::from_weights(vec![("ab", 0.5), ("a", 0.5)]).unwrap();
        let suffix = StringDist::from_weights(vec![("c", 0.5), ("bc", 0.5)]).unwrap();
        let msg = to_result(&prefix, &suffix).unwrap();

        // "abc" arises twice: ab+c and a+bc
        assert_abs_diff_eq!(msg.prob("abc").unwrap(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(msg.prob("abbc").unwrap(), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(msg.prob("ac").unwrap(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn backward_sums_consistent_splits() {
        let result = StringDist::point_mass("abc");
        let suffix = StringDist::from_weights(vec![("c", 0.75), ("bc", 0.25)]).unwrap();
        let msg = to_prefix(&result, &suffix).unwrap();
        assert_abs_diff_eq!(msg.prob("ab").unwrap(), 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(msg.prob("a").unwrap(), 0.25, epsilon = 1e-12);

        let prefix = StringDist::point_mass("a");
        let msg = to_suffix(&result, &prefix).unwrap();
        assert_eq!(msg.mode().unwrap(), "bc");
    }

    #[test]
    fn inconsistent_beliefs_leave_empty_support() {
        let result = StringDist::point_mass("xyz");
        let suffix = StringDist::point_mass("abc");
        assert_eq!(
            to_prefix(&result, &suffix),
            Err(HeraldError::EmptySupport)
        );
    }

    #[test]
    fn uniform_arguments_are_rejected() {
        let finite = StringDist::point_mass("a");
        assert!(to_result(&StringDist::uniform(), &finite).is_err());
        assert!(to_prefix(&finite, &StringDist::uniform()).is_err());
    }

    #[test]
    fn empty_string_is_a_valid_affix() {
        let result = StringDist::point_mass("abc");
        let prefix = StringDist::from_weights(vec![("", 0.5), ("abc", 0.5)]).unwrap();
        let msg = to_suffix(&result, &prefix).unwrap();
        assert_abs_diff_eq!(msg.prob("abc").unwrap(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(msg.prob("").unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn evidence_is_overlap_of_forward_message() {
        let prefix = StringDist::point_mass("he");
        let suffix = StringDist::from_weights(vec![("llo", 0.5), ("y", 0.5)]).unwrap();
        let observed = StringDist::point_mass("hello");
        let lp = log_average_factor(&observed, &prefix, &suffix).unwrap();
        assert_abs_diff_eq!(lp, 0.5f64.ln(), epsilon = 1e-12);

        assert_eq!(log_evidence_ratio(), 0.0);
    }

    #[test]
    fn point_evaluation() {
        assert_eq!(result("foo", "bar"), "foobar");
    }
}
