//! Numerically stable scalar primitives for log-domain probability math.
//!
//! Every message operator in this crate eventually bottoms out in one of these
//! functions. They are total over `f64` and propagate NaN rather than panic.

use std::f64::consts::PI;

/// 0.5 * ln(2 * pi)
pub const LOG_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// The Euler-Mascheroni constant; `digamma(1) == -EULER_GAMMA`.
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// Stable log(exp(a) + exp(b)).
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    if a == f64::INFINITY || b == f64::INFINITY {
        return f64::INFINITY;
    }
    let m = a.max(b);
    m + (-(a - b).abs()).exp().ln_1p()
}

/// Stable log(exp(a) - exp(b)) for a >= b.
///
/// Returns NEG_INFINITY when a == b and NaN when a < b.
pub fn log_diff_exp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() || a < b {
        return f64::NAN;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    if a == b {
        return f64::NEG_INFINITY;
    }
    // ln(e^a - e^b) = a + ln(1 - e^(b - a)), with b - a < 0
    a + (-(b - a).exp_m1()).ln()
}

/// Natural log of the gamma function via the Lanczos approximation (g = 7).
///
/// Defined for x > 0; returns INFINITY at 0 and NaN for negative arguments,
/// which never arise from proper shape or count parameters.
pub fn ln_gamma(x: f64) -> f64 {
    if x.is_nan() || x < 0.0 {
        return f64::NAN;
    }
    if x == 0.0 {
        return f64::INFINITY;
    }
    if x < 0.5 {
        // reflection keeps the series argument away from zero
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut sum = LANCZOS_COEFFS[0];
    for (i, c) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }
    let t = x + LANCZOS_G + 0.5;
    LOG_SQRT_2PI + (x + 0.5) * t.ln() - t + sum.ln()
}

/// The digamma function, d/dx ln Gamma(x), for x > 0.
///
/// Recurrence until the argument reaches 12, then the asymptotic series; the
/// omitted series tail is below 1e-11 there.
pub fn digamma(x: f64) -> f64 {
    if x.is_nan() || x <= 0.0 {
        return f64::NAN;
    }
    let mut x = x;
    let mut result = 0.0;
    while x < 12.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    result + x.ln() - 0.5 * inv - inv2 * (1.0 / 12.0 - inv2 * (1.0 / 120.0 - inv2 / 252.0))
}

/// The trigamma function, d^2/dx^2 ln Gamma(x), for x > 0.
pub fn trigamma(x: f64) -> f64 {
    if x.is_nan() || x <= 0.0 {
        return f64::NAN;
    }
    let mut x = x;
    let mut result = 0.0;
    while x < 12.0 {
        result += 1.0 / (x * x);
        x += 1.0;
    }
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    result + inv * (1.0 + inv * (0.5 + inv * (1.0 / 6.0 - inv2 * (1.0 / 30.0 - inv2 / 42.0))))
}

/// ln Beta(a, b) = ln Gamma(a) + ln Gamma(b) - ln Gamma(a + b)
pub fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

/// ln(n!)
pub fn ln_factorial(n: u64) -> f64 {
    // the first few values dominate usage in pmf normalizers
    const SMALL: [f64; 11] = [
        0.0,
        0.0,
        0.693_147_180_559_945_3,
        1.791_759_469_228_055,
        3.178_053_830_347_946,
        4.787_491_742_782_046,
        6.579_251_212_010_101,
        8.525_161_361_065_415,
        10.604_602_902_745_25,
        12.801_827_480_081_469,
        15.104_412_573_075_516,
    ];
    if (n as usize) < SMALL.len() {
        SMALL[n as usize]
    } else {
        ln_gamma(n as f64 + 1.0)
    }
}

/// ln of the binomial coefficient C(n, k); NEG_INFINITY when k > n.
pub fn ln_binomial(n: u64, k: u64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    ln_factorial(n) - ln_factorial(k) - ln_factorial(n - k)
}

/// ln(p / (1 - p)), saturating to +/- INFINITY at the endpoints.
pub fn logit(p: f64) -> f64 {
    p.ln() - (-p).ln_1p()
}

/// The logistic function, 1 / (1 + exp(-x)), computed without overflow.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn log_sum_exp_matches_naive() {
        let vals: [f64; 3] = [0.1, -0.5, 2.0];
        let naive: f64 = vals.iter().map(|v| v.exp()).sum::<f64>().ln();
        assert_abs_diff_eq!(log_sum_exp(&vals), naive, epsilon = 1e-12);
    }

    #[test]
    fn log_sum_exp_extreme_scale() {
        // naive evaluation overflows; the shifted form must not
        let vals = [1000.0, 1000.0];
        assert_abs_diff_eq!(log_sum_exp(&vals), 1000.0 + 2f64.ln(), epsilon = 1e-12);
        assert_eq!(log_sum_exp(&[]), f64::NEG_INFINITY);
        assert_eq!(
            log_sum_exp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn log_add_exp_identities() {
        assert_abs_diff_eq!(log_add_exp(0.0, 0.0), 2f64.ln(), epsilon = 1e-12);
        assert_eq!(log_add_exp(1.5, f64::NEG_INFINITY), 1.5);
        assert_eq!(log_add_exp(f64::NEG_INFINITY, -2.0), -2.0);
    }

    #[test]
    fn log_diff_exp_identities() {
        // ln(e^1 - e^0)
        let expected = (1f64.exp() - 1.0).ln();
        assert_abs_diff_eq!(log_diff_exp(1.0, 0.0), expected, epsilon = 1e-12);
        assert_eq!(log_diff_exp(2.0, 2.0), f64::NEG_INFINITY);
        assert!(log_diff_exp(0.0, 1.0).is_nan());
    }

    #[test]
    fn ln_gamma_matches_factorials() {
        for n in 1u64..15 {
            let expected = ln_factorial(n - 1);
            assert_abs_diff_eq!(ln_gamma(n as f64), expected, epsilon = 1e-10);
        }
        // Gamma(0.5) = sqrt(pi)
        assert_abs_diff_eq!(ln_gamma(0.5), 0.5 * PI.ln(), epsilon = 1e-10);
    }

    #[test]
    fn digamma_known_values() {
        assert_abs_diff_eq!(digamma(1.0), -EULER_GAMMA, epsilon = 1e-10);
        // digamma(x + 1) = digamma(x) + 1/x
        assert_abs_diff_eq!(digamma(2.0), -EULER_GAMMA + 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(digamma(10.5), 2.303_001_034_297_686, epsilon = 1e-9);
    }

    #[test]
    fn trigamma_known_values() {
        assert_abs_diff_eq!(trigamma(1.0), PI * PI / 6.0, epsilon = 1e-10);
        // trigamma(x + 1) = trigamma(x) - 1/x^2
        assert_abs_diff_eq!(trigamma(2.0), PI * PI / 6.0 - 1.0, epsilon = 1e-10);
    }

    #[test]
    fn ln_beta_symmetry() {
        assert_abs_diff_eq!(ln_beta(2.5, 4.0), ln_beta(4.0, 2.5), epsilon = 1e-12);
        // Beta(1, 1) = 1
        assert_abs_diff_eq!(ln_beta(1.0, 1.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn ln_binomial_values() {
        // C(5, 2) = 10
        assert_abs_diff_eq!(ln_binomial(5, 2), 10f64.ln(), epsilon = 1e-10);
        assert_eq!(ln_binomial(3, 5), f64::NEG_INFINITY);
    }

    #[test]
    fn logit_sigmoid_inverse() {
        for &p in &[1e-12, 0.3, 0.5, 0.99, 1.0 - 1e-12] {
            assert_abs_diff_eq!(sigmoid(logit(p)), p, epsilon = 1e-9);
        }
        assert_eq!(logit(0.0), f64::NEG_INFINITY);
        assert_eq!(logit(1.0), f64::INFINITY);
        assert_eq!(sigmoid(f64::INFINITY), 1.0);
        assert_eq!(sigmoid(f64::NEG_INFINITY), 0.0);
    }
}
