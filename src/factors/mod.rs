//! The factor-operator catalogue.
//!
//! Each submodule covers one primitive probabilistic relationship and
//! supplies the closed-form messages the inference algorithms exchange over
//! that factor's edges:
//!
//! * `to_<argument>` computes the Expectation Propagation message toward an
//!   argument given the incoming beliefs on the other edges: the
//!   moment-matching projection of cavity times factor, divided by the
//!   cavity.
//! * `to_<argument>_vmp` computes the Variational Message Passing message:
//!   the exponential of the expected log factor with respect to the other
//!   arguments' beliefs.
//! * `sample_<argument>` draws an argument from its full conditional given
//!   point values of the other arguments, for Gibbs sweeps.
//! * `log_average_factor` is the factor's contribution to the model's log
//!   evidence under EP; `log_evidence_ratio` subtracts the part already
//!   carried by the outgoing message. `average_log_factor` is the VMP
//!   evidence bound contribution. Deterministic factors contribute zero under
//!   EP and say so with a constant `log_evidence_ratio`.
//!
//! Conjugate relationships (a Beta feeding a Bernoulli, a Dirichlet feeding a
//! Discrete, a Gamma feeding a Poisson) give exact messages when the child is
//! observed; the moment-matching forms only engage when the child itself is
//! uncertain.

pub mod bernoulli_from_beta;
pub mod bernoulli_from_bool;
pub mod concat;
pub mod discrete_from_dirichlet;
pub mod discrete_from_discrete;
pub mod gaussian_sum;
pub mod matrix_vector;
pub mod multinomial;
pub mod poisson;

pub use self::bernoulli_from_bool::BernoulliFromBool;
pub use self::discrete_from_discrete::DiscreteFromDiscrete;
pub use self::matrix_vector::MatrixVectorProduct;

#[cfg(test)]
/// Invariants every operator in the catalogue honors. Tests specific to one
/// factor's formulas live with that factor; these are hoisted here to avoid
/// duplication.
mod tests {
    use super::*;
    use crate::distributions::{
        Bernoulli, Beta, Dirichlet, Discrete, ExponentialFamily, Gamma, Poisson,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    /// A factor fed only uniform beliefs must emit uniform messages: with no
    /// information coming in, none may go out.
    fn uniform_in_uniform_out() {
        let to_prob =
            bernoulli_from_beta::to_prob(&Bernoulli::uniform(), &Beta::uniform()).unwrap();
        assert!(to_prob.is_uniform());

        let to_probs = discrete_from_dirichlet::to_probs(&Discrete::uniform(3), &Dirichlet::uniform(3))
            .unwrap();
        assert!(to_probs.is_uniform());
    }

    #[test]
    /// Where the relationship is conjugate and the child observed, EP and VMP
    /// messages to the parent must coincide exactly.
    fn ep_and_vmp_agree_on_observed_conjugate_updates() {
        // Beta-Bernoulli
        let observed = Bernoulli::point_mass(true);
        let ep = bernoulli_from_beta::to_prob(&observed, &Beta::new(3.0, 2.0)).unwrap();
        let vmp = bernoulli_from_beta::to_prob_vmp(&observed);
        assert_abs_diff_eq!(ep.true_count(), vmp.true_count(), epsilon = 1e-9);
        assert_abs_diff_eq!(ep.false_count(), vmp.false_count(), epsilon = 1e-9);

        // Dirichlet-Discrete
        let observed = Discrete::point_mass(1, 3);
        let prior = Dirichlet::new(array![2.0, 1.0, 1.5]);
        let ep = discrete_from_dirichlet::to_probs(&observed, &prior).unwrap();
        let vmp = discrete_from_dirichlet::to_probs_vmp(&observed).unwrap();
        for (a, b) in ep.pseudo_counts().iter().zip(vmp.pseudo_counts().iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }

        // Gamma-Poisson
        let ep = poisson::to_rate_observed(4);
        let vmp = poisson::to_rate_vmp(&Poisson::standard(4.0).unwrap()).unwrap();
        assert_abs_diff_eq!(ep.shape(), vmp.shape(), epsilon = 1e-9);
        assert_abs_diff_eq!(ep.rate(), vmp.rate(), epsilon = 1e-9);
    }

    #[test]
    /// Evidence with every argument observed is the factor's log density at
    /// those values.
    fn observed_evidence_is_log_density() {
        let lp = poisson::log_average_factor_at(3, 2.0);
        // Poisson pmf at k = 3, rate 2
        let expected = 3.0 * 2f64.ln() - 2.0 - 6f64.ln();
        assert_abs_diff_eq!(lp, expected, epsilon = 1e-12);

        let channel = BernoulliFromBool::new(0.9, 0.2).unwrap();
        let lp = channel
            .log_average_factor(&Bernoulli::point_mass(true), &Bernoulli::point_mass(false))
            .unwrap();
        assert_abs_diff_eq!(lp, 0.2f64.ln(), epsilon = 1e-12);

        let g = Gamma::new(2.0, 3.0);
        let lp = poisson::log_average_factor(1, &g).unwrap();
        // NB marginal: int Gamma(r; 2, 3) r e^-r dr = 2 * 3^2 / 4^3
        let expected = (2.0 * 9.0 / 64.0f64).ln();
        assert_abs_diff_eq!(lp, expected, epsilon = 1e-10);
    }
}
