//! The exponential-family algebra that every factor operator computes against.
//!
//! Each family stores natural parameters, so the two operations message
//! passing performs constantly (multiplying beliefs, dividing a belief by a
//! message) are parameter addition and subtraction. Evidence contributions
//! come out of log-partition-function ratios via `log_average_of`.

use crate::util::Result;

mod bernoulli;
mod beta;
mod discrete;
mod dirichlet;
mod gamma;
mod gaussian;
mod poisson;
mod strings;
mod vector_gaussian;

pub use self::bernoulli::Bernoulli;
pub use self::beta::Beta;
pub use self::dirichlet::Dirichlet;
pub use self::discrete::Discrete;
pub use self::gamma::Gamma;
pub use self::gaussian::Gaussian;
pub use self::poisson::Poisson;
pub use self::strings::StringDist;
pub use self::vector_gaussian::VectorGaussian;

/// Operations every exponential-family message type supports.
///
/// A "uniform" distribution is the one with all-zero natural parameters: the
/// unit of `product`. It is not necessarily proper (for most families it is
/// not), which is why moment accessors live on the concrete types and return
/// `Result` where impropriety is possible.
pub trait ExponentialFamily: Sized + Clone {
    /// Multiply two beliefs: add natural parameters.
    ///
    /// # Errors
    /// * `HeraldError::DimensionMismatch` if supports differ
    /// * `HeraldError::ImproperDistribution` for conflicting point masses
    fn product(&self, other: &Self) -> Result<Self>;

    /// Divide one belief by another: subtract natural parameters. The result
    /// is frequently improper; that is legitimate for messages.
    fn ratio(&self, other: &Self) -> Result<Self>;

    /// The log partition function A(eta) at this distribution's parameters.
    fn log_normalizer(&self) -> f64;

    /// ln of the integral (or sum) of the product of the two normalized
    /// distributions: `ln E_self[other]`. Symmetric in its arguments. When
    /// either side is a point mass the answer is the other side's log density
    /// there; when either side is an improper uniform the convention is 0.
    /// (Finite-domain families have proper uniforms, which need no special
    /// case.)
    fn log_average_of(&self, other: &Self) -> Result<f64>;

    /// Whether the distribution normalizes to 1 with finite parameters.
    fn is_proper(&self) -> bool;

    /// Whether all natural parameters are zero.
    fn is_uniform(&self) -> bool;
}
