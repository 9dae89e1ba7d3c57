//! Defines the `Error` type for the herald library

use std::error::Error;
use std::fmt;
use std::result;

pub type Result<T> = result::Result<T, HeraldError>;

#[derive(Clone, Debug, PartialEq)]
pub enum HeraldError {
    /// A distribution that cannot be normalized where a proper one was required.
    /// Ratios of messages legitimately produce improper distributions; asking an
    /// improper distribution for moments is the error.
    ImproperDistribution,

    /// A parameter outside the domain of the distribution or factor, with a
    /// description of the offending argument
    InvalidParameter(String),

    /// Array or support dimensions that do not line up
    DimensionMismatch,

    /// A matrix that was expected to be symmetric positive definite but is not
    NotPositiveDefinite,

    /// A string message whose support is empty after combining beliefs
    EmptySupport,

    /// Exactly what it sounds like
    DivideByZero,

    /// A general error with the given description
    General(String),
}

impl HeraldError {
    fn describe(&self) -> &str {
        match self {
            HeraldError::ImproperDistribution => "Distribution is improper; moments are undefined",
            HeraldError::InvalidParameter(ref what) => what.as_str(),
            HeraldError::DimensionMismatch => "Dimensions do not match",
            HeraldError::NotPositiveDefinite => "Matrix is not symmetric positive definite",
            HeraldError::EmptySupport => "Message support is empty",
            HeraldError::DivideByZero => "Encountered division by zero",
            HeraldError::General(ref err) => err.as_str(),
        }
    }
}

impl Error for HeraldError {}

impl fmt::Display for HeraldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
