//! Performance tuning. The only option is the operand length at which
//! truncated multiplication switches to Kronecker substitution; it never
//! changes which numbers a result encloses.
//!
//! The option can also be set via the environment variable
//! `RIGOROUS_POLY_KRONECKER_CUTOFF`, which takes precedence over
//! [`set_kronecker_multiplication_cutoff`].

use std::cell::RefCell;

use arbitrary::Arbitrary;

thread_local! {
    static CONFIG: RefCell<Config> = RefCell::new(Config::new());
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Arbitrary)]
struct Config {
    pub kronecker_multiplication_cutoff: KroneckerMultiplicationCutoff,
}

impl Config {
    fn new() -> Self {
        let kronecker_multiplication_cutoff = KroneckerMultiplicationCutoff::new(None);

        Self {
            kronecker_multiplication_cutoff,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Arbitrary)]
struct KroneckerMultiplicationCutoff(usize);

impl KroneckerMultiplicationCutoff {
    const ENV_VAR: &'static str = "RIGOROUS_POLY_KRONECKER_CUTOFF";
    const DEFAULT: usize = 24;
    const MINIMUM: usize = 1;

    /// Creates a new `KroneckerMultiplicationCutoff` with the given value.
    /// Respects the precedence of the environment variable if set. Uses the
    /// default if no value is provided.
    fn new(config_value: Option<usize>) -> Self {
        let cutoff = std::env::var(Self::ENV_VAR)
            .ok()
            .and_then(|s| s.parse().ok())
            .or(config_value)
            .unwrap_or(Self::DEFAULT)
            .max(Self::MINIMUM);

        Self(cutoff)
    }
}

/// Sets the cutoff for multiplying ball polynomials via Kronecker
/// substitution.
///
/// For example, if the cutoff is set to 24, then a truncated product is
/// computed with the schoolbook method whenever one of the operands, or the
/// number of requested coefficients, is shorter than 24. Otherwise, the
/// midpoints and radii are packed into big integers and multiplied with a
/// single subquadratic integer multiplication.
///
/// Can also be set via the environment variable
/// `RIGOROUS_POLY_KRONECKER_CUTOFF`. The environment variable has higher
/// precedence than this function.
///
/// The default is 24. The minimum is always 1. The setting is thread-local.
pub fn set_kronecker_multiplication_cutoff(cutoff: usize) {
    let cutoff = KroneckerMultiplicationCutoff::new(Some(cutoff));
    CONFIG.with(|c| c.borrow_mut().kronecker_multiplication_cutoff = cutoff);
}

pub(crate) fn kronecker_multiplication_cutoff() -> usize {
    CONFIG
        .with(|c| c.borrow().kronecker_multiplication_cutoff)
        .0
}
