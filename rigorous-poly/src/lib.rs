#![deny(clippy::shadow_unrelated)]

//! Rigorous division with remainder of polynomials whose coefficients are
//! real-number enclosures ("balls").
//!
//! The central type is [`BallPolynomial`](prelude::BallPolynomial). Its
//! arithmetic takes an explicit working precision, in bits, and the results
//! enclose the exact results for every polynomial the operands represent.
//!
//! ```
//! use rigorous_poly::prelude::*;
//!
//! // (x^2 + 3x + 2) = (x + 1)·(x + 2) + 0
//! let dividend = BallPolynomial::from([2, 3, 1]);
//! let divisor = BallPolynomial::from([1, 1]);
//! let (quotient, remainder) = dividend.divide(&divisor, 64).unwrap();
//! assert_eq!(BallPolynomial::from([2, 1]), quotient);
//! assert!(remainder.is_zero());
//! ```

pub mod config;
pub mod error;
pub mod math;
pub mod prelude;
