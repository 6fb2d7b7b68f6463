pub use crate::config::set_kronecker_multiplication_cutoff;
pub use crate::error::BallConversionError;
pub use crate::error::PolynomialDivisionError;
pub use crate::math::ball::Ball;
pub use crate::math::dyadic::Dyadic;
pub use crate::math::other::random_elements;
pub use crate::math::polynomial::BallPolynomial;
