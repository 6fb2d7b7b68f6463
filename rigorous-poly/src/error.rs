use thiserror::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Error)]
#[non_exhaustive]
pub enum PolynomialDivisionError {
    /// The divisor is empty, or the enclosure of its leading coefficient (or,
    /// for power series, of its constant coefficient) contains zero. Its
    /// invertibility cannot be certified at the requested precision.
    #[error("division by zero: divisor's leading coefficient contains zero")]
    DivisionByZero,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Error)]
#[non_exhaustive]
pub enum BallConversionError {
    #[error("cannot enclose a non-finite floating-point value")]
    NotFinite,

    #[error("the radius of a ball must be non-negative")]
    NegativeRadius,
}
