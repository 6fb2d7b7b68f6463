//! Division with remainder of ball polynomials.
//!
//! The quotient of `A` by `B` is found via the reversed polynomials: with
//! `rev_k(P)(x) = x^k·P(1/x)`, the reversed quotient is the power series
//! quotient `rev(A) / rev(B)` truncated to the quotient's length. The leading
//! coefficient of `B` becomes the constant term of `rev(B)`, so the division is
//! well defined exactly when that coefficient is certified nonzero. The
//! remainder follows as `A - Q·B`, of which only the low coefficients are
//! computed.
//!
//! The routines operating on slices expect their inputs to satisfy the
//! length conditions; [`BallPolynomial::divrem_into`] and friends check the
//! divisor and size the outputs.

use tracing::debug;
use tracing::trace;

use crate::error::PolynomialDivisionError;
use crate::math::ball::Ball;
use crate::math::multiplication::mullow_into;
use crate::math::polynomial::BallPolynomial;
use crate::math::series::div_series_into;

/// Writes `source` in reverse order into the top of `destination`, padding the
/// bottom with exact zeros.
pub(crate) fn reverse_into(destination: &mut [Ball], source: &[Ball]) {
    debug_assert!(source.len() <= destination.len());

    let (padding, reversed) = destination.split_at_mut(destination.len() - source.len());
    padding.fill(Ball::zero());
    for (slot, coefficient) in reversed.iter_mut().zip(source.iter().rev()) {
        slot.clone_from(coefficient);
    }
}

/// Reverses the buffer whose first `len` coefficients are meaningful,
/// leaving them at the top and exact zeros below.
pub(crate) fn reverse_in_place(coefficients: &mut [Ball], len: usize) {
    debug_assert!(len <= coefficients.len());

    // the padding overwrites slots that hold meaningful coefficients until swapped
    coefficients.reverse();
    let padding = coefficients.len() - len;
    coefficients[..padding].fill(Ball::zero());
}

/// Writes the quotient of `dividend` by `divisor` into `quotient`, which must
/// have length `dividend.len() - divisor.len() + 1`.
pub(crate) fn div_into(
    quotient: &mut [Ball],
    dividend: &[Ball],
    divisor: &[Ball],
    precision: u64,
) -> Result<(), PolynomialDivisionError> {
    let quotient_len = quotient.len();
    debug_assert!(!divisor.is_empty());
    debug_assert_eq!(dividend.len() + 1, divisor.len() + quotient_len);

    let mut scratch = vec![Ball::zero(); 2 * quotient_len];
    let (dividend_reversed, divisor_reversed) = scratch.split_at_mut(quotient_len);
    reverse_into(dividend_reversed, &dividend[dividend.len() - quotient_len..]);
    if divisor.len() >= quotient_len {
        reverse_into(divisor_reversed, &divisor[divisor.len() - quotient_len..]);
    } else {
        let (reversed, padding) = divisor_reversed.split_at_mut(divisor.len());
        reverse_into(reversed, divisor);
        padding.fill(Ball::zero());
    }

    div_series_into(quotient, dividend_reversed, divisor_reversed, precision)?;
    reverse_in_place(quotient, quotient_len);

    Ok(())
}

/// Writes quotient and remainder of `dividend` by `divisor` into the given
/// buffers. The remainder buffer must have length `divisor.len() - 1` and is
/// left untouched if that is zero.
pub(crate) fn divrem_into(
    quotient: &mut [Ball],
    remainder: &mut [Ball],
    dividend: &[Ball],
    divisor: &[Ball],
    precision: u64,
) -> Result<(), PolynomialDivisionError> {
    div_into(quotient, dividend, divisor, precision)?;

    let remainder_len = divisor.len() - 1;
    if remainder_len == 0 {
        return Ok(());
    }
    debug_assert_eq!(remainder_len, remainder.len());

    // R = A - Q·B, and only the low coefficients of Q·B are needed. The longer
    // operand goes first; the order affects speed, not the result.
    let divisor_low = &divisor[..remainder_len];
    if quotient.len() >= remainder_len {
        mullow_into(remainder, quotient, divisor_low, precision);
    } else {
        mullow_into(remainder, divisor_low, quotient, precision);
    }
    for (coefficient, dividend_coefficient) in remainder.iter_mut().zip(dividend) {
        *coefficient = dividend_coefficient.sub(coefficient, precision);
    }

    Ok(())
}

/// Writes the remainder of `dividend` by `divisor` into `remainder`,
/// discarding the quotient.
pub(crate) fn rem_into(
    remainder: &mut [Ball],
    dividend: &[Ball],
    divisor: &[Ball],
    precision: u64,
) -> Result<(), PolynomialDivisionError> {
    let mut quotient = vec![Ball::zero(); dividend.len() + 1 - divisor.len()];
    divrem_into(&mut quotient, remainder, dividend, divisor, precision)
}

impl BallPolynomial {
    /// Computes quotient and remainder of `dividend` by `divisor`, such that
    /// `dividend - (quotient·divisor + remainder)` contains the zero polynomial
    /// and the remainder is shorter than the divisor.
    ///
    /// The results are written into `quotient` and `remainder`, reusing their
    /// allocations. The quotient has exactly `dividend.length() -
    /// divisor.length() + 1` coefficients and is not normalized; the remainder
    /// is normalized.
    ///
    /// # Errors
    ///
    /// Returns [`PolynomialDivisionError::DivisionByZero`] if the divisor is
    /// empty or its leading coefficient contains zero. Neither output is
    /// modified in that case.
    pub fn divrem_into(
        quotient: &mut Self,
        remainder: &mut Self,
        dividend: &Self,
        divisor: &Self,
        precision: u64,
    ) -> Result<(), PolynomialDivisionError> {
        divisor.ensure_invertible_leading_coefficient(precision)?;

        let dividend_len = dividend.length();
        let divisor_len = divisor.length();
        if dividend_len < divisor_len {
            trace!(dividend_len, divisor_len, "dividend shorter than divisor");
            quotient.coefficients.clear();
            remainder.clone_from(dividend);
            return Ok(());
        }

        quotient.set_length(dividend_len - divisor_len + 1);
        remainder.set_length(divisor_len - 1);
        divrem_into(
            &mut quotient.coefficients,
            &mut remainder.coefficients,
            &dividend.coefficients,
            &divisor.coefficients,
            precision,
        )?;
        remainder.normalize();

        Ok(())
    }

    /// Quotient and remainder of `self` by `divisor`.
    ///
    /// See [`BallPolynomial::divrem_into`] for the guarantees and errors.
    pub fn divide(
        &self,
        divisor: &Self,
        precision: u64,
    ) -> Result<(Self, Self), PolynomialDivisionError> {
        let mut quotient = Self::zero();
        let mut remainder = Self::zero();
        Self::divrem_into(&mut quotient, &mut remainder, self, divisor, precision)?;

        Ok((quotient, remainder))
    }

    /// The quotient of `self` by `divisor`.
    pub fn div(&self, divisor: &Self, precision: u64) -> Result<Self, PolynomialDivisionError> {
        let (quotient, _) = self.divide(divisor, precision)?;
        Ok(quotient)
    }

    /// The remainder of `self` by `divisor`. Normalized, unless `self` is
    /// shorter than `divisor`, in which case it is a copy of `self`.
    pub fn rem(&self, divisor: &Self, precision: u64) -> Result<Self, PolynomialDivisionError> {
        divisor.ensure_invertible_leading_coefficient(precision)?;
        if self.length() < divisor.length() {
            return Ok(self.clone());
        }

        let mut remainder = vec![Ball::zero(); divisor.length() - 1];
        rem_into(
            &mut remainder,
            &self.coefficients,
            &divisor.coefficients,
            precision,
        )?;
        let mut remainder = Self::new(remainder);
        remainder.normalize();

        Ok(remainder)
    }

    /// Replaces `self` by its quotient by `divisor` and returns the remainder.
    ///
    /// On error, `self` is unchanged.
    pub fn div_assign(
        &mut self,
        divisor: &Self,
        precision: u64,
    ) -> Result<Self, PolynomialDivisionError> {
        let (quotient, remainder) = self.divide(divisor, precision)?;
        *self = quotient;

        Ok(remainder)
    }

    /// Replaces `self` by its remainder by `divisor` and returns the quotient.
    ///
    /// On error, `self` is unchanged.
    pub fn rem_assign(
        &mut self,
        divisor: &Self,
        precision: u64,
    ) -> Result<Self, PolynomialDivisionError> {
        let (quotient, remainder) = self.divide(divisor, precision)?;
        *self = remainder;

        Ok(quotient)
    }

    /// Replaces `self`, the divisor, by the remainder of `dividend` by `self`
    /// and returns the quotient.
    ///
    /// On error, `self` is unchanged.
    pub fn reduce_assign(
        &mut self,
        dividend: &Self,
        precision: u64,
    ) -> Result<Self, PolynomialDivisionError> {
        let (quotient, remainder) = dividend.divide(self, precision)?;
        *self = remainder;

        Ok(quotient)
    }

    fn ensure_invertible_leading_coefficient(
        &self,
        precision: u64,
    ) -> Result<(), PolynomialDivisionError> {
        if self.leading_coefficient().is_some_and(|lc| !lc.contains_zero()) {
            return Ok(());
        }

        debug!(
            divisor_len = self.length(),
            precision, "divisor's leading coefficient contains zero"
        );
        Err(PolynomialDivisionError::DivisionByZero)
    }
}
