//! Power series inversion and division.

use crate::error::PolynomialDivisionError;
use crate::math::ball::Ball;
use crate::math::multiplication::mullow_into;

/// Below this number of requested coefficients, power series are inverted
/// with the quadratic recurrence instead of Newton iteration.
const NEWTON_CUTOFF: usize = 16;

/// Writes the first `inverse.len()` coefficients of the power series `1 / series`
/// into `inverse`.
///
/// Fails if `series` is empty or its constant term contains zero.
pub(crate) fn inv_series_into(
    inverse: &mut [Ball],
    series: &[Ball],
    precision: u64,
) -> Result<(), PolynomialDivisionError> {
    let constant_term = series
        .first()
        .ok_or(PolynomialDivisionError::DivisionByZero)?;
    let constant_inverse = constant_term
        .inverse(precision)
        .ok_or(PolynomialDivisionError::DivisionByZero)?;

    invert(inverse, series, &constant_inverse, precision);
    Ok(())
}

/// Writes the first `quotient.len()` coefficients of the power series
/// `numerator / denominator` into `quotient`.
///
/// Fails if `denominator` is empty or its constant term contains zero.
pub(crate) fn div_series_into(
    quotient: &mut [Ball],
    numerator: &[Ball],
    denominator: &[Ball],
    precision: u64,
) -> Result<(), PolynomialDivisionError> {
    let mut denominator_inverse = vec![Ball::zero(); quotient.len()];
    inv_series_into(&mut denominator_inverse, denominator, precision)?;
    mullow_into(quotient, &denominator_inverse, numerator, precision);

    Ok(())
}

fn invert(inverse: &mut [Ball], series: &[Ball], constant_inverse: &Ball, precision: u64) {
    let num_coefficients = inverse.len();
    if num_coefficients <= NEWTON_CUTOFF {
        invert_basecase(inverse, series, constant_inverse, precision);
        return;
    }

    // g ≡ 1/f mod x^m  ⇒  g - g·(f·g - 1) ≡ 1/f mod x^2m
    let half = num_coefficients.div_ceil(2);
    let (known, unknown) = inverse.split_at_mut(half);
    invert(known, series, constant_inverse, precision);

    let mut product = vec![Ball::zero(); num_coefficients];
    let series = &series[..series.len().min(num_coefficients)];
    mullow_into(&mut product, series, known, precision);

    // coefficients below `half` of f·g - 1 vanish
    let defect = &product[half..];
    let mut correction = vec![Ball::zero(); unknown.len()];
    mullow_into(&mut correction, known, defect, precision);
    for (coefficient, correction) in unknown.iter_mut().zip(correction) {
        *coefficient = -correction;
    }
}

fn invert_basecase(inverse: &mut [Ball], series: &[Ball], constant_inverse: &Ball, precision: u64) {
    if inverse.is_empty() {
        return;
    }

    inverse[0] = constant_inverse.clone();
    for k in 1..inverse.len() {
        let last = k.min(series.len() - 1);
        let terms = (1..=last).map(|i| (&series[i], &inverse[k - i]));
        let sum = Ball::dot(terms, precision);
        inverse[k] = -sum.mul(constant_inverse, precision);
    }
}
