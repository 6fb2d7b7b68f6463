use std::fmt::Display;
use std::fmt::Formatter;
use std::ops::Neg;

use arbitrary::Arbitrary;
use get_size2::GetSize;
use itertools::EitherOrBoth;
use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;

use crate::error::PolynomialDivisionError;
use crate::math::ball::Ball;
use crate::math::multiplication::mullow_into;
use crate::math::series::div_series_into;
use crate::math::series::inv_series_into;

/// A univariate polynomial with [`Ball`] coefficients.
///
/// Every coefficient is an enclosure of some real number, and the polynomial
/// represents the set of real polynomials with coefficients in those
/// enclosures. Arithmetic is rigorous: the result of every operation encloses
/// the result of the operation on all represented polynomials.
///
/// Equality is structural. In particular, a stored leading coefficient that
/// contains zero is kept, because it carries information about the possible
/// degree. Use [`normalize`](Self::normalize) to trim such coefficients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Arbitrary, GetSize)]
pub struct BallPolynomial {
    /// The polynomial's coefficients, in order of increasing degree. That is,
    /// the leading coefficient is `coefficients.last()`.
    pub coefficients: Vec<Ball>,
}

impl Display for BallPolynomial {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.coefficients.iter().all(Ball::is_zero) {
            return write!(f, "0");
        }

        let mut is_first_term = true;
        for (pow, coeff) in self.coefficients.iter().enumerate().rev() {
            if coeff.is_zero() {
                continue;
            }

            if !is_first_term {
                write!(f, " + ")?;
            }
            is_first_term = false;

            if *coeff != Ball::one() || pow == 0 {
                write!(f, "{coeff}")?;
            }
            match pow {
                0 => (),
                1 => write!(f, "x")?,
                _ => write!(f, "x^{pow}")?,
            }
        }

        Ok(())
    }
}

impl Neg for BallPolynomial {
    type Output = Self;

    fn neg(self) -> Self::Output {
        let coefficients = self.coefficients.into_iter().map(Neg::neg).collect();
        Self::new(coefficients)
    }
}

impl Neg for &BallPolynomial {
    type Output = BallPolynomial;

    fn neg(self) -> Self::Output {
        let coefficients = self.coefficients.iter().map(Neg::neg).collect();
        BallPolynomial::new(coefficients)
    }
}

impl<E: Into<Ball>, const N: usize> From<[E; N]> for BallPolynomial {
    fn from(coefficients: [E; N]) -> Self {
        Self::new(coefficients.into_iter().map(Into::into).collect())
    }
}

impl<E: Into<Ball>> From<Vec<E>> for BallPolynomial {
    fn from(coefficients: Vec<E>) -> Self {
        Self::new(coefficients.into_iter().map(Into::into).collect())
    }
}

impl<E: Into<Ball> + Clone> From<&[E]> for BallPolynomial {
    fn from(coefficients: &[E]) -> Self {
        Self::new(coefficients.iter().cloned().map(Into::into).collect())
    }
}

impl BallPolynomial {
    pub const fn new(coefficients: Vec<Ball>) -> Self {
        Self { coefficients }
    }

    /// The polynomial without any coefficients.
    pub const fn zero() -> Self {
        Self::new(vec![])
    }

    pub fn one() -> Self {
        Self::from_constant(Ball::one())
    }

    pub fn from_constant(constant: Ball) -> Self {
        Self::new(vec![constant])
    }

    /// The number of stored coefficients, including leading coefficients
    /// that contain zero.
    pub fn length(&self) -> usize {
        self.coefficients.len()
    }

    /// The nominal degree, _i.e._, `length - 1`. `-1` for the polynomial
    /// without coefficients.
    pub fn degree(&self) -> isize {
        self.coefficients.len() as isize - 1
    }

    /// Whether `self` has no coefficients. Polynomials whose coefficients are
    /// all exact zeros are not considered zero; [normalize](Self::normalize)
    /// them first.
    pub fn is_zero(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// The stored coefficient of the term of highest power. `None` if (and
    /// only if) `self` [is zero](Self::is_zero). Might contain zero unless
    /// `self` [is normalized](Self::is_normalized).
    pub fn leading_coefficient(&self) -> Option<&Ball> {
        self.coefficients.last()
    }

    /// Removes all leading coefficients that contain zero.
    pub fn normalize(&mut self) {
        while self.coefficients.last().is_some_and(Ball::contains_zero) {
            self.coefficients.pop();
        }
    }

    /// Whether `self` is zero or its leading coefficient does not contain zero.
    pub fn is_normalized(&self) -> bool {
        self.leading_coefficient()
            .is_none_or(|coefficient| !coefficient.contains_zero())
    }

    /// Makes room for at least `length` coefficients without reallocating.
    /// Does not change the polynomial.
    pub fn fit_length(&mut self, length: usize) {
        let additional = length.saturating_sub(self.coefficients.len());
        self.coefficients.reserve(additional);
    }

    /// Sets the number of stored coefficients, padding with exact zeros or
    /// dropping coefficients of high degree.
    pub(crate) fn set_length(&mut self, length: usize) {
        self.fit_length(length);
        self.coefficients.resize(length, Ball::zero());
    }

    /// `self mod x^n`
    pub fn truncate_to(&self, n: usize) -> Self {
        let num_coefficients_to_retain = n.min(self.coefficients.len());
        Self::new(self.coefficients[..num_coefficients_to_retain].to_vec())
    }

    /// Evaluates `self` at `x`, using Horner's method. The result encloses the
    /// values of all represented polynomials at all points of `x`.
    pub fn evaluate(&self, x: &Ball, precision: u64) -> Ball {
        let mut acc = Ball::zero();
        for c in self.coefficients.iter().rev() {
            acc = c.add(&x.mul(&acc, precision), precision);
        }

        acc
    }

    pub fn add(&self, other: &Self, precision: u64) -> Self {
        let coefficients = self
            .coefficients
            .iter()
            .zip_longest(&other.coefficients)
            .map(|pair| match pair {
                EitherOrBoth::Both(l, r) => l.add(r, precision),
                EitherOrBoth::Left(l) => l.rounded(precision),
                EitherOrBoth::Right(r) => r.rounded(precision),
            })
            .collect();

        Self::new(coefficients)
    }

    pub fn sub(&self, other: &Self, precision: u64) -> Self {
        let coefficients = self
            .coefficients
            .iter()
            .zip_longest(&other.coefficients)
            .map(|pair| match pair {
                EitherOrBoth::Both(l, r) => l.sub(r, precision),
                EitherOrBoth::Left(l) => l.rounded(precision),
                EitherOrBoth::Right(r) => (-r).rounded(precision),
            })
            .collect();

        Self::new(coefficients)
    }

    /// The full product of `self` and `other`.
    pub fn mul(&self, other: &Self, precision: u64) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }

        let product_length = self.length() + other.length() - 1;
        self.mullow(other, product_length, precision)
    }

    /// `(self · other) mod x^n`
    pub fn mullow(&self, other: &Self, n: usize, precision: u64) -> Self {
        let (longer, shorter) = if self.length() >= other.length() {
            (self, other)
        } else {
            (other, self)
        };

        let mut product = vec![Ball::zero(); n];
        mullow_into(
            &mut product,
            &longer.coefficients,
            &shorter.coefficients,
            precision,
        );
        Self::new(product)
    }

    /// The first `n` coefficients of the power series `1 / self`.
    ///
    /// # Errors
    ///
    /// Returns [`PolynomialDivisionError::DivisionByZero`] if `self` is
    /// [zero](Self::is_zero) or its constant term contains zero.
    pub fn inv_series(&self, n: usize, precision: u64) -> Result<Self, PolynomialDivisionError> {
        let mut inverse = vec![Ball::zero(); n];
        inv_series_into(&mut inverse, &self.coefficients, precision)?;

        Ok(Self::new(inverse))
    }

    /// The first `n` coefficients of the power series `self / denominator`.
    ///
    /// # Errors
    ///
    /// Returns [`PolynomialDivisionError::DivisionByZero`] if `denominator`
    /// is [zero](Self::is_zero) or its constant term contains zero.
    pub fn div_series(
        &self,
        denominator: &Self,
        n: usize,
        precision: u64,
    ) -> Result<Self, PolynomialDivisionError> {
        let mut quotient = vec![Ball::zero(); n];
        div_series_into(
            &mut quotient,
            &self.coefficients,
            &denominator.coefficients,
            precision,
        )?;

        Ok(Self::new(quotient))
    }

    /// Whether every polynomial represented by `other` is also represented by
    /// `self`. Missing coefficients are exact zeros.
    pub fn contains(&self, other: &Self) -> bool {
        self.coefficient_pairs(other)
            .all(|(own, others)| own.contains_ball(&others))
    }

    /// Whether `self` and `other` represent at least one common polynomial.
    /// Missing coefficients are exact zeros.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.coefficient_pairs(other)
            .all(|(own, others)| own.overlaps(&others))
    }

    fn coefficient_pairs<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = (Ball, Ball)> + 'a {
        self.coefficients
            .iter()
            .zip_longest(&other.coefficients)
            .map(|pair| match pair {
                EitherOrBoth::Both(l, r) => (l.clone(), r.clone()),
                EitherOrBoth::Left(l) => (l.clone(), Ball::zero()),
                EitherOrBoth::Right(r) => (Ball::zero(), r.clone()),
            })
    }
}
