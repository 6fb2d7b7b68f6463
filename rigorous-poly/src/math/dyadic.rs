use std::cmp::Ordering;
use std::fmt;
use std::fmt::Formatter;
use std::ops::Add;
use std::ops::AddAssign;
use std::ops::Mul;
use std::ops::Neg;
use std::ops::Sub;

use arbitrary::Arbitrary;
use arbitrary::Unstructured;
use get_size2::GetSize;
use num_bigint::BigInt;
use num_bigint::BigUint;
use num_bigint::Sign;
use num_traits::One;
use num_traits::Signed;
use num_traits::ToPrimitive;
use num_traits::Zero;
use num_traits::float::FloatCore;
use serde::Deserialize;
use serde::Serialize;

/// An exact binary fraction `mantissa · 2^exponent`.
///
/// Always kept in canonical form: the mantissa is odd, or both the mantissa and
/// the exponent are zero. Structural and numerical equality therefore coincide.
///
/// All of `+`, `-`, `*` are exact. Rounding happens only through the explicit
/// methods, which say in which direction they round.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(BigInt, i64)", into = "(BigInt, i64)")]
pub struct Dyadic {
    mantissa: BigInt,
    exponent: i64,
}

impl Dyadic {
    pub fn new(mantissa: BigInt, exponent: i64) -> Self {
        let mut dyadic = Self { mantissa, exponent };
        dyadic.canonize();
        dyadic
    }

    pub fn power_of_two(exponent: i64) -> Self {
        Self {
            mantissa: BigInt::one(),
            exponent,
        }
    }

    /// The exact value of a finite float. `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }

        let (mantissa, exponent, sign) = FloatCore::integer_decode(value);
        let mantissa = BigInt::from(mantissa) * BigInt::from(sign);
        Some(Self::new(mantissa, exponent.into()))
    }

    fn canonize(&mut self) {
        match self.mantissa.trailing_zeros() {
            None => self.exponent = 0,
            Some(0) => (),
            Some(zeros) => {
                self.mantissa >>= zeros;
                self.exponent += zeros as i64;
            }
        }
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    /// `-1`, `0`, or `1`, depending on the sign of `self`.
    #[must_use]
    pub fn signum(&self) -> Self {
        Self::from(self.mantissa.signum())
    }

    #[must_use]
    pub fn abs(&self) -> Self {
        Self {
            mantissa: self.mantissa.abs(),
            exponent: self.exponent,
        }
    }

    /// The least `t` such that `|self| < 2^t`. `None` if (and only if) `self`
    /// is zero.
    pub fn magnitude_exponent(&self) -> Option<i64> {
        if self.is_zero() {
            return None;
        }

        Some(self.exponent + self.mantissa.bits() as i64)
    }

    /// A lossy conversion, meant for display purposes only.
    pub fn to_f64(&self) -> f64 {
        let bits = self.mantissa.bits();
        let shift = bits.saturating_sub(64);
        let head = (&self.mantissa >> shift).to_f64().unwrap_or_default();
        let exponent = self
            .exponent
            .saturating_add(shift as i64)
            .clamp(i32::MIN.into(), i32::MAX.into()) as i32;

        // split the scaling to avoid spurious under- and overflow
        let half = exponent / 2;
        head * 2_f64.powi(half) * 2_f64.powi(exponent - half)
    }

    /// Round toward zero to at most `precision` bits of mantissa.
    ///
    /// Returns the rounded value and a bound on the rounding error, which is
    /// zero if (and only if) no rounding was necessary.
    pub fn round_with_error(&self, precision: u64) -> (Self, Self) {
        let bits = self.mantissa.bits();
        if bits <= precision {
            return (self.clone(), Self::zero());
        }

        let shift = bits - precision;
        let truncated = self.mantissa.magnitude() >> shift;
        let exponent = self.exponent + shift as i64;
        let rounded = Self::new(BigInt::from_biguint(self.mantissa.sign(), truncated), exponent);

        (rounded, Self::power_of_two(exponent))
    }

    /// The smallest number with at most `precision` bits of mantissa that is
    /// greater than or equal to `self`. Only meaningful for non-negative
    /// numbers.
    #[must_use]
    pub fn round_up(&self, precision: u64) -> Self {
        debug_assert!(!self.is_negative(), "can only round up non-negative numbers");

        let bits = self.mantissa.bits();
        if bits <= precision {
            return self.clone();
        }

        let shift = bits - precision;
        let magnitude = self.mantissa.magnitude();
        let mut truncated = magnitude >> shift;
        if &truncated << shift != *magnitude {
            truncated += 1_u32;
        }

        Self::new(truncated.into(), self.exponent + shift as i64)
    }

    /// An upper bound on `self / divisor` with at most `precision` bits of
    /// mantissa. Only meaningful for non-negative `self` and positive
    /// `divisor`.
    ///
    /// # Panics
    ///
    /// Panics if the divisor is zero.
    #[must_use]
    pub fn div_round_up(&self, divisor: &Self, precision: u64) -> Self {
        assert!(!divisor.is_zero(), "cannot divide by zero");
        debug_assert!(!self.is_negative() && !divisor.is_negative());

        if self.is_zero() {
            return Self::zero();
        }

        let numerator = self.mantissa.magnitude();
        let denominator = divisor.mantissa.magnitude();
        let shift = (precision + denominator.bits()).saturating_sub(numerator.bits()) + 1;

        let numerator = numerator << shift;
        let mut quotient = &numerator / denominator;
        if !(&numerator % denominator).is_zero() {
            quotient += 1_u32;
        }

        let exponent = self.exponent - divisor.exponent - shift as i64;
        Self::new(quotient.into(), exponent).round_up(precision)
    }

    /// An approximation of `1 / self` with at most `precision` bits of
    /// mantissa, together with a bound on the approximation error. The error
    /// bound is zero if the inverse is representable exactly.
    ///
    /// `None` if `self` is zero.
    pub fn inverse_with_error(&self, precision: u64) -> Option<(Self, Self)> {
        if self.is_zero() {
            return None;
        }

        // 1 / (m·2^e) = (2^s / m) · 2^(-s-e)
        let magnitude = self.mantissa.magnitude();
        let shift = precision + magnitude.bits();
        let numerator = BigUint::one() << shift;
        let quotient = &numerator / magnitude;
        let is_exact = (&numerator % magnitude).is_zero();

        let exponent = -(shift as i64) - self.exponent;
        let approximation = Self::new(BigInt::from_biguint(self.mantissa.sign(), quotient), exponent);
        let division_error = if is_exact {
            Self::zero()
        } else {
            Self::power_of_two(exponent)
        };

        let (inverse, rounding_error) = approximation.round_with_error(precision);
        Some((inverse, division_error + rounding_error))
    }
}

impl Zero for Dyadic {
    fn zero() -> Self {
        Self {
            mantissa: BigInt::zero(),
            exponent: 0,
        }
    }

    fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }
}

impl One for Dyadic {
    fn one() -> Self {
        Self::power_of_two(0)
    }

    fn is_one(&self) -> bool {
        self.mantissa.is_one() && self.exponent == 0
    }
}

impl GetSize for Dyadic {
    fn get_heap_size(&self) -> usize {
        let num_limbs = self.mantissa.bits().div_ceil(u64::BITS.into()) as usize;
        num_limbs * size_of::<u64>()
    }
}

impl<'a> Arbitrary<'a> for Dyadic {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let mantissa: i64 = u.arbitrary()?;
        let exponent = u.int_in_range(-64..=64)?;
        Ok(Self::new(mantissa.into(), exponent))
    }
}

impl From<(BigInt, i64)> for Dyadic {
    fn from((mantissa, exponent): (BigInt, i64)) -> Self {
        Self::new(mantissa, exponent)
    }
}

impl From<Dyadic> for (BigInt, i64) {
    fn from(dyadic: Dyadic) -> Self {
        (dyadic.mantissa, dyadic.exponent)
    }
}

impl From<BigInt> for Dyadic {
    fn from(value: BigInt) -> Self {
        Self::new(value, 0)
    }
}

macro_rules! impl_from_primitive_for_dyadic {
    ($($t:ty),*) => {$(
        impl From<$t> for Dyadic {
            fn from(value: $t) -> Self {
                Self::new(BigInt::from(value), 0)
            }
        }
    )*};
}

impl_from_primitive_for_dyadic!(i32, i64, u32, u64);

impl PartialOrd for Dyadic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dyadic {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self - other).mantissa.sign() {
            Sign::Minus => Ordering::Less,
            Sign::NoSign => Ordering::Equal,
            Sign::Plus => Ordering::Greater,
        }
    }
}

impl fmt::Debug for Dyadic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}·2^{}", self.mantissa, self.exponent)
    }
}

impl fmt::Display for Dyadic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

/// Both summands' mantissas, shifted to the smaller of the two exponents.
fn aligned_mantissas(lhs: &Dyadic, rhs: &Dyadic) -> (BigInt, BigInt, i64) {
    let exponent = lhs.exponent.min(rhs.exponent);
    let lhs_mantissa = &lhs.mantissa << (lhs.exponent - exponent) as u64;
    let rhs_mantissa = &rhs.mantissa << (rhs.exponent - exponent) as u64;
    (lhs_mantissa, rhs_mantissa, exponent)
}

impl Add<&Dyadic> for &Dyadic {
    type Output = Dyadic;

    fn add(self, rhs: &Dyadic) -> Dyadic {
        if self.is_zero() {
            return rhs.clone();
        }
        if rhs.is_zero() {
            return self.clone();
        }

        let (lhs, rhs, exponent) = aligned_mantissas(self, rhs);
        Dyadic::new(lhs + rhs, exponent)
    }
}

impl Add for Dyadic {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        &self + &rhs
    }
}

impl AddAssign<&Dyadic> for Dyadic {
    fn add_assign(&mut self, rhs: &Dyadic) {
        *self = &*self + rhs;
    }
}

impl Sub<&Dyadic> for &Dyadic {
    type Output = Dyadic;

    fn sub(self, rhs: &Dyadic) -> Dyadic {
        if rhs.is_zero() {
            return self.clone();
        }
        if self.is_zero() {
            return -rhs;
        }

        let (lhs, rhs, exponent) = aligned_mantissas(self, rhs);
        Dyadic::new(lhs - rhs, exponent)
    }
}

impl Sub for Dyadic {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        &self - &rhs
    }
}

impl Mul<&Dyadic> for &Dyadic {
    type Output = Dyadic;

    fn mul(self, rhs: &Dyadic) -> Dyadic {
        Dyadic::new(&self.mantissa * &rhs.mantissa, self.exponent + rhs.exponent)
    }
}

impl Mul for Dyadic {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        &self * &rhs
    }
}

impl Neg for &Dyadic {
    type Output = Dyadic;

    fn neg(self) -> Dyadic {
        Dyadic {
            mantissa: -&self.mantissa,
            exponent: self.exponent,
        }
    }
}

impl Neg for Dyadic {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            mantissa: -self.mantissa,
            exponent: self.exponent,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;
    use test_strategy::proptest;

    use super::*;

    impl proptest::arbitrary::Arbitrary for Dyadic {
        type Parameters = ();

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            arb().boxed()
        }

        type Strategy = BoxedStrategy<Self>;
    }

    #[test]
    fn construction_canonizes() {
        let six_eighths = Dyadic::new(6.into(), -3);
        let three_quarters = Dyadic::new(3.into(), -2);
        assert_eq!(three_quarters, six_eighths);
        assert_eq!(-2, six_eighths.exponent());

        let zero = Dyadic::new(0.into(), 17);
        assert_eq!(Dyadic::zero(), zero);
        assert_eq!(0, zero.exponent());
    }

    #[test]
    fn floats_are_converted_exactly() {
        assert_eq!(Some(Dyadic::new(3.into(), -2)), Dyadic::from_f64(0.75));
        assert_eq!(Some(Dyadic::new((-5).into(), 0)), Dyadic::from_f64(-5.0));
        assert_eq!(Some(Dyadic::zero()), Dyadic::from_f64(0.0));
        assert_eq!(None, Dyadic::from_f64(f64::NAN));
        assert_eq!(None, Dyadic::from_f64(f64::NEG_INFINITY));
    }

    #[proptest]
    fn float_conversion_round_trips(#[filter(#x.is_finite())] x: f64) {
        let dyadic = Dyadic::from_f64(x).unwrap();
        prop_assert_eq!(x, dyadic.to_f64());
    }

    #[proptest]
    fn addition_and_subtraction_are_inverse(a: Dyadic, b: Dyadic) {
        prop_assert_eq!(a.clone(), &(&a + &b) - &b);
    }

    #[proptest]
    fn multiplication_distributes_over_addition(a: Dyadic, b: Dyadic, c: Dyadic) {
        prop_assert_eq!(&a * &(&b + &c), &(&a * &b) + &(&a * &c));
    }

    #[proptest]
    fn ordering_agrees_with_integers(a: i32, b: i32) {
        prop_assert_eq!(a.cmp(&b), Dyadic::from(a).cmp(&Dyadic::from(b)));
    }

    #[proptest]
    fn signum_agrees_with_integers(a: i64) {
        prop_assert_eq!(Dyadic::from(a.signum()), Dyadic::from(a).signum());
    }

    #[proptest]
    fn magnitude_exponent_bounds_magnitude(#[filter(!#a.is_zero())] a: Dyadic) {
        let t = a.magnitude_exponent().unwrap();
        prop_assert!(a.abs() < Dyadic::power_of_two(t));
        prop_assert!(a.abs() >= Dyadic::power_of_two(t - 1));
    }

    #[proptest]
    fn rounding_error_bound_is_respected(a: Dyadic, #[strategy(1_u64..70)] precision: u64) {
        let (rounded, error) = a.round_with_error(precision);
        prop_assert!(rounded.mantissa().bits() <= precision);
        prop_assert!((&a - &rounded).abs() <= error);
        prop_assert!(rounded.abs() <= a.abs());
    }

    #[proptest]
    fn rounding_up_never_decreases(a: Dyadic, #[strategy(1_u64..70)] precision: u64) {
        let a = a.abs();
        let rounded = a.round_up(precision);
        prop_assert!(rounded.mantissa().bits() <= precision);
        prop_assert!(rounded >= a);
    }

    #[proptest]
    fn division_rounding_up_gives_upper_bound(
        a: Dyadic,
        #[filter(!#b.is_zero())] b: Dyadic,
        #[strategy(2_u64..70)] precision: u64,
    ) {
        let (a, b) = (a.abs(), b.abs());
        let quotient = a.div_round_up(&b, precision);
        prop_assert!(&quotient * &b >= a);
    }

    #[proptest]
    fn inverse_error_bound_is_respected(
        #[filter(!#a.is_zero())] a: Dyadic,
        #[strategy(2_u64..200)] precision: u64,
    ) {
        let (inverse, error) = a.inverse_with_error(precision).unwrap();

        // |1/a - y| ≤ err  ⟺  |1 - a·y| ≤ |a|·err
        let defect = (&Dyadic::one() - &(&a * &inverse)).abs();
        prop_assert!(defect <= &a.abs() * &error);
    }

    #[test]
    fn inverse_of_power_of_two_is_exact() {
        let (inverse, error) = Dyadic::power_of_two(-5).inverse_with_error(53).unwrap();
        assert_eq!(Dyadic::power_of_two(5), inverse);
        assert!(error.is_zero());
    }

    #[test]
    fn zero_has_no_inverse() {
        assert!(Dyadic::zero().inverse_with_error(53).is_none());
    }

    #[proptest]
    fn serialization_and_deserialization_to_and_from_json_is_identity(a: Dyadic) {
        let serialized = serde_json::to_string(&a).unwrap();
        let deserialized: Dyadic = serde_json::from_str(&serialized).unwrap();
        prop_assert_eq!(a, deserialized);
    }

    #[test]
    fn deserialization_canonizes() {
        let non_canonical = serde_json::to_string(&(BigInt::from(12), -2_i64)).unwrap();
        let deserialized: Dyadic = serde_json::from_str(&non_canonical).unwrap();
        assert_eq!(Dyadic::from(3), deserialized);
    }
}
