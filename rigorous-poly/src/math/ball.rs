use std::fmt;
use std::fmt::Formatter;
use std::ops::Neg;

use arbitrary::Arbitrary;
use arbitrary::Unstructured;
use get_size2::GetSize;
use num_bigint::BigInt;
use num_traits::One;
use num_traits::Zero;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::StandardUniform;
use serde::Deserialize;
use serde::Serialize;

use crate::error::BallConversionError;
use crate::math::dyadic::Dyadic;

/// A rigorous enclosure of a real number: the closed interval
/// `[midpoint - radius, midpoint + radius]`.
///
/// Every arithmetic operation takes a working precision, the number of bits
/// the result's midpoint is rounded to. The rounding error is added to the
/// result's radius, so that the result always contains the exact result of
/// the operation applied to any representatives of the operands.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, GetSize)]
#[serde(try_from = "(Dyadic, Dyadic)", into = "(Dyadic, Dyadic)")]
pub struct Ball {
    midpoint: Dyadic,
    radius: Dyadic,
}

impl Ball {
    /// Radii are stored with this many bits of mantissa, always rounded up.
    pub const RADIUS_PRECISION: u64 = 30;

    /// Working precisions below this are raised to it.
    pub const MIN_PRECISION: u64 = 2;

    /// # Panics
    ///
    /// Panics if the radius is negative.
    pub fn new(midpoint: Dyadic, radius: Dyadic) -> Self {
        assert!(!radius.is_negative(), "radius must be non-negative");
        let radius = radius.round_up(Self::RADIUS_PRECISION);
        Self { midpoint, radius }
    }

    pub fn zero() -> Self {
        Self::exact(Dyadic::zero())
    }

    pub fn one() -> Self {
        Self::exact(Dyadic::one())
    }

    /// The ball of radius zero around `midpoint`.
    pub fn exact(midpoint: Dyadic) -> Self {
        Self {
            midpoint,
            radius: Dyadic::zero(),
        }
    }

    /// Combine an exact midpoint and an exact radius into a ball whose midpoint
    /// has at most `precision` bits, widening the radius by the rounding error.
    pub(crate) fn from_exact_parts(midpoint: Dyadic, radius: Dyadic, precision: u64) -> Self {
        let precision = precision.max(Self::MIN_PRECISION);
        let (midpoint, rounding_error) = midpoint.round_with_error(precision);
        let radius = (radius + rounding_error).round_up(Self::RADIUS_PRECISION);
        Self { midpoint, radius }
    }

    pub fn midpoint(&self) -> &Dyadic {
        &self.midpoint
    }

    pub fn radius(&self) -> &Dyadic {
        &self.radius
    }

    pub fn is_exact(&self) -> bool {
        self.radius.is_zero()
    }

    /// Whether this is the exact zero, _i.e._, the ball of radius zero around
    /// zero. See also [`Self::contains_zero`].
    pub fn is_zero(&self) -> bool {
        self.midpoint.is_zero() && self.is_exact()
    }

    pub fn contains_zero(&self) -> bool {
        self.midpoint.abs() <= self.radius
    }

    pub fn contains(&self, value: &Dyadic) -> bool {
        (&self.midpoint - value).abs() <= self.radius
    }

    /// Whether every number in `other` is also in `self`.
    pub fn contains_ball(&self, other: &Self) -> bool {
        &(&self.midpoint - &other.midpoint).abs() + &other.radius <= self.radius
    }

    /// Whether `self` and `other` have at least one number in common.
    pub fn overlaps(&self, other: &Self) -> bool {
        (&self.midpoint - &other.midpoint).abs() <= &self.radius + &other.radius
    }

    /// The ball with its midpoint rounded to `precision` bits.
    #[must_use]
    pub fn rounded(&self, precision: u64) -> Self {
        Self::from_exact_parts(self.midpoint.clone(), self.radius.clone(), precision)
    }

    #[must_use]
    pub fn add(&self, rhs: &Self, precision: u64) -> Self {
        let midpoint = &self.midpoint + &rhs.midpoint;
        let radius = &self.radius + &rhs.radius;
        Self::from_exact_parts(midpoint, radius, precision)
    }

    #[must_use]
    pub fn sub(&self, rhs: &Self, precision: u64) -> Self {
        let midpoint = &self.midpoint - &rhs.midpoint;
        let radius = &self.radius + &rhs.radius;
        Self::from_exact_parts(midpoint, radius, precision)
    }

    #[must_use]
    pub fn mul(&self, rhs: &Self, precision: u64) -> Self {
        let midpoint = &self.midpoint * &rhs.midpoint;
        let radius = self.product_radius(rhs);
        Self::from_exact_parts(midpoint, radius, precision)
    }

    /// The exact radius of the product of two balls,
    /// `|m|·s + r·|n| + r·s` for balls `m ± r` and `n ± s`.
    fn product_radius(&self, rhs: &Self) -> Dyadic {
        if self.is_exact() && rhs.is_exact() {
            return Dyadic::zero();
        }

        let lhs_part = &self.midpoint.abs() * &rhs.radius;
        let rhs_part = &self.radius * &(&rhs.midpoint.abs() + &rhs.radius);
        lhs_part + rhs_part
    }

    /// The sum of the pairwise products, rounded once at the end.
    ///
    /// Tighter than accumulating with [`Self::mul`] and [`Self::add`], since
    /// the midpoint is accumulated exactly.
    pub fn dot<'a, I>(terms: I, precision: u64) -> Self
    where
        I: IntoIterator<Item = (&'a Ball, &'a Ball)>,
    {
        let mut midpoint = Dyadic::zero();
        let mut radius = Dyadic::zero();
        for (lhs, rhs) in terms {
            midpoint += &(&lhs.midpoint * &rhs.midpoint);
            let product_radius = lhs.product_radius(rhs);
            if !product_radius.is_zero() {
                radius = (radius + product_radius).round_up(Self::RADIUS_PRECISION);
            }
        }

        Self::from_exact_parts(midpoint, radius, precision)
    }

    /// The multiplicative inverse, or `None` if `self` contains zero.
    ///
    /// For `m ± r` with `|m| > r`, every `1/y` with `|y - m| ≤ r` satisfies
    /// `|1/y - 1/m| ≤ r / (|m|·(|m| - r))`.
    pub fn inverse(&self, precision: u64) -> Option<Self> {
        if self.contains_zero() {
            return None;
        }

        let precision = precision.max(Self::MIN_PRECISION);
        let (midpoint, approximation_error) = self.midpoint.inverse_with_error(precision)?;
        if self.is_exact() {
            let radius = approximation_error.round_up(Self::RADIUS_PRECISION);
            return Some(Self { midpoint, radius });
        }

        let magnitude = self.midpoint.abs();
        let distance_from_zero = &magnitude - &self.radius;
        let denominator = &magnitude * &distance_from_zero;
        let propagated_error = self
            .radius
            .div_round_up(&denominator, Self::RADIUS_PRECISION);

        let radius = (approximation_error + propagated_error).round_up(Self::RADIUS_PRECISION);
        Some(Self { midpoint, radius })
    }
}

impl Neg for Ball {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            midpoint: -self.midpoint,
            radius: self.radius,
        }
    }
}

impl Neg for &Ball {
    type Output = Ball;

    fn neg(self) -> Ball {
        Ball {
            midpoint: -&self.midpoint,
            radius: self.radius.clone(),
        }
    }
}

impl From<Dyadic> for Ball {
    fn from(midpoint: Dyadic) -> Self {
        Self::exact(midpoint)
    }
}

macro_rules! impl_from_primitive_for_ball {
    ($($t:ty),*) => {$(
        impl From<$t> for Ball {
            fn from(value: $t) -> Self {
                Self::exact(Dyadic::from(value))
            }
        }
    )*};
}

impl_from_primitive_for_ball!(i32, i64, u32, u64);

impl TryFrom<(Dyadic, Dyadic)> for Ball {
    type Error = BallConversionError;

    /// The ball around the first element with the second element as its
    /// radius, rounded up.
    fn try_from((midpoint, radius): (Dyadic, Dyadic)) -> Result<Self, Self::Error> {
        if radius.is_negative() {
            return Err(BallConversionError::NegativeRadius);
        }

        Ok(Self::new(midpoint, radius))
    }
}

impl From<Ball> for (Dyadic, Dyadic) {
    fn from(ball: Ball) -> Self {
        (ball.midpoint, ball.radius)
    }
}

impl TryFrom<f64> for Ball {
    type Error = BallConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Dyadic::from_f64(value)
            .map(Self::exact)
            .ok_or(BallConversionError::NotFinite)
    }
}

impl<'a> Arbitrary<'a> for Ball {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let midpoint: Dyadic = u.arbitrary()?;
        if u.arbitrary()? {
            return Ok(Self::exact(midpoint));
        }

        // keep radii small relative to the midpoint, as in most computations
        let radius_mantissa: u16 = u.arbitrary()?;
        let radius_exponent = midpoint.magnitude_exponent().unwrap_or(0) - u.int_in_range(24..=80)?;
        let radius = Dyadic::new(radius_mantissa.into(), radius_exponent);
        Ok(Self::new(midpoint, radius))
    }
}

/// Samples exact balls with midpoints in (-1, 1), using 53 random bits.
impl Distribution<Ball> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Ball {
        let mantissa = rng.random_range(-(1_i64 << 53) + 1..(1_i64 << 53));
        Ball::exact(Dyadic::new(BigInt::from(mantissa), -53))
    }
}

impl fmt::Debug for Ball {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ball")
            .field("midpoint", &self.midpoint)
            .field("radius", &self.radius)
            .finish()
    }
}

impl fmt::Display for Ball {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            return write!(f, "{}", self.midpoint);
        }

        write!(f, "[{} ± {:e}]", self.midpoint, self.radius.to_f64())
    }
}
