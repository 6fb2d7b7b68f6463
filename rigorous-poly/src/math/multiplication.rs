//! Truncated multiplication of ball polynomials.
//!
//! Short products are computed coefficient by coefficient. Long products use
//! Kronecker substitution: the midpoints are moved onto a common fixed-point
//! scale, packed into one big integer per operand, multiplied with a single
//! (subquadratic) big-integer multiplication, and unpacked again. The radii are
//! bounded the same way, using upward-rounded magnitudes.

use itertools::Itertools;
use itertools::izip;
use num_bigint::BigInt;
use num_bigint::BigUint;
use num_bigint::Sign;
use num_traits::Zero;
use tracing::trace;

use crate::config::kronecker_multiplication_cutoff;
use crate::math::ball::Ball;
use crate::math::dyadic::Dyadic;

/// Bits kept below the working precision when moving midpoints onto a common
/// fixed-point scale.
const GUARD_BITS: u64 = 16;

/// Writes the first `result.len()` coefficients of `lhs · rhs` into `result`.
///
/// Coefficients beyond the product's length are set to exact zeros. Either
/// operand order gives a valid enclosure.
pub(crate) fn mullow_into(result: &mut [Ball], lhs: &[Ball], rhs: &[Ball], precision: u64) {
    let num_coefficients = result.len();

    // only the low coefficients of either operand contribute
    let lhs = &lhs[..lhs.len().min(num_coefficients)];
    let rhs = &rhs[..rhs.len().min(num_coefficients)];
    if lhs.is_empty() || rhs.is_empty() {
        result.fill(Ball::zero());
        return;
    }

    let product_length = (lhs.len() + rhs.len() - 1).min(num_coefficients);
    let (product, padding) = result.split_at_mut(product_length);
    padding.fill(Ball::zero());

    let cutoff = kronecker_multiplication_cutoff();
    if lhs.len().min(rhs.len()) < cutoff {
        trace!(lhs.len = lhs.len(), rhs.len = rhs.len(), cutoff, "schoolbook multiplication");
        mullow_schoolbook(product, lhs, rhs, precision);
    } else {
        trace!(lhs.len = lhs.len(), rhs.len = rhs.len(), cutoff, "Kronecker multiplication");
        mullow_kronecker(product, lhs, rhs, precision);
    }
}

fn mullow_schoolbook(result: &mut [Ball], lhs: &[Ball], rhs: &[Ball], precision: u64) {
    for (k, coefficient) in result.iter_mut().enumerate() {
        let first = (k + 1).saturating_sub(rhs.len());
        let last = k.min(lhs.len() - 1);
        let terms = (first..=last).map(|i| (&lhs[i], &rhs[k - i]));
        *coefficient = Ball::dot(terms, precision);
    }
}

fn mullow_kronecker(result: &mut [Ball], lhs: &[Ball], rhs: &[Ball], precision: u64) {
    let num_coefficients = result.len();
    let lhs = FixedPointMidpoints::new(lhs, precision + GUARD_BITS);
    let rhs = FixedPointMidpoints::new(rhs, precision + GUARD_BITS);

    let midpoint_products = signed_kronecker_mullow(&lhs.integers, &rhs.integers, num_coefficients);
    let midpoint_scale = lhs.scale + rhs.scale;

    // |a·b - A·B| ≤ (|A| + r)·s + r·|B| for a ∈ A ± r, b ∈ B ± s
    let lhs_magnitudes = lhs.magnitudes();
    let rhs_magnitudes = rhs.magnitudes();
    let lhs_upper = lhs_magnitudes
        .iter()
        .zip(&lhs.radii)
        .map(|(magnitude, radius)| magnitude + radius)
        .collect_vec();
    let first_radius_part = upper_bound_mullow(&lhs_upper, &rhs.radii, num_coefficients);
    let second_radius_part = upper_bound_mullow(&lhs.radii, &rhs_magnitudes, num_coefficients);

    for (k, coefficient) in result.iter_mut().enumerate() {
        let midpoint = Dyadic::new(midpoint_products[k].clone(), midpoint_scale);
        let mut radius = Dyadic::zero();
        for part in [&first_radius_part, &second_radius_part].into_iter().flatten() {
            radius += &part[k];
        }
        *coefficient = Ball::from_exact_parts(midpoint, radius, precision);
    }
}

/// Midpoints of a sequence of balls, truncated to integer multiples of one
/// common power of two, together with the balls' radii widened by the
/// truncation error.
struct FixedPointMidpoints {
    integers: Vec<BigInt>,
    scale: i64,
    radii: Vec<Dyadic>,
}

impl FixedPointMidpoints {
    fn new(balls: &[Ball], precision: u64) -> Self {
        let Some(scale) = common_scale(balls.iter().map(Ball::midpoint), precision) else {
            return Self {
                integers: vec![BigInt::zero(); balls.len()],
                scale: 0,
                radii: balls.iter().map(|ball| ball.radius().clone()).collect(),
            };
        };

        let unit = Dyadic::power_of_two(scale);
        let (integers, radii) = balls
            .iter()
            .map(|ball| {
                let (integer, is_exact) = truncate_to_scale(ball.midpoint(), scale);
                let radius = if is_exact {
                    ball.radius().clone()
                } else {
                    ball.radius() + &unit
                };
                (integer, radius)
            })
            .unzip();

        Self {
            integers,
            scale,
            radii,
        }
    }

    fn magnitudes(&self) -> Vec<Dyadic> {
        self.integers
            .iter()
            .map(|integer| Dyadic::new(integer.magnitude().clone().into(), self.scale))
            .collect()
    }
}

/// The scale `2^s` such that the largest value, divided by `2^s`, has
/// `precision` bits. If all values are integer multiples of a larger power of
/// two, that one is used instead. `None` if all values are zero.
fn common_scale<'a>(values: impl Iterator<Item = &'a Dyadic> + Clone, precision: u64) -> Option<i64> {
    let top = values.clone().filter_map(Dyadic::magnitude_exponent).max()?;
    let lowest = values
        .filter(|value| !value.is_zero())
        .map(Dyadic::exponent)
        .min()?;

    Some(lowest.max(top - precision as i64))
}

/// `value / 2^scale`, truncated toward zero, and whether that was exact.
fn truncate_to_scale(value: &Dyadic, scale: i64) -> (BigInt, bool) {
    let shift = value.exponent() - scale;
    if shift >= 0 {
        return (value.mantissa() << shift as u64, true);
    }

    // canonical mantissas are odd: shifting right always drops a set bit
    let magnitude = value.mantissa().magnitude() >> shift.unsigned_abs();
    let integer = BigInt::from_biguint(value.mantissa().sign(), magnitude);
    (integer, value.is_zero())
}

/// `|value| / 2^scale`, rounded up.
fn round_up_to_scale(value: &Dyadic, scale: i64) -> BigUint {
    let shift = value.exponent() - scale;
    let magnitude = value.mantissa().magnitude();
    if shift >= 0 {
        return magnitude << shift as u64;
    }

    let truncated = magnitude >> shift.unsigned_abs();
    if value.is_zero() {
        truncated
    } else {
        truncated + 1_u32
    }
}

/// Coefficient-wise upper bounds on the first `num_coefficients` coefficients
/// of the product of two polynomials with non-negative coefficients. `None` if
/// either polynomial is zero.
fn upper_bound_mullow(lhs: &[Dyadic], rhs: &[Dyadic], num_coefficients: usize) -> Option<Vec<Dyadic>> {
    let lhs_scale = common_scale(lhs.iter(), Ball::RADIUS_PRECISION)?;
    let rhs_scale = common_scale(rhs.iter(), Ball::RADIUS_PRECISION)?;

    let lhs_integers = lhs.iter().map(|v| round_up_to_scale(v, lhs_scale)).collect_vec();
    let rhs_integers = rhs.iter().map(|v| round_up_to_scale(v, rhs_scale)).collect_vec();
    let product = kronecker_mullow(&lhs_integers, &rhs_integers, num_coefficients);

    let scale = lhs_scale + rhs_scale;
    let bounds = product
        .into_iter()
        .map(|integer| Dyadic::new(integer.into(), scale))
        .collect();
    Some(bounds)
}

/// The first `num_coefficients` coefficients of the product of two integer
/// polynomials. Splits both operands into their positive and negative parts
/// and computes the four partial products in parallel.
fn signed_kronecker_mullow(lhs: &[BigInt], rhs: &[BigInt], num_coefficients: usize) -> Vec<BigInt> {
    let (lhs_positive, lhs_negative) = split_by_sign(lhs);
    let (rhs_positive, rhs_negative) = split_by_sign(rhs);

    let mullow = |l: &[BigUint], r: &[BigUint]| kronecker_mullow(l, r, num_coefficients);
    let ((positive_positive, negative_negative), (positive_negative, negative_positive)) =
        rayon::join(
            || {
                rayon::join(
                    || mullow(&lhs_positive, &rhs_positive),
                    || mullow(&lhs_negative, &rhs_negative),
                )
            },
            || {
                rayon::join(
                    || mullow(&lhs_positive, &rhs_negative),
                    || mullow(&lhs_negative, &rhs_positive),
                )
            },
        );

    izip!(
        positive_positive,
        negative_negative,
        positive_negative,
        negative_positive
    )
    .map(|(pp, nn, pn, np)| BigInt::from(pp + nn) - BigInt::from(pn + np))
    .collect()
}

fn split_by_sign(integers: &[BigInt]) -> (Vec<BigUint>, Vec<BigUint>) {
    integers
        .iter()
        .map(|integer| match integer.sign() {
            Sign::Minus => (BigUint::zero(), integer.magnitude().clone()),
            Sign::NoSign | Sign::Plus => (integer.magnitude().clone(), BigUint::zero()),
        })
        .unzip()
}

/// The first `num_coefficients` coefficients of the product of two polynomials
/// with non-negative integer coefficients, using a single big-integer
/// multiplication.
///
/// Every coefficient gets a byte-aligned slot wide enough to hold any
/// coefficient of the product, so that no carries cross slot boundaries.
fn kronecker_mullow(lhs: &[BigUint], rhs: &[BigUint], num_coefficients: usize) -> Vec<BigUint> {
    let max_bits = |integers: &[BigUint]| integers.iter().map(BigUint::bits).max().unwrap_or(0);
    let (lhs_bits, rhs_bits) = (max_bits(lhs), max_bits(rhs));
    if lhs_bits == 0 || rhs_bits == 0 {
        return vec![BigUint::zero(); num_coefficients];
    }

    let max_num_terms = lhs.len().min(rhs.len()) as u64;
    let num_terms_bits = u64::from(u64::BITS - max_num_terms.leading_zeros());
    let slot_bytes = (lhs_bits + rhs_bits + num_terms_bits).div_ceil(8) as usize;

    let pack = |integers: &[BigUint]| {
        let mut bytes = vec![0_u8; integers.len() * slot_bytes];
        for (slot, integer) in bytes.chunks_exact_mut(slot_bytes).zip(integers) {
            let integer_bytes = integer.to_bytes_le();
            slot[..integer_bytes.len()].copy_from_slice(&integer_bytes);
        }
        BigUint::from_bytes_le(&bytes)
    };

    let product = (pack(lhs) * pack(rhs)).to_bytes_le();
    (0..num_coefficients)
        .map(|k| {
            let start = (k * slot_bytes).min(product.len());
            let end = ((k + 1) * slot_bytes).min(product.len());
            BigUint::from_bytes_le(&product[start..end])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::collection::vec;
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;
    use test_strategy::proptest;

    use super::*;
    use crate::config::set_kronecker_multiplication_cutoff;

    fn exact_mullow(lhs: &[Dyadic], rhs: &[Dyadic], num_coefficients: usize) -> Vec<Dyadic> {
        let mut product = vec![Dyadic::zero(); num_coefficients];
        for (i, l) in lhs.iter().enumerate() {
            for (j, r) in rhs.iter().enumerate() {
                if i + j < num_coefficients {
                    product[i + j] += &(l * r);
                }
            }
        }
        product
    }

    fn midpoints(balls: &[Ball]) -> Vec<Dyadic> {
        balls.iter().map(|ball| ball.midpoint().clone()).collect()
    }

    fn upper_endpoints(balls: &[Ball]) -> Vec<Dyadic> {
        balls.iter().map(|ball| ball.midpoint() + ball.radius()).collect()
    }

    fn balls_from_integers(integers: &[i64]) -> Vec<Ball> {
        integers.iter().copied().map(Ball::from).collect()
    }

    #[proptest]
    fn kronecker_mullow_agrees_with_convolution(
        #[strategy(vec(any::<u64>(), 0..30))] lhs: Vec<u64>,
        #[strategy(vec(any::<u64>(), 0..30))] rhs: Vec<u64>,
        #[strategy(0_usize..70)] num_coefficients: usize,
    ) {
        let lhs_big = lhs.iter().copied().map(BigUint::from).collect_vec();
        let rhs_big = rhs.iter().copied().map(BigUint::from).collect_vec();
        let product = kronecker_mullow(&lhs_big, &rhs_big, num_coefficients);

        let mut expected = vec![BigUint::zero(); num_coefficients];
        for (i, l) in lhs_big.iter().enumerate() {
            for (j, r) in rhs_big.iter().enumerate() {
                if i + j < num_coefficients {
                    expected[i + j] += l * r;
                }
            }
        }
        prop_assert_eq!(expected, product);
    }

    #[proptest]
    fn signed_kronecker_mullow_agrees_with_convolution(
        #[strategy(vec(any::<i64>(), 1..30))] lhs: Vec<i64>,
        #[strategy(vec(any::<i64>(), 1..30))] rhs: Vec<i64>,
    ) {
        let num_coefficients = lhs.len() + rhs.len() - 1;
        let lhs_big = lhs.iter().copied().map(BigInt::from).collect_vec();
        let rhs_big = rhs.iter().copied().map(BigInt::from).collect_vec();
        let product = signed_kronecker_mullow(&lhs_big, &rhs_big, num_coefficients);

        let mut expected = vec![BigInt::zero(); num_coefficients];
        for (i, l) in lhs_big.iter().enumerate() {
            for (j, r) in rhs_big.iter().enumerate() {
                expected[i + j] += l * r;
            }
        }
        prop_assert_eq!(expected, product);
    }

    #[test]
    fn products_of_small_integer_polynomials_are_exact_with_both_algorithms() {
        let lhs = balls_from_integers(&(1..=40).collect_vec());
        let rhs = balls_from_integers(&(-20..20).collect_vec());
        let num_coefficients = lhs.len() + rhs.len() - 1;
        let expected = exact_mullow(&midpoints(&lhs), &midpoints(&rhs), num_coefficients)
            .into_iter()
            .map(Ball::exact)
            .collect_vec();

        let mut schoolbook = vec![Ball::zero(); num_coefficients];
        mullow_schoolbook(&mut schoolbook, &lhs, &rhs, 64);
        assert_eq!(expected, schoolbook);

        let mut kronecker = vec![Ball::zero(); num_coefficients];
        mullow_kronecker(&mut kronecker, &lhs, &rhs, 64);
        assert_eq!(expected, kronecker);
    }

    #[proptest(cases = 50)]
    fn both_algorithms_enclose_products_of_representatives(
        #[strategy(vec(arb::<Ball>(), 1..40))] lhs: Vec<Ball>,
        #[strategy(vec(arb::<Ball>(), 1..40))] rhs: Vec<Ball>,
        #[strategy(1_usize..80)] num_coefficients: usize,
        #[strategy(8_u64..128)] precision: u64,
    ) {
        let num_coefficients = num_coefficients.min(lhs.len() + rhs.len() - 1);
        let mut schoolbook = vec![Ball::zero(); num_coefficients];
        mullow_schoolbook(&mut schoolbook, &lhs, &rhs, precision);
        let mut kronecker = vec![Ball::zero(); num_coefficients];
        mullow_kronecker(&mut kronecker, &lhs, &rhs, precision);

        let representatives = [
            exact_mullow(&midpoints(&lhs), &midpoints(&rhs), num_coefficients),
            exact_mullow(&upper_endpoints(&lhs), &midpoints(&rhs), num_coefficients),
            exact_mullow(&midpoints(&lhs), &upper_endpoints(&rhs), num_coefficients),
        ];
        for exact in representatives {
            for ((s, k), e) in schoolbook.iter().zip(&kronecker).zip(&exact) {
                prop_assert!(s.contains(e));
                prop_assert!(k.contains(e));
            }
        }
        for (s, k) in schoolbook.iter().zip(&kronecker) {
            prop_assert!(s.overlaps(k));
        }
    }

    #[proptest]
    fn requesting_more_coefficients_than_the_product_has_pads_with_zeros(
        #[strategy(vec(arb::<Ball>(), 1..10))] lhs: Vec<Ball>,
        #[strategy(vec(arb::<Ball>(), 1..10))] rhs: Vec<Ball>,
        #[strategy(0_usize..10)] excess: usize,
    ) {
        let product_length = lhs.len() + rhs.len() - 1;
        let mut product = vec![Ball::one(); product_length + excess];
        mullow_into(&mut product, &lhs, &rhs, 53);
        prop_assert!(product[product_length..].iter().all(Ball::is_zero));
    }

    #[test]
    fn multiplying_by_empty_polynomial_gives_zeros() {
        let lhs = balls_from_integers(&[1, 2, 3]);
        let mut product = vec![Ball::one(); 4];
        mullow_into(&mut product, &lhs, &[], 53);
        assert!(product.iter().all(Ball::is_zero));
    }

    #[test]
    fn zero_midpoints_with_nonzero_radii_are_handled_by_kronecker_multiplication() {
        let fuzzy_zero = Ball::new(Dyadic::zero(), Dyadic::power_of_two(-10));
        let lhs = vec![fuzzy_zero; 30];
        let rhs = balls_from_integers(&[3; 30]);

        let mut product = vec![Ball::zero(); 59];
        mullow_kronecker(&mut product, &lhs, &rhs, 53);
        for coefficient in product {
            assert!(coefficient.midpoint().is_zero());
            assert!(!coefficient.is_exact());
        }
    }

    #[test]
    fn configured_cutoff_selects_algorithm_without_changing_exact_results() {
        let lhs = balls_from_integers(&[1, -1, 2, -2, 3]);
        let rhs = balls_from_integers(&[5, 4, 3, 2, 1, 0, -1]);

        set_kronecker_multiplication_cutoff(1);
        let mut kronecker = vec![Ball::zero(); 8];
        mullow_into(&mut kronecker, &rhs, &lhs, 53);

        set_kronecker_multiplication_cutoff(1000);
        let mut schoolbook = vec![Ball::zero(); 8];
        mullow_into(&mut schoolbook, &rhs, &lhs, 53);

        assert_eq!(schoolbook, kronecker);
    }
}
