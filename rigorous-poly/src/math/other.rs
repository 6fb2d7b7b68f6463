use rand::Rng;
use rand::distr::Distribution;
use rand::distr::StandardUniform;

/// Generate `n` random elements using [`rand::rng()`].
///
/// For an example implementation of the [`Distribution`] trait for
/// [`StandardUniform`], see [`Ball`][ball].
///
/// [ball]: crate::prelude::Ball
pub fn random_elements<T>(n: usize) -> Vec<T>
where
    StandardUniform: Distribution<T>,
{
    rand::rng().sample_iter(StandardUniform).take(n).collect()
}

#[cfg(test)]
mod tests {
    use test_strategy::proptest;

    use super::*;
    use crate::math::ball::Ball;

    #[proptest(cases = 20)]
    fn random_elements_has_requested_length(#[strategy(0_usize..100)] n: usize) {
        let balls: Vec<Ball> = random_elements(n);
        assert_eq!(n, balls.len());
    }
}
