//! Percentile estimators over sorted samples.
//!
//! [`PercentileMethod::Interpolated`] matches `PERCENTILE_CONT`: the value
//! at fractional position `p * (n - 1)` with linear interpolation between
//! neighbors. [`PercentileMethod::NearestRank`] is the rank-based fallback
//! for engines without continuous percentiles; it always returns an actual
//! sample and agrees with the interpolated value to within the gap between
//! adjacent samples.

use police_calls_analytics_models::PercentileMethod;

/// Sorts samples ascending in place. Uses IEEE total ordering so the sort
/// never panics.
pub fn sort_samples(samples: &mut [f64]) {
    samples.sort_by(f64::total_cmp);
}

/// Linear-interpolation percentile of `sorted` at `fraction` (0.0-1.0).
///
/// Returns `None` for an empty slice, a fraction outside `[0, 1]`, or a
/// non-finite result.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn interpolated(sorted: &[f64], fraction: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&fraction) {
        return None;
    }

    let position = fraction * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;

    let value = sorted[lower] + (sorted[upper] - sorted[lower]) * weight;
    value.is_finite().then_some(value)
}

/// Nearest-rank percentile of `sorted` at `fraction` (0.0-1.0).
///
/// Returns `None` for an empty slice, a fraction outside `[0, 1]`, or a
/// non-finite sample.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn nearest_rank(sorted: &[f64], fraction: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&fraction) {
        return None;
    }

    let rank = ((fraction * sorted.len() as f64).ceil() as usize).max(1);
    let value = sorted[rank - 1];
    value.is_finite().then_some(value)
}

/// Computes a percentile with the given method.
#[must_use]
pub fn percentile(method: PercentileMethod, sorted: &[f64], fraction: f64) -> Option<f64> {
    match method {
        PercentileMethod::Interpolated => interpolated(sorted, fraction),
        PercentileMethod::NearestRank => nearest_rank(sorted, fraction),
    }
}

/// Computes several percentiles with `method`, falling back to the other
/// method if any of them cannot be produced.
///
/// Returns the values together with the method that produced them.
#[must_use]
pub fn with_fallback<const N: usize>(
    method: PercentileMethod,
    sorted: &[f64],
    fractions: [f64; N],
) -> Option<([f64; N], PercentileMethod)> {
    let attempt = |method: PercentileMethod| -> Option<[f64; N]> {
        let mut values = [0.0; N];
        for (slot, fraction) in values.iter_mut().zip(fractions) {
            *slot = percentile(method, sorted, fraction)?;
        }
        Some(values)
    };

    if let Some(values) = attempt(method) {
        return Some((values, method));
    }

    let fallback = match method {
        PercentileMethod::Interpolated => PercentileMethod::NearestRank,
        PercentileMethod::NearestRank => PercentileMethod::Interpolated,
    };
    log::warn!("{method} percentiles unavailable, falling back to {fallback}");
    attempt(fallback).map(|values| (values, fallback))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_to(n: u32) -> Vec<f64> {
        (1..=n).map(f64::from).collect()
    }

    #[test]
    fn interpolates_between_ranks() {
        let samples = one_to(4);
        assert!((interpolated(&samples, 0.5).unwrap() - 2.5).abs() < 1e-9);
        assert!((interpolated(&samples, 0.0).unwrap() - 1.0).abs() < 1e-9);
        assert!((interpolated(&samples, 1.0).unwrap() - 4.0).abs() < 1e-9);
        // position 0.9 * 3 = 2.7
        assert!((interpolated(&samples, 0.9).unwrap() - 3.7).abs() < 1e-9);
    }

    #[test]
    fn nearest_rank_returns_a_sample() {
        let samples = one_to(4);
        assert!((nearest_rank(&samples, 0.5).unwrap() - 2.0).abs() < 1e-9);
        assert!((nearest_rank(&samples, 0.9).unwrap() - 4.0).abs() < 1e-9);
        assert!((nearest_rank(&samples, 0.0).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn methods_agree_within_one_sample_gap() {
        let samples = one_to(200);
        for fraction in [0.5, 0.75, 0.9, 0.95] {
            let a = interpolated(&samples, fraction).unwrap();
            let b = nearest_rank(&samples, fraction).unwrap();
            assert!((a - b).abs() <= 1.0, "{fraction}: {a} vs {b}");
        }
    }

    #[test]
    fn rejects_empty_and_out_of_range() {
        assert!(interpolated(&[], 0.5).is_none());
        assert!(nearest_rank(&[], 0.5).is_none());
        assert!(interpolated(&[1.0], 1.5).is_none());
        assert!(nearest_rank(&[1.0], -0.1).is_none());
    }

    #[test]
    fn falls_back_when_primary_cannot_produce_a_value() {
        // Interpolating across an infinite neighbor yields a non-finite
        // value, while the nearest rank below it is still a real sample.
        let samples = [1.0, 2.0, f64::INFINITY];
        let (values, method) =
            with_fallback(PercentileMethod::Interpolated, &samples, [0.5, 0.6]).unwrap();
        assert_eq!(method, PercentileMethod::NearestRank);
        assert!((values[0] - 2.0).abs() < 1e-9);
        assert!((values[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn sorts_with_total_ordering() {
        let mut samples = vec![3.0, -1.0, 2.5, 0.0];
        sort_samples(&mut samples);
        assert_eq!(samples, vec![-1.0, 0.0, 2.5, 3.0]);
    }
}
