//! Binomial statistics for Monte-Carlo keep-rate estimates.

use statrs::distribution::{Binomial, ContinuousCDF, DiscreteCDF, Normal};

/// `P[X >= k]` for `X ~ Binomial(n, p)`.
fn binomial_sf_inclusive(k: u64, n: u64, p: f64) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if k > n {
        return 0.0;
    }
    match Binomial::new(p.clamp(0.0, 1.0), n) {
        Ok(binom) => (1.0 - binom.cdf(k - 1)).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// `P[X <= k]` for `X ~ Binomial(n, p)`.
fn binomial_cdf(k: u64, n: u64, p: f64) -> f64 {
    if k >= n {
        return 1.0;
    }
    match Binomial::new(p.clamp(0.0, 1.0), n) {
        Ok(binom) => binom.cdf(k).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Two-sided p-value of observing `successes` out of `trials` when the true
/// rate is `p`.
///
/// Doubles the smaller tail, capped at one.
pub fn binomial_two_sided_p_value(successes: u64, trials: u64, p: f64) -> f64 {
    if trials == 0 {
        return 1.0;
    }
    let successes = successes.min(trials);
    let lower = binomial_cdf(successes, trials, p);
    let upper = binomial_sf_inclusive(successes, trials, p);
    (2.0 * lower.min(upper)).min(1.0)
}

/// Two-sided standard normal quantile for the given confidence level.
pub fn z_for_confidence(confidence: f64) -> f64 {
    let confidence = confidence.clamp(1e-12, 1.0 - 1e-12);
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(0.5 + confidence / 2.0),
        Err(_) => f64::NAN,
    }
}

/// Wilson score interval for a binomial proportion.
pub fn wilson_interval(successes: u64, trials: u64, confidence: f64) -> (f64, f64) {
    if trials == 0 {
        return (0.0, 1.0);
    }
    let n = trials as f64;
    let p_hat = successes.min(trials) as f64 / n;
    let z = z_for_confidence(confidence);
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let center = (p_hat + z2 / (2.0 * n)) / denom;
    let half = z * (p_hat * (1.0 - p_hat) / n + z2 / (4.0 * n * n)).sqrt() / denom;
    ((center - half).max(0.0), (center + half).min(1.0))
}
