//! Partition selection from a closed-form keep probability.
//!
//! The keep probability is the largest curve `pi(n)` that satisfies, for
//! every count `n`, both neighbouring constraints of `(epsilon, delta)`-DP:
//!
//! ```text
//! pi(n)         <= e^eps * pi(n - 1)   + delta
//! 1 - pi(n - 1) <= e^eps * (1 - pi(n)) + delta
//! ```
//!
//! with `pi(0) = 0`. The first constraint binds up to the first crossover,
//! where `pi(n) = delta * (e^{n eps} - 1) / (e^eps - 1)`. The second binds up
//! to the second crossover, where the drop probability `1 - pi(n)` decays
//! geometrically. Past the second crossover partitions are always kept.
//!
//! Epsilon and delta are the per-partition budget: `epsilon / k` and
//! `1 - (1 - delta)^(1/k)` for `k` partitions per user.

use partition_selection_core::{PrivacyParameters, PrivacyParametersBuilder, Result};
use rand::Rng;
use tracing::debug;

use crate::strategy::{is_empty_count, PartitionSelectionConfig, PartitionSelectionStrategy};

/// Keeps a partition with the optimal probability for its user count.
#[derive(Clone, Debug, PartialEq)]
pub struct PreaggregationPartitionSelection {
    params: PrivacyParameters,
    epsilon: f64,
    delta: f64,
    first_crossover: f64,
    second_crossover: f64,
}

impl PreaggregationPartitionSelection {
    /// Start building a strategy.
    pub fn builder() -> PreaggregationPartitionSelectionBuilder {
        PreaggregationPartitionSelectionBuilder::default()
    }

    /// Create a strategy from already validated parameters.
    pub fn from_parameters(params: PrivacyParameters) -> Self {
        let epsilon = params.per_partition_epsilon();
        let delta = params.per_partition_delta();
        let first_crossover = first_crossover(epsilon, delta);
        let drop_at_first = 1.0 - exponential_regime(first_crossover, epsilon, delta);
        let second_crossover = first_crossover + saturation_steps(drop_at_first, epsilon, delta);

        debug!(
            epsilon = params.epsilon(),
            delta = params.delta(),
            max_partitions_contributed = params.max_partitions_contributed(),
            first_crossover,
            second_crossover,
            "built preaggregation partition selection"
        );

        Self {
            params,
            epsilon,
            delta,
            first_crossover,
            second_crossover,
        }
    }

    /// Largest count whose keep probability follows the exponential regime.
    pub fn first_crossover(&self) -> f64 {
        self.first_crossover
    }

    /// Largest count that may still be dropped.
    pub fn second_crossover(&self) -> f64 {
        self.second_crossover
    }
}

impl PartitionSelectionStrategy for PreaggregationPartitionSelection {
    fn parameters(&self) -> &PrivacyParameters {
        &self.params
    }

    fn keep_probability(&self, num_users: f64) -> f64 {
        if is_empty_count(num_users) {
            return 0.0;
        }
        if num_users <= self.first_crossover {
            return exponential_regime(num_users, self.epsilon, self.delta).min(1.0);
        }
        if num_users <= self.second_crossover {
            let drop_at_first =
                1.0 - exponential_regime(self.first_crossover, self.epsilon, self.delta);
            let steps = num_users - self.first_crossover;
            return decay_regime(steps, drop_at_first, self.epsilon, self.delta);
        }
        if num_users > self.second_crossover {
            1.0
        } else {
            // Crossovers that failed to compute must drop, not keep.
            0.0
        }
    }

    fn should_keep_with_rng<R: Rng + ?Sized>(&self, num_users: i64, rng: &mut R) -> bool {
        if num_users <= 0 {
            return false;
        }
        let n = num_users as f64;
        if n > self.second_crossover {
            return true;
        }
        rng.gen::<f64>() < self.keep_probability(n)
    }
}

/// Whether `epsilon` is too small for the exponential forms, which then
/// evaluate `0 / 0`. Every regime is replaced by its `eps -> 0` limit.
fn is_linear(epsilon: f64) -> bool {
    !(epsilon >= f64::MIN_POSITIVE)
}

/// `delta * (e^{n eps} - 1) / (e^eps - 1)`, stable as `eps -> 0` and for large
/// `eps`.
fn exponential_regime(n: f64, epsilon: f64, delta: f64) -> f64 {
    if is_linear(epsilon) {
        return n * delta;
    }
    delta * ((n - 1.0) * epsilon).exp() * (-n * epsilon).exp_m1() / (-epsilon).exp_m1()
}

/// Keep probability `steps` counts past the first crossover, where the drop
/// probability started at `drop_at_first`.
fn decay_regime(steps: f64, drop_at_first: f64, epsilon: f64, delta: f64) -> f64 {
    if is_linear(epsilon) {
        return (1.0 - (drop_at_first - steps * delta)).clamp(0.0, 1.0);
    }
    let drop = (-steps * epsilon).exp() * drop_at_first
        + delta * (-steps * epsilon).exp_m1() / epsilon.exp_m1();
    (1.0 - drop).clamp(0.0, 1.0)
}

/// `1 + floor(ln(1 + (e^eps - 1)(1 - delta) / (delta (e^eps + 1))) / eps)`.
///
/// `(e^eps - 1) / (e^eps + 1)` is `tanh(eps / 2)`, which stays finite for any
/// epsilon.
fn first_crossover(epsilon: f64, delta: f64) -> f64 {
    if is_linear(epsilon) {
        return 1.0 + ((1.0 - delta) / (2.0 * delta)).floor();
    }
    let ratio = (epsilon / 2.0).tanh() * (1.0 - delta) / delta;
    1.0 + (ratio.ln_1p() / epsilon).floor()
}

/// Number of decay steps after the first crossover before the drop
/// probability would fall below zero:
/// `floor(ln(1 + drop_at_first (e^eps - 1) / delta) / eps)`.
fn saturation_steps(drop_at_first: f64, epsilon: f64, delta: f64) -> f64 {
    if !(drop_at_first > 0.0) {
        return 0.0;
    }
    if is_linear(epsilon) {
        return (drop_at_first / delta).floor();
    }
    let log_ratio = if epsilon <= 1.0 {
        (drop_at_first * epsilon.exp_m1() / delta).ln_1p()
    } else {
        // ln(delta + q (e^eps - 1)) - ln(delta), factored to avoid e^eps.
        epsilon + (drop_at_first + (delta - drop_at_first) * (-epsilon).exp()).ln() - delta.ln()
    };
    (log_ratio / epsilon).floor().max(0.0)
}

/// Builder for [`PreaggregationPartitionSelection`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PreaggregationPartitionSelectionBuilder {
    params: PrivacyParametersBuilder,
}

impl PreaggregationPartitionSelectionBuilder {
    /// Set epsilon.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.params = self.params.with_epsilon(epsilon);
        self
    }

    /// Set delta.
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.params = self.params.with_delta(delta);
        self
    }

    /// Set the maximum number of partitions a user can contribute to.
    pub fn with_max_partitions_contributed(mut self, max_partitions_contributed: i64) -> Self {
        self.params = self
            .params
            .with_max_partitions_contributed(max_partitions_contributed);
        self
    }

    /// Validate the parameters and build the strategy.
    pub fn build(&self) -> Result<PreaggregationPartitionSelection> {
        let params = self.params.build()?;
        Ok(PreaggregationPartitionSelection::from_parameters(params))
    }
}

impl PartitionSelectionConfig for PreaggregationPartitionSelectionBuilder {
    type Strategy = PreaggregationPartitionSelection;

    fn build_strategy(&self) -> Result<Self::Strategy> {
        self.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn strategy(epsilon: f64, delta: f64, k: i64) -> PreaggregationPartitionSelection {
        PreaggregationPartitionSelection::builder()
            .with_epsilon(epsilon)
            .with_delta(delta)
            .with_max_partitions_contributed(k)
            .build()
            .expect("valid strategy")
    }

    #[test]
    fn crossovers_are_exact() {
        let s = strategy(0.5, 0.02, 1);
        assert_eq!(s.first_crossover(), 6.0);
        assert_eq!(s.second_crossover(), 11.0);
    }

    #[test]
    fn probabilities_match_closed_form() {
        let s = strategy(0.5, 0.02, 1);
        assert!((s.keep_probability(1.0) - 0.02).abs() < 1e-12);
        assert!((s.keep_probability(6.0) - 0.588_404_844_58).abs() < 1e-9);
        assert!((s.keep_probability(8.0) - 0.868_070_806_25).abs() < 1e-9);
        assert_eq!(s.keep_probability(12.0), 1.0);
    }

    #[test]
    fn boundary_at_second_crossover_is_not_saturated() {
        let s = strategy(0.5, 0.02, 1);
        let at = s.keep_probability(11.0);
        assert!(at < 1.0);
        assert!(1.0 - at <= 0.02);
        // Saturating at 11 instead would exceed the drop bound from 10.
        let before = s.keep_probability(10.0);
        assert!(1.0 - before <= 0.5f64.exp() * (1.0 - at) + 0.02 + 1e-12);
        assert!(1.0 - before > 0.5f64.exp() * (1.0 - 1.0) + 0.02);
    }

    #[test]
    fn underflowing_epsilon_uses_linear_limit() {
        let s = strategy(5e-324, 0.02, 2);
        let eps = s.parameters().per_partition_epsilon();
        let del = s.parameters().per_partition_delta();
        assert_eq!(eps, 0.0);
        assert_eq!(s.first_crossover(), 1.0 + ((1.0 - del) / (2.0 * del)).floor());
        assert!(s.second_crossover().is_finite());
        assert!((s.keep_probability(1.0) - del).abs() < 1e-15);

        let mut prev = 0.0;
        for n in 1..=s.second_crossover() as i64 + 2 {
            let p = s.keep_probability(n as f64);
            assert!(p <= prev + del + 1e-12, "keep bound at {n}");
            assert!(1.0 - prev <= 1.0 - p + del + 1e-12, "drop bound at {n}");
            prev = p;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let kept = (0..10_000)
            .filter(|_| s.should_keep_with_rng(1, &mut rng))
            .count();
        assert!(kept < 500, "kept {kept}");
    }

    #[test]
    fn empty_counts_are_never_kept() {
        let s = strategy(0.5, 0.02, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for n in [0, -1, i64::MIN] {
            assert!(!s.should_keep_with_rng(n, &mut rng));
        }
        assert_eq!(s.keep_probability(f64::NAN), 0.0);
    }

    #[test]
    fn large_counts_consume_no_randomness() {
        let s = strategy(0.5, 0.02, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut untouched = rng.clone();
        assert!(s.should_keep_with_rng(15, &mut rng));
        assert!(s.should_keep_with_rng(i64::MAX, &mut rng));
        assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
    }

    #[test]
    fn tiny_epsilon_is_linear_in_delta() {
        let s = strategy(1e-20, 0.02, 1);
        assert_eq!(s.first_crossover(), 25.0);
        assert!((s.keep_probability(6.0) - 0.12).abs() < 1e-9);
        assert!((s.keep_probability(40.0) - 0.8).abs() < 1e-9);

        let s = strategy(1e-20, 0.15, 1);
        assert!((s.keep_probability(3.0) - 0.45).abs() < 1e-9);
    }

    #[test]
    fn huge_epsilon_stays_finite() {
        let s = strategy(1e4, 1e-9, 1);
        assert_eq!(s.first_crossover(), 1.0);
        assert!(s.second_crossover().is_finite());
        assert!((s.keep_probability(1.0) - 1e-9).abs() < 1e-20);
        assert_eq!(s.keep_probability(s.second_crossover() + 1.0), 1.0);
    }

    #[test]
    fn contribution_bound_splits_budget() {
        let s = strategy(1.5, 0.06, 3);
        let params = s.parameters();
        assert!((params.per_partition_epsilon() - 0.5).abs() < 1e-15);
        assert!((s.keep_probability(1.0) - params.per_partition_delta()).abs() < 1e-15);
        assert!(s.keep_probability(1.0) < 0.06);
    }

    proptest! {
        #[test]
        fn curve_is_monotone_and_private(
            epsilon in 0.01f64..5.0,
            delta in 1e-9f64..0.5,
            k in 1i64..4,
        ) {
            let s = strategy(epsilon, delta, k);
            prop_assert!(s.second_crossover() >= s.first_crossover());
            let eps = s.parameters().per_partition_epsilon();
            let del = s.parameters().per_partition_delta();
            let slack = 1e-9;
            let mut prev = 0.0;
            let last = s.second_crossover().min(10_000.0) as i64 + 2;
            for n in 1..=last {
                let p = s.keep_probability(n as f64);
                prop_assert!(p >= prev);
                prop_assert!(p <= eps.exp() * prev + del + slack);
                prop_assert!(1.0 - prev <= eps.exp() * (1.0 - p) + del + slack);
                prev = p;
            }
        }
    }
}
