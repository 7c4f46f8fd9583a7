//! Partition selection by thresholding a noisy user count.
//!
//! A partition is kept when `n + noise >= threshold`. With Laplace noise of
//! scale `k / epsilon`, a partition with a single user crosses the threshold
//! with probability `delta / k` (in the `1 - (1 - delta)^(1/k)` sense), which
//! bounds the privacy loss of releasing partitions that only one user touched.

use partition_selection_core::{
    laplace_upper_tail, laplace_upper_tail_inverse, per_partition_delta, total_delta,
    LaplaceMechanism, LaplaceMechanismBuilder, NoiseMechanism, NoiseMechanismBuilder,
    PrivacyParameters, PrivacyParametersBuilder, Result,
};
use rand::Rng;
use tracing::{debug, warn};

use crate::strategy::{is_empty_count, PartitionSelectionConfig, PartitionSelectionStrategy};

/// Smallest noisy count for which a single user's partition is kept with
/// probability at most `delta` overall.
///
/// Inverts the Laplace tail with scale `max_partitions_contributed / epsilon`
/// at the per-partition delta. Arguments are not validated; invalid inputs
/// yield a non-finite threshold.
pub fn calculate_threshold(epsilon: f64, delta: f64, max_partitions_contributed: i64) -> f64 {
    let scale = laplace_scale(epsilon, max_partitions_contributed);
    let delta = per_partition_delta(delta, max_partitions_contributed);
    1.0 + laplace_upper_tail_inverse(delta, scale)
}

/// Delta spent by thresholding at `threshold`; inverse of
/// [`calculate_threshold`].
pub fn calculate_delta(epsilon: f64, threshold: f64, max_partitions_contributed: i64) -> f64 {
    let scale = laplace_scale(epsilon, max_partitions_contributed);
    let delta = laplace_upper_tail(threshold - 1.0, scale);
    total_delta(delta, max_partitions_contributed)
}

fn laplace_scale(epsilon: f64, max_partitions_contributed: i64) -> f64 {
    max_partitions_contributed as f64 / epsilon
}

/// Keeps a partition when its noisy user count reaches a threshold.
#[derive(Clone, Debug)]
pub struct LaplacePartitionSelection<M = LaplaceMechanism> {
    params: PrivacyParameters,
    mechanism: M,
    threshold: f64,
}

impl LaplacePartitionSelection {
    /// Start building a strategy with Laplace noise.
    pub fn builder() -> LaplacePartitionSelectionBuilder {
        LaplacePartitionSelectionBuilder::new()
    }

    /// See [`calculate_threshold`].
    pub fn calculate_threshold(epsilon: f64, delta: f64, max_partitions_contributed: i64) -> f64 {
        calculate_threshold(epsilon, delta, max_partitions_contributed)
    }

    /// See [`calculate_delta`].
    pub fn calculate_delta(epsilon: f64, threshold: f64, max_partitions_contributed: i64) -> f64 {
        calculate_delta(epsilon, threshold, max_partitions_contributed)
    }
}

impl<M: NoiseMechanism> LaplacePartitionSelection<M> {
    /// Create a strategy from validated parameters, calibrating the noise
    /// mechanism for epsilon and an L1 sensitivity of
    /// `max_partitions_contributed`.
    pub fn from_parameters<B>(params: PrivacyParameters, noise: &B) -> Result<Self>
    where
        B: NoiseMechanismBuilder<Mechanism = M>,
    {
        let k = params.max_partitions_contributed();
        let mechanism = noise.calibrate(params.epsilon(), k as f64)?;
        let threshold = calculate_threshold(params.epsilon(), params.delta(), k);

        if threshold < 1.0 {
            warn!(
                threshold,
                delta = params.delta(),
                "keep threshold is below one user; single-user partitions are usually kept"
            );
        }
        debug!(
            epsilon = params.epsilon(),
            delta = params.delta(),
            max_partitions_contributed = k,
            threshold,
            "built laplace partition selection"
        );

        Ok(Self {
            params,
            mechanism,
            threshold,
        })
    }

    /// Noisy count a partition needs to reach to be kept.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The calibrated noise mechanism.
    pub fn mechanism(&self) -> &M {
        &self.mechanism
    }
}

impl<M: NoiseMechanism> PartitionSelectionStrategy for LaplacePartitionSelection<M> {
    fn parameters(&self) -> &PrivacyParameters {
        &self.params
    }

    fn keep_probability(&self, num_users: f64) -> f64 {
        if is_empty_count(num_users) {
            return 0.0;
        }
        self.mechanism.upper_tail(self.threshold - num_users)
    }

    fn should_keep_with_rng<R: Rng + ?Sized>(&self, num_users: i64, rng: &mut R) -> bool {
        if num_users <= 0 {
            return false;
        }
        self.mechanism.add_noise(num_users as f64, rng) >= self.threshold
    }
}

/// Builder for [`LaplacePartitionSelection`].
///
/// The noise mechanism is calibrated inside [`build`](Self::build) from the
/// final parameters, so setters may be called in any order.
#[derive(Clone, Debug, Default)]
pub struct LaplacePartitionSelectionBuilder<B = LaplaceMechanismBuilder> {
    params: PrivacyParametersBuilder,
    noise: B,
}

impl LaplacePartitionSelectionBuilder {
    /// Create a builder using Laplace noise.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: NoiseMechanismBuilder> LaplacePartitionSelectionBuilder<B> {
    /// Replace the noise mechanism builder.
    pub fn with_noise_mechanism<N: NoiseMechanismBuilder>(
        self,
        noise: N,
    ) -> LaplacePartitionSelectionBuilder<N> {
        LaplacePartitionSelectionBuilder {
            params: self.params,
            noise,
        }
    }

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

    /// Validate the parameters, calibrate the noise and build the strategy.
    pub fn build(&self) -> Result<LaplacePartitionSelection<B::Mechanism>> {
        let params = self.params.build()?;
        LaplacePartitionSelection::from_parameters(params, &self.noise)
    }
}

impl<B: NoiseMechanismBuilder> PartitionSelectionConfig for LaplacePartitionSelectionBuilder<B> {
    type Strategy = LaplacePartitionSelection<B::Mechanism>;

    fn build_strategy(&self) -> Result<Self::Strategy> {
        self.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partition_selection_core::testing::ZeroNoiseMechanismBuilder;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn strategy(epsilon: f64, delta: f64, k: i64) -> LaplacePartitionSelection {
        LaplacePartitionSelection::builder()
            .with_epsilon(epsilon)
            .with_delta(delta)
            .with_max_partitions_contributed(k)
            .build()
            .expect("valid strategy")
    }

    #[test]
    fn threshold_matches_reference_values() {
        assert!((calculate_threshold(0.5, 0.02, 1) - 7.437_751_649_74).abs() < 0.01);
        assert!((calculate_threshold(1.0986, 0.00001, 1) - 10.85).abs() < 0.01);
        assert!((calculate_threshold(2.1972, 0.00001, 1) - 5.92).abs() < 0.01);
        assert!((calculate_threshold(2.1972, 0.00001, 5) - 29.28).abs() < 0.01);
    }

    #[test]
    fn delta_matches_reference_values() {
        assert!((calculate_delta(0.5, 7.437_751_649_74, 1) - 0.02).abs() < 0.001);
        assert!((calculate_delta(1.0986, 10.85, 1) - 0.00001).abs() < 0.000001);
        assert!((calculate_delta(2.1972, 5.92, 1) - 0.00001).abs() < 0.000001);
        assert!((calculate_delta(2.1972, 29.28, 5) - 0.00001).abs() < 0.000001);
    }

    #[test]
    fn built_threshold_ignores_noise_choice() {
        let laplace = strategy(0.5, 0.02, 1);
        let zero = LaplacePartitionSelection::builder()
            .with_noise_mechanism(ZeroNoiseMechanismBuilder)
            .with_epsilon(0.5)
            .with_delta(0.02)
            .with_max_partitions_contributed(1)
            .build()
            .expect("valid strategy");
        assert!((laplace.threshold() - 7.437_751_649_74).abs() < 0.001);
        assert_eq!(laplace.threshold(), zero.threshold());
    }

    #[test]
    fn setter_order_does_not_matter() {
        let a = LaplacePartitionSelection::builder()
            .with_max_partitions_contributed(3)
            .with_delta(1e-5)
            .with_epsilon(1.0)
            .build()
            .expect("valid strategy");
        let b = LaplacePartitionSelectionBuilder::new()
            .with_epsilon(1.0)
            .with_delta(1e-5)
            .with_max_partitions_contributed(3)
            .build()
            .expect("valid strategy");
        assert_eq!(a.threshold(), b.threshold());
        assert_eq!(a.mechanism().scale(), 3.0);
        assert_eq!(b.mechanism().scale(), 3.0);
    }

    #[test]
    fn keep_probability_at_one_user_is_delta() {
        let s = strategy(0.5, 0.02, 1);
        assert!((s.keep_probability(1.0) - 0.02).abs() < 1e-12);
        assert!((s.keep_probability(s.threshold()) - 0.5).abs() < 1e-12);
        assert_eq!(s.keep_probability(0.0), 0.0);
    }

    #[test]
    fn empty_counts_are_never_kept() {
        let s = strategy(10.0, 0.9, 1);
        assert!(s.threshold() < 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1_000 {
            assert!(!s.should_keep_with_rng(0, &mut rng));
            assert!(!s.should_keep_with_rng(-4, &mut rng));
        }
    }

    #[test]
    fn validation_errors_surface_from_build() {
        let err = LaplacePartitionSelection::builder()
            .with_noise_mechanism(ZeroNoiseMechanismBuilder)
            .with_delta(0.1)
            .with_epsilon(2.0)
            .build()
            .expect_err("missing contribution bound");
        assert!(err
            .to_string()
            .starts_with("Max number of partitions a user can contribute to has to be set"));
    }

    proptest! {
        #[test]
        fn threshold_then_delta_round_trips(
            epsilon in 0.05f64..5.0,
            delta in 1e-12f64..0.99,
            k in 1i64..20,
        ) {
            let threshold = calculate_threshold(epsilon, delta, k);
            prop_assert!(threshold.is_finite());
            let back = calculate_delta(epsilon, threshold, k);
            prop_assert!((back - delta).abs() < 0.001);
        }

        #[test]
        fn delta_then_threshold_round_trips(
            epsilon in 0.05f64..5.0,
            threshold in 0.0f64..40.0,
            k in 1i64..10,
        ) {
            let delta = calculate_delta(epsilon, threshold, k);
            prop_assume!(delta > 0.0 && delta < 1.0);
            let back = calculate_threshold(epsilon, delta, k);
            prop_assert!((back - threshold).abs() < 0.02);
        }
    }
}
