//! The partition selection interface shared by all strategies.

use partition_selection_core::{PrivacyParameters, Result};
use rand::Rng;

/// Decides whether a partition may be released given its user count.
///
/// A strategy is immutable once built. Randomness comes from the RNG passed
/// to [`should_keep_with_rng`](Self::should_keep_with_rng), or from the
/// calling thread's RNG in [`should_keep`](Self::should_keep). Concurrent
/// workers can therefore share one instance as long as each brings its own
/// random source.
pub trait PartitionSelectionStrategy {
    /// Validated privacy parameters.
    fn parameters(&self) -> &PrivacyParameters;

    /// Probability that a partition with `num_users` users is kept.
    ///
    /// Accepts fractional counts for weighted inputs. Counts that are not
    /// positive and finite are always dropped.
    fn keep_probability(&self, num_users: f64) -> f64;

    /// Make one randomized keep/drop decision using `rng`.
    fn should_keep_with_rng<R: Rng + ?Sized>(&self, num_users: i64, rng: &mut R) -> bool;

    /// Make one randomized keep/drop decision using the thread-local RNG.
    fn should_keep(&self, num_users: i64) -> bool {
        self.should_keep_with_rng(num_users, &mut rand::thread_rng())
    }

    /// Total epsilon.
    fn epsilon(&self) -> f64 {
        self.parameters().epsilon()
    }

    /// Total delta.
    fn delta(&self) -> f64 {
        self.parameters().delta()
    }

    /// Maximum number of partitions a single user may contribute to.
    fn max_partitions_contributed(&self) -> i64 {
        self.parameters().max_partitions_contributed()
    }
}

/// A reusable description of a strategy that can be built on demand.
pub trait PartitionSelectionConfig {
    /// Strategy created by this config.
    type Strategy: PartitionSelectionStrategy;

    /// Validate the configuration and build the strategy.
    fn build_strategy(&self) -> Result<Self::Strategy>;
}

/// Whether `num_users` can never be kept.
pub(crate) fn is_empty_count(num_users: f64) -> bool {
    !(num_users > 0.0) || !num_users.is_finite()
}
