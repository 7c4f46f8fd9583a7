//! Monte-Carlo estimation of how often a strategy keeps a partition.

use partition_selection_strategy::PartitionSelectionStrategy;
use rand::Rng;
use tracing::debug;

use crate::stats::{binomial_two_sided_p_value, wilson_interval};

/// Outcome of repeatedly asking a strategy about one user count.
#[derive(Clone, Debug, PartialEq)]
pub struct KeepRateEstimate {
    /// User count that was evaluated.
    pub num_users: i64,
    /// Number of keep decisions.
    pub kept: u64,
    /// Number of decisions made.
    pub trials: u64,
    /// Empirical keep rate.
    pub rate: f64,
    /// Lower end of the confidence interval.
    pub lower: f64,
    /// Upper end of the confidence interval.
    pub upper: f64,
}

impl KeepRateEstimate {
    /// Whether `p` lies inside the confidence interval.
    pub fn contains(&self, p: f64) -> bool {
        self.lower <= p && p <= self.upper
    }

    /// Whether the empirical rate is within `tolerance` of `expected`.
    pub fn within(&self, expected: f64, tolerance: f64) -> bool {
        (self.rate - expected).abs() <= tolerance
    }

    /// Two-sided p-value of the observed count under keep probability `p`.
    pub fn p_value(&self, p: f64) -> f64 {
        binomial_two_sided_p_value(self.kept, self.trials, p)
    }
}

/// Runs a strategy many times to estimate its keep rate.
#[derive(Clone, Debug)]
pub struct KeepRateAuditor {
    /// Number of decisions per estimate.
    pub num_trials: u64,
    /// Confidence level of the reported interval.
    pub confidence: f64,
}

impl Default for KeepRateAuditor {
    fn default() -> Self {
        Self {
            num_trials: 1_000_000,
            confidence: 0.999,
        }
    }
}

impl KeepRateAuditor {
    /// Create an auditor with custom parameters.
    pub fn new(num_trials: u64, confidence: f64) -> Self {
        Self {
            num_trials: num_trials.max(1),
            confidence: confidence.clamp(0.5, 0.999_999),
        }
    }

    /// Estimate the keep rate of `strategy` at `num_users`.
    pub fn estimate<S, R>(&self, strategy: &S, num_users: i64, rng: &mut R) -> KeepRateEstimate
    where
        S: PartitionSelectionStrategy,
        R: Rng + ?Sized,
    {
        let kept = (0..self.num_trials)
            .filter(|_| strategy.should_keep_with_rng(num_users, rng))
            .count() as u64;
        let (lower, upper) = wilson_interval(kept, self.num_trials, self.confidence);
        let rate = kept as f64 / self.num_trials as f64;
        debug!(num_users, kept, trials = self.num_trials, rate, "estimated keep rate");
        KeepRateEstimate {
            num_users,
            kept,
            trials: self.num_trials,
            rate,
            lower,
            upper,
        }
    }

    /// Estimate the keep rate at each count and pair it with the strategy's
    /// own keep probability.
    pub fn compare<S, R>(
        &self,
        strategy: &S,
        counts: &[i64],
        rng: &mut R,
    ) -> Vec<(KeepRateEstimate, f64)>
    where
        S: PartitionSelectionStrategy,
        R: Rng + ?Sized,
    {
        counts
            .iter()
            .map(|&n| {
                let estimate = self.estimate(strategy, n, rng);
                (estimate, strategy.keep_probability(n as f64))
            })
            .collect()
    }
}
