//! Exact verification of a strategy's keep-probability curve.
//!
//! Adding or removing one user changes a partition's count by one, and a
//! user touches at most `k` partitions. A strategy is `(epsilon, delta)`-DP
//! when, with the per-partition budget `(epsilon', delta')`, every count `n`
//! satisfies
//!
//! ```text
//! pi(n)         <= e^eps' * pi(n - 1)   + delta'
//! 1 - pi(n - 1) <= e^eps' * (1 - pi(n)) + delta'
//! ```

use partition_selection_strategy::PartitionSelectionStrategy;

/// Which neighbouring constraint was checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeighbourBound {
    /// Bound on the keep probability after adding a user.
    Keep,
    /// Bound on the drop probability after removing a user.
    Drop,
}

/// The first count at which a curve exceeds its privacy budget.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{bound:?} bound violated at {num_users} users by {excess:e}")]
pub struct CurveViolation {
    /// Count `n` at which the constraint between `n - 1` and `n` fails.
    pub num_users: i64,
    /// Constraint that failed.
    pub bound: NeighbourBound,
    /// Keep probability at `n - 1`.
    pub previous_keep: f64,
    /// Keep probability at `n`.
    pub keep: f64,
    /// Amount by which the left-hand side exceeds the right-hand side.
    pub excess: f64,
}

/// Summary of a curve that satisfied every constraint.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveReport {
    /// Largest count checked.
    pub max_users_checked: i64,
    /// Largest `lhs - rhs` seen; zero or negative up to the tolerance.
    pub max_excess: f64,
    /// First count whose keep probability is exactly one, if any.
    pub saturated_at: Option<i64>,
}

/// Check both neighbouring constraints for `n = 1..=max_users`.
///
/// `tolerance` absorbs floating point error in curves that meet a bound with
/// equality.
pub fn verify_privacy_curve<S: PartitionSelectionStrategy>(
    strategy: &S,
    max_users: i64,
    tolerance: f64,
) -> Result<CurveReport, CurveViolation> {
    let params = strategy.parameters();
    let growth = params.per_partition_epsilon().exp();
    let delta = params.per_partition_delta();

    let mut previous_keep = strategy.keep_probability(0.0);
    let mut max_excess = f64::NEG_INFINITY;
    let mut saturated_at = None;

    for n in 1..=max_users.max(1) {
        let keep = strategy.keep_probability(n as f64);
        let checks = [
            (NeighbourBound::Keep, keep - (growth * previous_keep + delta)),
            (
                NeighbourBound::Drop,
                (1.0 - previous_keep) - (growth * (1.0 - keep) + delta),
            ),
        ];
        for (bound, excess) in checks {
            if excess > tolerance || excess.is_nan() {
                return Err(CurveViolation {
                    num_users: n,
                    bound,
                    previous_keep,
                    keep,
                    excess,
                });
            }
            max_excess = max_excess.max(excess);
        }
        if saturated_at.is_none() && keep >= 1.0 {
            saturated_at = Some(n);
        }
        previous_keep = keep;
    }

    Ok(CurveReport {
        max_users_checked: max_users.max(1),
        max_excess,
        saturated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use partition_selection_core::{PrivacyParameters, Result};
    use partition_selection_strategy::{
        LaplacePartitionSelection, PartitionSelectionStrategy, PreaggregationPartitionSelection,
    };
    use proptest::prelude::*;
    use rand::Rng;

    /// Keeps everything with at least `cutoff` users; not private.
    struct HardCutoff {
        params: PrivacyParameters,
        cutoff: f64,
    }

    impl PartitionSelectionStrategy for HardCutoff {
        fn parameters(&self) -> &PrivacyParameters {
            &self.params
        }

        fn keep_probability(&self, num_users: f64) -> f64 {
            if num_users >= self.cutoff {
                1.0
            } else {
                0.0
            }
        }

        fn should_keep_with_rng<R: Rng + ?Sized>(&self, num_users: i64, _rng: &mut R) -> bool {
            num_users as f64 >= self.cutoff
        }
    }

    fn preaggregation(epsilon: f64, delta: f64, k: i64) -> Result<PreaggregationPartitionSelection> {
        PreaggregationPartitionSelection::builder()
            .with_epsilon(epsilon)
            .with_delta(delta)
            .with_max_partitions_contributed(k)
            .build()
    }

    #[test]
    fn preaggregation_curve_is_private_and_saturates() {
        let s = preaggregation(0.5, 0.02, 1).expect("strategy");
        let report = verify_privacy_curve(&s, 30, 1e-12).expect("private curve");
        assert_eq!(report.saturated_at, Some(12));
        assert!(report.max_excess.abs() < 1e-12);
    }

    #[test]
    fn laplace_curve_is_private() {
        let s = LaplacePartitionSelection::builder()
            .with_epsilon(1.0)
            .with_delta(1e-5)
            .with_max_partitions_contributed(3)
            .build()
            .expect("strategy");
        let report = verify_privacy_curve(&s, 200, 1e-12).expect("private curve");
        assert_eq!(report.saturated_at, None);
    }

    #[test]
    fn hard_cutoff_is_caught() {
        let s = HardCutoff {
            params: PrivacyParameters::new(1.0, 1e-3, 1).expect("params"),
            cutoff: 5.0,
        };
        let violation = verify_privacy_curve(&s, 10, 1e-12).expect_err("not private");
        assert_eq!(violation.num_users, 5);
        assert_eq!(violation.bound, NeighbourBound::Keep);
        assert!(violation.to_string().starts_with("Keep bound violated at 5 users"));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

        #[test]
        fn both_strategies_pass(
            epsilon in 0.05f64..4.0,
            delta in 1e-10f64..0.3,
            k in 1i64..5,
        ) {
            let pre = preaggregation(epsilon, delta, k).expect("strategy");
            prop_assert!(verify_privacy_curve(&pre, 400, 1e-9).is_ok());

            let lap = LaplacePartitionSelection::builder()
                .with_epsilon(epsilon)
                .with_delta(delta)
                .with_max_partitions_contributed(k)
                .build()
                .expect("strategy");
            prop_assert!(verify_privacy_curve(&lap, 400, 1e-9).is_ok());
        }
    }
}
