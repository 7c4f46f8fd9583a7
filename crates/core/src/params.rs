//! Privacy parameters shared by every partition selection strategy.

use crate::{DpError, Result};

/// Validated `(epsilon, delta)` budget together with the per-user
/// contribution bound.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrivacyParameters {
    epsilon: f64,
    delta: f64,
    max_partitions_contributed: i64,
}

impl PrivacyParameters {
    /// Validate and create a parameter set.
    pub fn new(epsilon: f64, delta: f64, max_partitions_contributed: i64) -> Result<Self> {
        PrivacyParametersBuilder::default()
            .with_epsilon(epsilon)
            .with_delta(delta)
            .with_max_partitions_contributed(max_partitions_contributed)
            .build()
    }

    /// Total epsilon.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Total delta.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Maximum number of partitions a single user may contribute to.
    pub fn max_partitions_contributed(&self) -> i64 {
        self.max_partitions_contributed
    }

    /// Epsilon spent on a single partition, `epsilon / k`.
    pub fn per_partition_epsilon(&self) -> f64 {
        self.epsilon / self.max_partitions_contributed as f64
    }

    /// Delta spent on a single partition, `1 - (1 - delta)^(1/k)`.
    ///
    /// A user touching `k` partitions fails at least one with probability at
    /// most `delta` when each fails independently with this probability.
    pub fn per_partition_delta(&self) -> f64 {
        per_partition_delta(self.delta, self.max_partitions_contributed)
    }
}

/// Split `delta` across `k` partitions: `1 - (1 - delta)^(1/k)`.
pub fn per_partition_delta(delta: f64, max_partitions_contributed: i64) -> f64 {
    let k = max_partitions_contributed.max(1) as f64;
    -((-delta).ln_1p() / k).exp_m1()
}

/// Combine a per-partition delta over `k` partitions: `1 - (1 - delta)^k`.
pub fn total_delta(per_partition_delta: f64, max_partitions_contributed: i64) -> f64 {
    let k = max_partitions_contributed.max(1) as f64;
    -((-per_partition_delta).ln_1p() * k).exp_m1()
}

/// Collects privacy parameters and validates them in a fixed order.
///
/// Epsilon is checked before delta, which is checked before the contribution
/// bound; each check runs set, then finite, then range.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PrivacyParametersBuilder {
    epsilon: Option<f64>,
    delta: Option<f64>,
    max_partitions_contributed: Option<i64>,
}

impl PrivacyParametersBuilder {
    /// Set epsilon.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = Some(epsilon);
        self
    }

    /// Set delta.
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }

    /// Set the maximum number of partitions a user can contribute to.
    pub fn with_max_partitions_contributed(mut self, max_partitions_contributed: i64) -> Self {
        self.max_partitions_contributed = Some(max_partitions_contributed);
        self
    }

    /// Epsilon as set so far.
    pub fn epsilon(&self) -> Option<f64> {
        self.epsilon
    }

    /// Delta as set so far.
    pub fn delta(&self) -> Option<f64> {
        self.delta
    }

    /// Contribution bound as set so far.
    pub fn max_partitions_contributed(&self) -> Option<i64> {
        self.max_partitions_contributed
    }

    /// Validate and produce the parameters.
    pub fn build(&self) -> Result<PrivacyParameters> {
        let epsilon = validate_epsilon(self.epsilon)?;
        let delta = validate_delta(self.delta)?;
        let max_partitions_contributed =
            validate_max_partitions_contributed(self.max_partitions_contributed)?;
        Ok(PrivacyParameters {
            epsilon,
            delta,
            max_partitions_contributed,
        })
    }
}

fn validate_epsilon(epsilon: Option<f64>) -> Result<f64> {
    let epsilon = epsilon.ok_or_else(|| DpError::invalid("Epsilon has to be set."))?;
    if !epsilon.is_finite() {
        return Err(DpError::invalid(format!(
            "Epsilon has to be finite, but is {epsilon}"
        )));
    }
    if epsilon <= 0.0 {
        return Err(DpError::invalid(format!(
            "Epsilon has to be positive, but is {epsilon}"
        )));
    }
    Ok(epsilon)
}

fn validate_delta(delta: Option<f64>) -> Result<f64> {
    let delta = delta.ok_or_else(|| DpError::invalid("Delta has to be set."))?;
    if !delta.is_finite() {
        return Err(DpError::invalid(format!(
            "Delta has to be finite, but is {delta}"
        )));
    }
    if delta <= 0.0 || delta >= 1.0 {
        return Err(DpError::invalid(format!(
            "Delta has to be in the interval (0, 1), but is {delta}"
        )));
    }
    Ok(delta)
}

fn validate_max_partitions_contributed(max_partitions_contributed: Option<i64>) -> Result<i64> {
    let k = max_partitions_contributed.ok_or_else(|| {
        DpError::invalid("Max number of partitions a user can contribute to has to be set.")
    })?;
    if k <= 0 {
        return Err(DpError::invalid(format!(
            "Max number of partitions a user can contribute to has to be positive, but is {k}"
        )));
    }
    Ok(k)
}
