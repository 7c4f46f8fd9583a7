//! Runtime choice between the built-in strategies.

use partition_selection_core::{
    LaplaceMechanismBuilder, PrivacyParameters, PrivacyParametersBuilder, Result,
};
use rand::Rng;

use crate::laplace::LaplacePartitionSelection;
use crate::preaggregation::PreaggregationPartitionSelection;
use crate::strategy::{PartitionSelectionConfig, PartitionSelectionStrategy};

/// The built-in strategy families.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PartitionSelectionKind {
    /// Closed-form keep probability; needs no noise mechanism.
    #[default]
    Preaggregation,
    /// Laplace-noised count compared against a threshold.
    Laplace,
}

/// One of the built-in strategies.
#[derive(Clone, Debug)]
pub enum PartitionSelection {
    /// See [`PreaggregationPartitionSelection`].
    Preaggregation(PreaggregationPartitionSelection),
    /// See [`LaplacePartitionSelection`].
    Laplace(LaplacePartitionSelection),
}

impl PartitionSelection {
    /// Start building a strategy of the given kind.
    pub fn builder(kind: PartitionSelectionKind) -> PartitionSelectionBuilder {
        PartitionSelectionBuilder::default().with_kind(kind)
    }

    /// Build a strategy of the given kind from validated parameters.
    pub fn from_parameters(kind: PartitionSelectionKind, params: PrivacyParameters) -> Result<Self> {
        match kind {
            PartitionSelectionKind::Preaggregation => Ok(Self::Preaggregation(
                PreaggregationPartitionSelection::from_parameters(params),
            )),
            PartitionSelectionKind::Laplace => Ok(Self::Laplace(
                LaplacePartitionSelection::from_parameters(params, &LaplaceMechanismBuilder)?,
            )),
        }
    }

    /// Which family this strategy belongs to.
    pub fn kind(&self) -> PartitionSelectionKind {
        match self {
            Self::Preaggregation(_) => PartitionSelectionKind::Preaggregation,
            Self::Laplace(_) => PartitionSelectionKind::Laplace,
        }
    }
}

impl From<PreaggregationPartitionSelection> for PartitionSelection {
    fn from(strategy: PreaggregationPartitionSelection) -> Self {
        Self::Preaggregation(strategy)
    }
}

impl From<LaplacePartitionSelection> for PartitionSelection {
    fn from(strategy: LaplacePartitionSelection) -> Self {
        Self::Laplace(strategy)
    }
}

impl PartitionSelectionStrategy for PartitionSelection {
    fn parameters(&self) -> &PrivacyParameters {
        match self {
            Self::Preaggregation(s) => s.parameters(),
            Self::Laplace(s) => s.parameters(),
        }
    }

    fn keep_probability(&self, num_users: f64) -> f64 {
        match self {
            Self::Preaggregation(s) => s.keep_probability(num_users),
            Self::Laplace(s) => s.keep_probability(num_users),
        }
    }

    fn should_keep_with_rng<R: Rng + ?Sized>(&self, num_users: i64, rng: &mut R) -> bool {
        match self {
            Self::Preaggregation(s) => s.should_keep_with_rng(num_users, rng),
            Self::Laplace(s) => s.should_keep_with_rng(num_users, rng),
        }
    }
}

/// Builder for [`PartitionSelection`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PartitionSelectionBuilder {
    kind: PartitionSelectionKind,
    params: PrivacyParametersBuilder,
}

impl PartitionSelectionBuilder {
    /// Choose the strategy family.
    pub fn with_kind(mut self, kind: PartitionSelectionKind) -> Self {
        self.kind = kind;
        self
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

    /// Validate the parameters and build the strategy.
    pub fn build(&self) -> Result<PartitionSelection> {
        let params = self.params.build()?;
        PartitionSelection::from_parameters(self.kind, params)
    }
}

impl PartitionSelectionConfig for PartitionSelectionBuilder {
    type Strategy = PartitionSelection;

    fn build_strategy(&self) -> Result<Self::Strategy> {
        self.build()
    }
}
