//! Differentially private partition selection.
//!
//! Decides from a partition's distinct-user count whether it may appear in a
//! private release. Start from [`PreaggregationPartitionSelection::builder`]
//! or [`LaplacePartitionSelection::builder`], or pick a family at runtime with
//! [`PartitionSelection::builder`].
//!
//! ```
//! use partition_selection::prelude::*;
//!
//! let strategy = PreaggregationPartitionSelection::builder()
//!     .with_epsilon(0.5)
//!     .with_delta(0.02)
//!     .with_max_partitions_contributed(1)
//!     .build()?;
//! assert!(!strategy.should_keep(0));
//! assert!(strategy.should_keep(1_000));
//! # Ok::<(), partition_selection::DpError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use partition_selection_audit as audit;
pub use partition_selection_core as core;
pub use partition_selection_strategy as strategy;

pub use partition_selection_audit::{
    verify_privacy_curve, CurveReport, CurveViolation, KeepRateAuditor, KeepRateEstimate,
    NeighbourBound,
};
pub use partition_selection_core::testing;
pub use partition_selection_core::{
    per_partition_delta, total_delta, DpError, LaplaceMechanism, LaplaceMechanismBuilder,
    NoiseMechanism, NoiseMechanismBuilder, PrivacyParameters, PrivacyParametersBuilder, Result,
};
pub use partition_selection_strategy::{
    calculate_delta, calculate_threshold, LaplacePartitionSelection,
    LaplacePartitionSelectionBuilder, PartitionSelection, PartitionSelectionBuilder,
    PartitionSelectionConfig, PartitionSelectionKind, PartitionSelectionStrategy,
    PreaggregationPartitionSelection, PreaggregationPartitionSelectionBuilder,
};

/// Convenience prelude covering strategies, parameters and auditing.
pub mod prelude {
    pub use partition_selection_audit::prelude::*;
    pub use partition_selection_core::prelude::*;
    pub use partition_selection_strategy::prelude::*;
}
