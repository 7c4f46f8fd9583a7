//! Differentially private partition selection strategies.
//!
//! A strategy decides, from the number of distinct users that contributed to
//! a partition, whether that partition may be released. Two families are
//! provided:
//!
//! * [`PreaggregationPartitionSelection`] keeps a partition with the optimal
//!   closed-form probability for its count.
//! * [`LaplacePartitionSelection`] adds calibrated noise to the count and
//!   compares it against a threshold.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod laplace;
pub mod preaggregation;
pub mod selection;
pub mod strategy;

pub use laplace::{
    calculate_delta, calculate_threshold, LaplacePartitionSelection,
    LaplacePartitionSelectionBuilder,
};
pub use preaggregation::{PreaggregationPartitionSelection, PreaggregationPartitionSelectionBuilder};
pub use selection::{PartitionSelection, PartitionSelectionBuilder, PartitionSelectionKind};
pub use strategy::{PartitionSelectionConfig, PartitionSelectionStrategy};

/// Common imports for partition selection.
pub mod prelude {
    pub use crate::{
        calculate_delta, calculate_threshold, LaplacePartitionSelection,
        LaplacePartitionSelectionBuilder, PartitionSelection, PartitionSelectionBuilder,
        PartitionSelectionConfig, PartitionSelectionKind, PartitionSelectionStrategy,
        PreaggregationPartitionSelection, PreaggregationPartitionSelectionBuilder,
    };
}
