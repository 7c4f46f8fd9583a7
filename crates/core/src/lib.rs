//! Core types for differentially private partition selection.
//!
//! This crate provides the pieces every selection strategy shares:
//! validated privacy parameters, the error type, and the additive noise
//! mechanisms consumed by threshold-based selection.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod noise;
pub mod params;
pub mod testing;

pub use error::{DpError, Result};
pub use noise::{
    laplace_upper_tail, laplace_upper_tail_inverse, LaplaceMechanism, LaplaceMechanismBuilder,
    NoiseMechanism, NoiseMechanismBuilder,
};
pub use params::{per_partition_delta, total_delta, PrivacyParameters, PrivacyParametersBuilder};

/// Common imports for downstream users.
pub mod prelude {
    pub use crate::{
        laplace_upper_tail, laplace_upper_tail_inverse, per_partition_delta, total_delta,
        DpError, LaplaceMechanism, LaplaceMechanismBuilder, NoiseMechanism,
        NoiseMechanismBuilder, PrivacyParameters, PrivacyParametersBuilder, Result,
    };
}
