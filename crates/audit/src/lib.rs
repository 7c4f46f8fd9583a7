//! Empirical and exact auditing of partition selection strategies.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auditor;
mod curve;
mod stats;

pub use auditor::{KeepRateAuditor, KeepRateEstimate};
pub use curve::{verify_privacy_curve, CurveReport, CurveViolation, NeighbourBound};
pub use stats::{binomial_two_sided_p_value, wilson_interval, z_for_confidence};

/// Common imports for auditing.
pub mod prelude {
    pub use crate::{
        binomial_two_sided_p_value, verify_privacy_curve, wilson_interval, z_for_confidence,
        CurveReport, CurveViolation, KeepRateAuditor, KeepRateEstimate, NeighbourBound,
    };
}
