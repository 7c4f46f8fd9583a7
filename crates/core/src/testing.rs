//! Deterministic stand-ins for tests of noise-based strategies.

use rand::Rng;

use crate::noise::{NoiseMechanism, NoiseMechanismBuilder};
use crate::Result;

/// A mechanism that adds no noise at all.
///
/// Provides no privacy; it makes threshold decisions deterministic so that
/// boundary behavior can be tested exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZeroNoiseMechanism;

impl NoiseMechanism for ZeroNoiseMechanism {
    fn add_noise<R: Rng + ?Sized>(&self, value: f64, _rng: &mut R) -> f64 {
        value
    }

    fn upper_tail(&self, x: f64) -> f64 {
        if x <= 0.0 {
            1.0
        } else {
            0.0
        }
    }

    fn upper_tail_inverse(&self, p: f64) -> f64 {
        if p >= 1.0 {
            f64::NEG_INFINITY
        } else {
            0.0
        }
    }
}

/// Builder for [`ZeroNoiseMechanism`]; ignores the budget it is given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZeroNoiseMechanismBuilder;

impl NoiseMechanismBuilder for ZeroNoiseMechanismBuilder {
    type Mechanism = ZeroNoiseMechanism;

    fn calibrate(&self, _epsilon: f64, _l1_sensitivity: f64) -> Result<ZeroNoiseMechanism> {
        Ok(ZeroNoiseMechanism)
    }
}
