//! Additive noise mechanisms consumed by threshold-based partition selection.

use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::{DpError, Result};

/// An additive noise source with a closed-form tail.
///
/// Implementations must be stateless apart from the RNG passed in, so that a
/// mechanism can be shared by several workers, each with its own RNG.
pub trait NoiseMechanism {
    /// Return `value` plus one fresh noise sample.
    fn add_noise<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> f64;

    /// Probability that a noise sample is at least `x`.
    fn upper_tail(&self, x: f64) -> f64;

    /// Smallest `x` with `upper_tail(x) <= p`.
    fn upper_tail_inverse(&self, p: f64) -> f64;
}

/// Calibrates a [`NoiseMechanism`] for a privacy budget.
///
/// Builders are called once, when the consuming strategy is built, with the
/// final epsilon and L1 sensitivity.
pub trait NoiseMechanismBuilder {
    /// Mechanism produced by this builder.
    type Mechanism: NoiseMechanism;

    /// Create a mechanism providing `epsilon`-DP for the given L1 sensitivity.
    fn calibrate(&self, epsilon: f64, l1_sensitivity: f64) -> Result<Self::Mechanism>;
}

/// `P[Z >= x]` for `Z ~ Laplace(0, scale)`.
pub fn laplace_upper_tail(x: f64, scale: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x > 0.0 {
        0.5 * (-x / scale).exp()
    } else {
        1.0 - 0.5 * (x / scale).exp()
    }
}

/// Inverse of [`laplace_upper_tail`] in `x`.
pub fn laplace_upper_tail_inverse(p: f64, scale: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::INFINITY;
    }
    if p >= 1.0 {
        return f64::NEG_INFINITY;
    }
    if p <= 0.5 {
        -scale * (2.0 * p).ln()
    } else {
        scale * (2.0 * (1.0 - p)).ln()
    }
}

/// Laplace mechanism with sensitivity calibration.
#[derive(Clone, Debug)]
pub struct LaplaceMechanism {
    epsilon: f64,
    l1_sensitivity: f64,
    exp: Exp<f64>,
}

impl LaplaceMechanism {
    /// Create a Laplace mechanism with scale `l1_sensitivity / epsilon`.
    pub fn new(epsilon: f64, l1_sensitivity: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(DpError::invalid(format!(
                "Laplace epsilon has to be positive and finite, but is {epsilon}"
            )));
        }
        if !l1_sensitivity.is_finite() || l1_sensitivity <= 0.0 {
            return Err(DpError::invalid(format!(
                "Laplace L1 sensitivity has to be positive and finite, but is {l1_sensitivity}"
            )));
        }
        let scale = l1_sensitivity / epsilon;
        // Laplace noise is the difference of two exponentials.
        let exp = Exp::new(1.0 / scale)
            .map_err(|e| DpError::invalid(format!("Laplace scale {scale} is unusable: {e}")))?;
        Ok(Self {
            epsilon,
            l1_sensitivity,
            exp,
        })
    }

    /// Epsilon the mechanism was calibrated for.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// L1 sensitivity the mechanism was calibrated for.
    pub fn l1_sensitivity(&self) -> f64 {
        self.l1_sensitivity
    }

    /// Get the scale parameter.
    pub fn scale(&self) -> f64 {
        self.l1_sensitivity / self.epsilon
    }
}

impl NoiseMechanism for LaplaceMechanism {
    fn add_noise<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> f64 {
        let noise = self.exp.sample(rng) - self.exp.sample(rng);
        value + noise
    }

    fn upper_tail(&self, x: f64) -> f64 {
        laplace_upper_tail(x, self.scale())
    }

    fn upper_tail_inverse(&self, p: f64) -> f64 {
        laplace_upper_tail_inverse(p, self.scale())
    }
}

/// Builder for [`LaplaceMechanism`], the default noise for threshold selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LaplaceMechanismBuilder;

impl NoiseMechanismBuilder for LaplaceMechanismBuilder {
    type Mechanism = LaplaceMechanism;

    fn calibrate(&self, epsilon: f64, l1_sensitivity: f64) -> Result<LaplaceMechanism> {
        LaplaceMechanism::new(epsilon, l1_sensitivity)
    }
}
