//! Laplace and Gaussian noise mechanisms

use axon_core::{VaultError, VaultResult};
use rand::Rng;
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};

use crate::sensitivity::Sensitivity;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum NoiseMechanism {
    /// Laplace(0, Δ/ε) per element
    Laplace,
    /// Normal(0, σ) per element, σ = Δ·sqrt(2·ln(1.25/δ))/ε; δ ∈ (0, 1)
    Gaussian { delta: f64 },
}

impl NoiseMechanism {
    /// Noise scale for the given sensitivity and epsilon: the Laplace `b`
    /// or the Gaussian standard deviation.
    pub fn scale(&self, sensitivity: f64, epsilon: f64) -> VaultResult<f64> {
        if !(epsilon > 0.0) {
            return Err(VaultError::InvalidParameter(format!(
                "epsilon must be greater than 0 (got {epsilon})"
            )));
        }

        let scale = match *self {
            NoiseMechanism::Laplace => sensitivity / epsilon,
            NoiseMechanism::Gaussian { delta } => {
                if !(delta > 0.0 && delta < 1.0) {
                    return Err(VaultError::InvalidParameter(format!(
                        "delta must lie in (0, 1) (got {delta})"
                    )));
                }
                sensitivity * (2.0 * (1.25 / delta).ln()).sqrt() / epsilon
            }
        };

        if !scale.is_finite() {
            return Err(VaultError::InvalidParameter(format!(
                "noise scale overflowed (sensitivity {sensitivity}, epsilon {epsilon})"
            )));
        }
        Ok(scale)
    }
}

/// Add calibrated noise to every element of `signal`.
///
/// The output has the same length as the input. An infinite epsilon or a zero
/// sensitivity returns the signal unchanged.
/// Any non-finite noisy sample is an [`VaultError::InvalidParameter`].
pub fn add_noise(
    signal: &[f64],
    epsilon: f64,
    mechanism: NoiseMechanism,
    sensitivity: Sensitivity,
) -> VaultResult<Vec<f64>> {
    add_noise_with_rng(&mut rand::thread_rng(), signal, epsilon, mechanism, sensitivity)
}

/// [`add_noise`] with a caller-provided RNG (seeded RNGs make tests repeatable).
pub fn add_noise_with_rng<R: Rng + ?Sized>(
    rng: &mut R,
    signal: &[f64],
    epsilon: f64,
    mechanism: NoiseMechanism,
    sensitivity: Sensitivity,
) -> VaultResult<Vec<f64>> {
    let sensitivity = sensitivity.resolve(signal)?;
    let scale = mechanism.scale(sensitivity, epsilon)?;

    tracing::debug!(
        ?mechanism,
        epsilon,
        sensitivity,
        scale,
        len = signal.len(),
        "adding calibrated noise"
    );

    if scale == 0.0 {
        return Ok(signal.to_vec());
    }

    let noisy: Vec<f64> = match mechanism {
        NoiseMechanism::Laplace => {
            // Laplace(0, b) is the difference of two independent Exp(1/b) draws.
            let exp = Exp::new(1.0 / scale)
                .map_err(|e| VaultError::InvalidParameter(format!("laplace scale {scale}: {e}")))?;
            signal
                .iter()
                .map(|x| x + exp.sample(rng) - exp.sample(rng))
                .collect()
        }
        NoiseMechanism::Gaussian { .. } => {
            let normal = Normal::new(0.0, scale)
                .map_err(|e| VaultError::InvalidParameter(format!("gaussian sigma {scale}: {e}")))?;
            signal.iter().map(|x| x + normal.sample(rng)).collect()
        }
    };

    // A finite scale can still push samples past f64::MAX.
    if let Some(i) = noisy.iter().position(|x| !x.is_finite()) {
        return Err(VaultError::InvalidParameter(format!(
            "noisy sample {i} is not finite (scale {scale})"
        )));
    }
    Ok(noisy)
}
