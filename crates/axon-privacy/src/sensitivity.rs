use axon_core::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};

/// How much one record can move the released signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Sensitivity {
    /// Caller-supplied bound; must be finite and non-negative
    Fixed(f64),
    /// Population standard deviation of the input signal
    Empirical,
}

impl Sensitivity {
    pub fn resolve(&self, signal: &[f64]) -> VaultResult<f64> {
        let value = match *self {
            Sensitivity::Fixed(value) => value,
            Sensitivity::Empirical => empirical_std(signal),
        };
        if !value.is_finite() || value < 0.0 {
            return Err(VaultError::InvalidParameter(format!(
                "sensitivity must be finite and non-negative (got {value})"
            )));
        }
        Ok(value)
    }
}

/// Population (ddof = 0) standard deviation. Empty input yields 0.
pub fn empirical_std(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let n = signal.len() as f64;
    let mean = signal.iter().sum::<f64>() / n;
    let variance = signal.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
