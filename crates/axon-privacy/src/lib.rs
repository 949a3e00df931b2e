//! axon-privacy: calibrated noise for numeric signal release
//!
//! Each call is calibrated independently against the epsilon (and delta) it
//! is given. Nothing is tracked across calls: composing several releases of
//! the same data is the caller's budget to manage.
//!
//! With [`Sensitivity::Empirical`] the scale is derived from the signal's own
//! spread. That is a local-sensitivity heuristic and does not carry a formal
//! differential-privacy guarantee; supply [`Sensitivity::Fixed`] with a
//! global bound when one is known.

pub mod mechanism;
pub mod sensitivity;

pub use mechanism::{add_noise, add_noise_with_rng, NoiseMechanism};
pub use sensitivity::{empirical_std, Sensitivity};
