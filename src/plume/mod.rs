//! Gaussian plume dispersion.
//!
//! Predicts ground-level smoke concentration downwind of a burn from the
//! burn's emission rate, the wind speed, the effective release height, and
//! stability-dependent dispersion coefficients.

mod model;
mod stability;

pub use model::{
    compute_plume, PlumeConfig, PlumeModel, PlumeProfile, PlumeSample, Receptor,
    DEFAULT_DISPERSION_THRESHOLD, SAMPLE_DISTANCES_M,
};
pub use stability::StabilityParameters;
