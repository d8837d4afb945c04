//! Gaussian plume model.
//!
//! Computes ground-level centreline PM concentration at a fixed set of
//! downwind distances for a single burn under a single weather snapshot.
//! Everything here is pure: the same inputs always produce the same profile.

use std::f64::consts::PI;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::burn::BurnRequest;
use crate::error::ValidationError;
use crate::plume::stability::StabilityParameters;
use crate::weather::{AtmosphericStability, WeatherObservation};

/// Downwind distances (m) at which every profile is sampled.
pub const SAMPLE_DISTANCES_M: [f64; 8] = [
    1_000.0, 2_000.0, 3_000.0, 5_000.0, 8_000.0, 10_000.0, 15_000.0, 20_000.0,
];

/// Concentration (µg/m³) that defines the dispersion radius.
pub const DEFAULT_DISPERSION_THRESHOLD: f64 = 10.0;

const GRAMS_PER_KG: f64 = 1_000.0;
const SECONDS_PER_HOUR: f64 = 3_600.0;
const MICROGRAMS_PER_GRAM: f64 = 1e6;

/// Plume-rise scale: `0.1 · 10` in the buoyancy term.
const PLUME_RISE_SCALE: f64 = 0.1 * 10.0;

/// Tunable constants of the plume model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlumeConfig {
    /// Physical release height before plume rise (m).
    pub base_height_m: f64,
    /// Assumed duration of a burn (hours); spreads total emissions over time.
    pub burn_duration_hours: f64,
    /// Floor applied to wind speed to keep the model finite.
    pub min_wind_speed: f64,
    /// Concentration that counts toward the dispersion radius (µg/m³).
    pub dispersion_threshold: f64,
}

impl Default for PlumeConfig {
    fn default() -> Self {
        Self {
            base_height_m: 2.0,
            burn_duration_hours: 4.0,
            min_wind_speed: 1.0,
            dispersion_threshold: DEFAULT_DISPERSION_THRESHOLD,
        }
    }
}

/// One sampled point of a plume profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlumeSample {
    /// Downwind distance (m).
    pub distance_m: f64,
    /// Ground-level centreline concentration (µg/m³).
    pub concentration: f64,
    /// Horizontal dispersion coefficient (m).
    pub sigma_y: f64,
    /// Vertical dispersion coefficient (m).
    pub sigma_z: f64,
}

/// A receptor position relative to the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Receptor {
    /// Downwind distance (m).
    pub x: f64,
    /// Crosswind offset (m).
    pub y: f64,
    /// Height above ground (m).
    pub z: f64,
}

impl Receptor {
    /// Ground-level receptor on the plume centreline.
    #[must_use]
    pub const fn centerline(x: f64) -> Self {
        Self { x, y: 0.0, z: 0.0 }
    }
}

/// The result of a plume computation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlumeProfile {
    emission_rate: f64,
    wind_speed: f64,
    effective_height: f64,
    stability: AtmosphericStability,
    samples: Vec<PlumeSample>,
    max_concentration: f64,
    max_dispersion_radius: f64,
}

impl PlumeProfile {
    /// Assembles a profile from samples, deriving the summary fields.
    ///
    /// `max_dispersion_radius` is the largest sampled distance whose
    /// concentration is at least `threshold`, or 0 if none qualify.
    #[must_use]
    pub fn from_samples(
        emission_rate: f64,
        wind_speed: f64,
        effective_height: f64,
        stability: AtmosphericStability,
        samples: Vec<PlumeSample>,
        threshold: f64,
    ) -> Self {
        let max_concentration = samples
            .iter()
            .map(|s| s.concentration)
            .fold(0.0_f64, f64::max);
        let max_dispersion_radius = samples
            .iter()
            .filter(|s| s.concentration >= threshold)
            .map(|s| s.distance_m)
            .fold(0.0_f64, f64::max);

        Self {
            emission_rate,
            wind_speed,
            effective_height,
            stability,
            samples,
            max_concentration,
            max_dispersion_radius,
        }
    }

    /// Emission rate Q (g/s).
    #[must_use]
    pub const fn emission_rate(&self) -> f64 {
        self.emission_rate
    }

    /// Wind speed used by the model, after clamping.
    #[must_use]
    pub const fn wind_speed(&self) -> f64 {
        self.wind_speed
    }

    /// Effective emission height H (m).
    #[must_use]
    pub const fn effective_height(&self) -> f64 {
        self.effective_height
    }

    /// Stability class the profile was computed for.
    #[must_use]
    pub const fn stability(&self) -> AtmosphericStability {
        self.stability
    }

    /// Samples at the fixed downwind distances, nearest first.
    #[must_use]
    pub fn samples(&self) -> &[PlumeSample] {
        &self.samples
    }

    /// Highest sampled concentration (µg/m³).
    #[must_use]
    pub const fn max_concentration(&self) -> f64 {
        self.max_concentration
    }

    /// Furthest sampled distance (m) at or above the threshold.
    #[must_use]
    pub const fn max_dispersion_radius(&self) -> f64 {
        self.max_dispersion_radius
    }

    /// Concentration between samples, interpolated linearly in log space.
    ///
    /// Returns `None` outside the sampled distance range.
    #[must_use]
    pub fn concentration_near(&self, distance_m: f64) -> Option<f64> {
        let idx = self
            .samples
            .iter()
            .position(|s| s.distance_m >= distance_m)?;
        let hi = self.samples[idx];
        if (hi.distance_m - distance_m).abs() < f64::EPSILON {
            return Some(hi.concentration);
        }
        let lo = *self.samples.get(idx.checked_sub(1)?)?;

        let t = (distance_m - lo.distance_m) / (hi.distance_m - lo.distance_m);
        if lo.concentration <= 0.0 || hi.concentration <= 0.0 {
            return Some(lo.concentration + t * (hi.concentration - lo.concentration));
        }
        let log = lo.concentration.ln() + t * (hi.concentration.ln() - lo.concentration.ln());
        Some(log.exp())
    }

    /// Full Gaussian plume concentration with ground reflection at an
    /// arbitrary receptor (µg/m³). Zero at or upwind of the source.
    #[must_use]
    pub fn concentration_at(&self, receptor: Receptor) -> f64 {
        if receptor.x <= 0.0 {
            return 0.0;
        }
        let params = StabilityParameters::for_class(self.stability);
        let sigma_y = params.sigma_y(receptor.x);
        let sigma_z = params.sigma_z(receptor.x);
        if sigma_y <= 0.0 || sigma_z <= 0.0 {
            return 0.0;
        }
        let h = self.effective_height;

        let crosswind = (-0.5 * (receptor.y / sigma_y).powi(2)).exp();
        let direct = (-0.5 * ((receptor.z - h) / sigma_z).powi(2)).exp();
        let reflected = (-0.5 * ((receptor.z + h) / sigma_z).powi(2)).exp();

        self.emission_rate / (2.0 * PI * self.wind_speed * sigma_y * sigma_z)
            * crosswind
            * (direct + reflected)
            * MICROGRAMS_PER_GRAM
    }
}

/// Gaussian plume model bound to a configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlumeModel {
    config: PlumeConfig,
}

impl PlumeModel {
    /// Creates a model with the given constants.
    #[must_use]
    pub const fn new(config: PlumeConfig) -> Self {
        Self { config }
    }

    /// Model constants.
    #[must_use]
    pub const fn config(&self) -> &PlumeConfig {
        &self.config
    }

    /// Emission rate Q in g/s for a burn.
    #[must_use]
    pub fn emission_rate(&self, burn: &BurnRequest) -> f64 {
        let total_kg =
            burn.fuel_type.emission_factor() * burn.acreage * burn.intensity.emission_multiplier();
        total_kg * GRAMS_PER_KG / (self.config.burn_duration_hours * SECONDS_PER_HOUR)
    }

    /// Wind speed after applying the configured floor.
    #[must_use]
    pub fn effective_wind_speed(&self, weather: &WeatherObservation) -> f64 {
        weather.wind_speed.max(self.config.min_wind_speed)
    }

    /// Effective height H = base height + buoyant plume rise.
    #[must_use]
    pub fn effective_height(&self, burn: &BurnRequest, wind_speed: f64) -> f64 {
        let rise =
            burn.intensity.rise_factor() * burn.acreage.sqrt() * PLUME_RISE_SCALE / wind_speed;
        self.config.base_height_m + rise
    }

    /// Computes the plume profile for a burn under the given weather.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAcreage` if the burn's acreage is not positive
    /// - `NegativeWindSpeed` if the observation carries negative wind
    pub fn compute(
        &self,
        burn: &BurnRequest,
        weather: &WeatherObservation,
    ) -> Result<PlumeProfile, ValidationError> {
        burn.validate()?;
        if weather.wind_speed < 0.0 || weather.wind_speed.is_nan() {
            return Err(ValidationError::NegativeWindSpeed {
                value: weather.wind_speed,
            });
        }

        let q = self.emission_rate(burn);
        let u = self.effective_wind_speed(weather);
        let h = self.effective_height(burn, u);
        let params = StabilityParameters::for_class(weather.atmospheric_stability);

        let samples = SAMPLE_DISTANCES_M
            .iter()
            .map(|&x| {
                let sigma_y = params.sigma_y(x);
                let sigma_z = params.sigma_z(x);
                let concentration = centerline_concentration(q, u, h, sigma_y, sigma_z);
                PlumeSample {
                    distance_m: x,
                    concentration,
                    sigma_y,
                    sigma_z,
                }
            })
            .collect();

        let profile = PlumeProfile::from_samples(
            q,
            u,
            h,
            weather.atmospheric_stability,
            samples,
            self.config.dispersion_threshold,
        );

        tracing::debug!(
            burn_id = %burn.id,
            emission_rate = q,
            effective_height = h,
            max_concentration = profile.max_concentration(),
            max_dispersion_radius = profile.max_dispersion_radius(),
            "computed plume"
        );

        Ok(profile)
    }

    /// Computes many profiles in parallel, preserving input order.
    #[must_use]
    pub fn compute_many(
        &self,
        inputs: &[(BurnRequest, WeatherObservation)],
    ) -> Vec<Result<PlumeProfile, ValidationError>> {
        inputs
            .par_iter()
            .map(|(burn, weather)| self.compute(burn, weather))
            .collect()
    }
}

/// Ground-level centreline concentration (µg/m³).
fn centerline_concentration(q: f64, u: f64, h: f64, sigma_y: f64, sigma_z: f64) -> f64 {
    q / (PI * u * sigma_y * sigma_z) * (-0.5 * (h / sigma_z).powi(2)).exp() * MICROGRAMS_PER_GRAM
}

/// Computes a plume profile with the default configuration.
///
/// # Errors
///
/// See [`PlumeModel::compute`].
pub fn compute_plume(
    burn: &BurnRequest,
    weather: &WeatherObservation,
) -> Result<PlumeProfile, ValidationError> {
    PlumeModel::default().compute(burn, weather)
}
