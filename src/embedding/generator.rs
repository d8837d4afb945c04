//! Deterministic encoders for the four embedding kinds.
//!
//! Every vector starts with a handful of semantic slots (min-max scaled
//! measurements and ordinal-encoded categories). The remaining slots are a
//! smoothed, decaying continuation of those semantic values with a small
//! amount of seeded noise, so near-identical situations stay close under
//! cosine distance across the whole vector.
//!
//! Randomness comes from a `StdRng` seeded per call from the generator seed,
//! the vector kind, and the anchoring semantic slots (hashed with blake3).
//! No RNG state is shared between calls.

use std::f64::consts::{PI, TAU};

use blake3::Hasher;
use chrono::{Datelike, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::burn::BurnRequest;
use crate::decision::SchedulingDecision;
use crate::embedding::{
    EmbeddingKind, EmbeddingVector, BURN_DIM, DECISION_DIM, SMOKE_DIM, WEATHER_DIM,
};
use crate::error::SmokeResult;
use crate::plume::PlumeProfile;
use crate::weather::{AtmosphericStability, WeatherObservation};

/// Seed used by `EmbeddingGenerator::default()`.
pub const DEFAULT_EMBEDDING_SEED: u64 = 0x5EED_B0B5;

// Declared domains for min-max scaling.
const TEMPERATURE_RANGE: (f64, f64) = (-20.0, 50.0);
const HUMIDITY_RANGE: (f64, f64) = (0.0, 100.0);
const WIND_SPEED_RANGE: (f64, f64) = (0.0, 30.0);
const WIND_DIRECTION_RANGE: (f64, f64) = (0.0, 360.0);
const PRESSURE_RANGE: (f64, f64) = (950.0, 1050.0);
const ACREAGE_RANGE: (f64, f64) = (0.0, 1000.0);

/// Concentration (µg/m³) that maps to full smoke strength.
const CONCENTRATION_REFERENCE: f64 = 10_000.0;

const WEATHER_SEMANTIC: usize = 6;
const SMOKE_SEMANTIC: usize = 5;
const BURN_SEMANTIC: usize = 6;
const DECISION_SEMANTIC: usize = 6;

/// Decay length (slots) of the correlated tail.
const TAIL_DECAY: f64 = 40.0;
/// Weight of the running value when smoothing the tail.
const TAIL_SMOOTHING: f64 = 0.6;
/// Amplitude of seeded noise in the correlated tail.
const TAIL_NOISE: f64 = 0.05;

const SMOKE_WIND_DECAY: f64 = 24.0;
const SMOKE_TEMP_DECAY: f64 = 16.0;
const SMOKE_PHASE_STEP: f64 = 0.15;

/// Amplitude of seeded jitter in the burn tail.
const BURN_JITTER: f64 = 0.02;

/// Encodes domain records as fixed-length unit vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingGenerator {
    seed: u64,
}

impl Default for EmbeddingGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_SEED)
    }
}

impl EmbeddingGenerator {
    /// Creates a generator with the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed for the padding noise.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// 128-d weather vector.
    ///
    /// Slots 0–5: temperature, humidity, wind speed, wind direction, pressure,
    /// stability ordinal. Slots 6.. are a correlated tail seeded by slot 5.
    ///
    /// # Errors
    ///
    /// Only fails if the internal dimension bookkeeping is inconsistent.
    pub fn weather_vector(&self, weather: &WeatherObservation) -> SmokeResult<EmbeddingVector> {
        let mut raw = [0.0_f64; WEATHER_DIM];
        raw[0] = scale(weather.temperature, TEMPERATURE_RANGE);
        raw[1] = scale(weather.humidity, HUMIDITY_RANGE);
        raw[2] = scale(weather.wind_speed, WIND_SPEED_RANGE);
        raw[3] = scale(weather.wind_direction, WIND_DIRECTION_RANGE);
        raw[4] = scale(weather.pressure, PRESSURE_RANGE);
        raw[5] = stability_ordinal(weather.atmospheric_stability);

        let mut rng = self.rng(EmbeddingKind::Weather, &raw[5..6]);
        correlated_tail(&mut raw, WEATHER_SEMANTIC, &mut rng);

        EmbeddingVector::normalized(EmbeddingKind::Weather, &raw)
    }

    /// 64-d smoke vector.
    ///
    /// Slots 0–4: acreage, fuel ordinal, intensity ordinal, wind speed,
    /// temperature. Slots 5.. mix a wind-direction cosine and a temperature
    /// sine, each decaying with slot position, scaled by plume strength.
    ///
    /// # Errors
    ///
    /// Only fails if the internal dimension bookkeeping is inconsistent.
    pub fn smoke_vector(
        &self,
        burn: &BurnRequest,
        weather: &WeatherObservation,
        plume: &PlumeProfile,
    ) -> SmokeResult<EmbeddingVector> {
        let mut raw = [0.0_f64; SMOKE_DIM];
        raw[0] = scale(burn.acreage, ACREAGE_RANGE);
        raw[1] = burn.fuel_type.ordinal();
        raw[2] = burn.intensity.ordinal();
        raw[3] = scale(weather.wind_speed, WIND_SPEED_RANGE);
        raw[4] = scale(weather.temperature, TEMPERATURE_RANGE);

        let direction = weather.wind_direction.to_radians();
        let temp_phase = raw[4] * PI;
        let strength = 0.5 + 0.5 * concentration_strength(plume.max_concentration());

        for (i, slot) in raw.iter_mut().enumerate().skip(SMOKE_SEMANTIC) {
            let k = (i - SMOKE_SEMANTIC) as f64;
            let wind_term =
                (direction + k * SMOKE_PHASE_STEP).cos() * (-k / SMOKE_WIND_DECAY).exp();
            let temp_term =
                (temp_phase + k * SMOKE_PHASE_STEP).sin() * (-k / SMOKE_TEMP_DECAY).exp();
            *slot = 0.5 * (wind_term + temp_term) * strength;
        }

        EmbeddingVector::normalized(EmbeddingKind::Smoke, &raw)
    }

    /// 32-d burn vector.
    ///
    /// Slots 0–5: acreage, fuel ordinal, intensity ordinal, hour of day,
    /// sin(month), cos(month), taken from the window start. The hour is
    /// cyclic: slot 3 holds `(1 + cos)/2` of the hour angle and slot 6 the
    /// matching `(1 + sin)/2`, so 23:00 sits next to 00:00 and 06:00 stays
    /// apart from 18:00. Slots 7.. are the mean of slots 0–2 decayed
    /// linearly, plus seeded jitter.
    ///
    /// # Errors
    ///
    /// Only fails if the internal dimension bookkeeping is inconsistent.
    pub fn burn_vector(&self, burn: &BurnRequest) -> SmokeResult<EmbeddingVector> {
        let start = burn.window.from;
        let month_angle = TAU * f64::from(start.month0()) / 12.0;
        let hour_angle = TAU * f64::from(start.hour()) / 24.0;

        let mut raw = [0.0_f64; BURN_DIM];
        raw[0] = scale(burn.acreage, ACREAGE_RANGE);
        raw[1] = burn.fuel_type.ordinal();
        raw[2] = burn.intensity.ordinal();
        raw[3] = 0.5 * (1.0 + hour_angle.cos());
        raw[4] = month_angle.sin();
        raw[5] = month_angle.cos();

        raw[BURN_SEMANTIC] = 0.5 * (1.0 + hour_angle.sin());

        let mean = (raw[0] + raw[1] + raw[2]) / 3.0;
        let tail_start = BURN_SEMANTIC + 1;
        let span = (BURN_DIM - tail_start) as f64;
        let mut rng = self.rng(EmbeddingKind::Burn, &raw[1..3]);
        for (i, slot) in raw.iter_mut().enumerate().skip(tail_start) {
            let k = (i - tail_start) as f64;
            let jitter: f64 = rng.random_range(-BURN_JITTER..BURN_JITTER);
            *slot = mean * (1.0 - k / span) + jitter;
        }

        EmbeddingVector::normalized(EmbeddingKind::Burn, &raw)
    }

    /// 32-d decision vector.
    ///
    /// Slots 0–5: outcome ordinal, confidence, risk, requires-approval,
    /// has-conflicts, weather-window-ok. Slots 6.. are a correlated tail seeded
    /// by slot 0.
    ///
    /// # Errors
    ///
    /// Only fails if the internal dimension bookkeeping is inconsistent.
    pub fn decision_vector(&self, decision: &SchedulingDecision) -> SmokeResult<EmbeddingVector> {
        let mut raw = [0.0_f64; DECISION_DIM];
        raw[0] = decision.outcome.ordinal();
        raw[1] = decision.confidence.clamp(0.0, 1.0);
        raw[2] = decision.risk_level.clamp(0.0, 1.0);
        raw[3] = flag(decision.requires_approval);
        raw[4] = flag(decision.has_conflicts);
        raw[5] = flag(decision.weather_window_ok);

        let mut rng = self.rng(EmbeddingKind::Decision, &raw[0..1]);
        correlated_tail(&mut raw, DECISION_SEMANTIC, &mut rng);

        EmbeddingVector::normalized(EmbeddingKind::Decision, &raw)
    }

    fn rng(&self, kind: EmbeddingKind, anchors: &[f64]) -> StdRng {
        let mut h = Hasher::new();
        h.update(&self.seed.to_le_bytes());
        h.update(kind.as_str().as_bytes());
        for anchor in anchors {
            h.update(&anchor.to_bits().to_le_bytes());
        }
        StdRng::from_seed(*h.finalize().as_bytes())
    }
}

/// Min-max scales `value` into [0, 1] over `(min, max)`.
fn scale(value: f64, (min, max): (f64, f64)) -> f64 {
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

const fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Stability ordinal; more vertical mixing maps higher.
const fn stability_ordinal(class: AtmosphericStability) -> f64 {
    match class {
        AtmosphericStability::VeryUnstable => 0.9,
        AtmosphericStability::Unstable => 0.7,
        AtmosphericStability::Neutral => 0.5,
        AtmosphericStability::Stable => 0.3,
        AtmosphericStability::VeryStable => 0.1,
    }
}

/// Log-scaled plume strength in [0, 1].
fn concentration_strength(max_concentration: f64) -> f64 {
    (max_concentration.max(0.0).ln_1p() / CONCENTRATION_REFERENCE.ln_1p()).clamp(0.0, 1.0)
}

/// Fills `raw[semantic..]` with a smoothed, decaying walk over the semantic
/// slots perturbed by seeded noise.
fn correlated_tail(raw: &mut [f64], semantic: usize, rng: &mut StdRng) {
    let mut carry = raw[semantic - 1];
    for i in semantic..raw.len() {
        let k = i - semantic;
        let anchor = raw[k % semantic];
        let noise: f64 = rng.random_range(-1.0..1.0);
        carry = TAIL_SMOOTHING * carry + (1.0 - TAIL_SMOOTHING) * (anchor + TAIL_NOISE * noise);
        raw[i] = carry * (-(k as f64) / TAIL_DECAY).exp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burn::{BurnIntensity, FuelType};
    use crate::decision::DecisionOutcome;
    use crate::plume::compute_plume;
    use crate::similarity::cosine_similarity;
    use crate::time::TimeRange;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn weather(temp: f64, wind: f64, stability: AtmosphericStability) -> WeatherObservation {
        WeatherObservation::builder()
            .temperature(temp)
            .humidity(50.0)
            .wind_speed(wind)
            .wind_direction(180.0)
            .pressure(1012.0)
            .atmospheric_stability(stability)
            .build()
            .unwrap()
    }

    fn burn_at(hour: u32, month: u32, acres: f64, fuel: FuelType) -> BurnRequest {
        let start = Utc.with_ymd_and_hms(2024, month, 10, hour, 0, 0).unwrap();
        BurnRequest::builder()
            .acreage(acres)
            .fuel_type(fuel)
            .intensity(BurnIntensity::Moderate)
            .window(TimeRange::starting_for(start, Duration::hours(4)).unwrap())
            .build()
            .unwrap()
    }

    fn sim(a: &EmbeddingVector, b: &EmbeddingVector) -> f64 {
        cosine_similarity(a.values(), b.values()).unwrap()
    }

    #[test]
    fn test_dimensions_and_unit_norm() {
        let g = EmbeddingGenerator::default();
        let w = weather(20.0, 5.0, AtmosphericStability::Neutral);
        let b = burn_at(9, 10, 100.0, FuelType::RiceStraw);
        let p = compute_plume(&b, &w).unwrap();
        let d = SchedulingDecision::new(DecisionOutcome::Approved, 0.8, 0.2, Utc::now()).unwrap();

        let vectors = [
            g.weather_vector(&w).unwrap(),
            g.smoke_vector(&b, &w, &p).unwrap(),
            g.burn_vector(&b).unwrap(),
            g.decision_vector(&d).unwrap(),
        ];
        for v in &vectors {
            assert_eq!(v.dim(), v.kind().dim());
            assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_same_seed_is_bit_identical() {
        let w = weather(18.5, 7.2, AtmosphericStability::Stable);
        let b = burn_at(7, 4, 250.0, FuelType::WheatStubble);
        let p = compute_plume(&b, &w).unwrap();

        let g1 = EmbeddingGenerator::new(42);
        let g2 = EmbeddingGenerator::new(42);
        assert_eq!(g1.weather_vector(&w).unwrap(), g2.weather_vector(&w).unwrap());
        assert_eq!(g1.smoke_vector(&b, &w, &p).unwrap(), g2.smoke_vector(&b, &w, &p).unwrap());
        assert_eq!(g1.burn_vector(&b).unwrap(), g2.burn_vector(&b).unwrap());
    }

    #[test]
    fn test_different_seed_changes_padding_only_slightly() {
        let w = weather(18.5, 7.2, AtmosphericStability::Stable);
        let a = EmbeddingGenerator::new(1).weather_vector(&w).unwrap();
        let b = EmbeddingGenerator::new(2).weather_vector(&w).unwrap();
        assert_ne!(a, b);
        assert!(sim(&a, &b) > 0.99);
    }

    #[test]
    fn test_near_duplicate_weather_stays_close() {
        let g = EmbeddingGenerator::default();
        let a = g.weather_vector(&weather(20.0, 5.0, AtmosphericStability::Neutral)).unwrap();
        let b = g.weather_vector(&weather(20.5, 5.2, AtmosphericStability::Neutral)).unwrap();
        let c = g.weather_vector(&weather(-10.0, 25.0, AtmosphericStability::VeryStable)).unwrap();

        assert!(sim(&a, &b) > 0.99);
        assert!(sim(&a, &b) > sim(&a, &c));
    }

    #[test]
    fn test_semantic_slots_are_scaled() {
        let g = EmbeddingGenerator::default();
        // Out-of-domain inputs clamp to the ends of [0, 1] before normalising.
        let hot = weather(80.0, 5.0, AtmosphericStability::Neutral);
        let v = g.weather_vector(&hot).unwrap();
        let cold = weather(-40.0, 5.0, AtmosphericStability::Neutral);
        let u = g.weather_vector(&cold).unwrap();
        assert!(v.values()[0] > 0.0);
        assert_eq!(u.values()[0], 0.0);
    }

    #[test]
    fn test_smoke_vector_tracks_wind_direction() {
        let g = EmbeddingGenerator::default();
        let b = burn_at(9, 10, 100.0, FuelType::RiceStraw);
        let south = weather(20.0, 5.0, AtmosphericStability::Neutral);
        let mut north = south.clone();
        north.wind_direction = 0.0;
        let mut south_ish = south.clone();
        south_ish.wind_direction = 185.0;

        let p = compute_plume(&b, &south).unwrap();
        let vs = g.smoke_vector(&b, &south, &p).unwrap();
        let vn = g.smoke_vector(&b, &north, &p).unwrap();
        let vsi = g.smoke_vector(&b, &south_ish, &p).unwrap();

        assert!(sim(&vs, &vsi) > sim(&vs, &vn));
    }

    #[test]
    fn test_burn_vector_month_wraps() {
        let g = EmbeddingGenerator::default();
        let dec = g.burn_vector(&burn_at(9, 12, 100.0, FuelType::CornStalks)).unwrap();
        let jan = g.burn_vector(&burn_at(9, 1, 100.0, FuelType::CornStalks)).unwrap();
        let jun = g.burn_vector(&burn_at(9, 6, 100.0, FuelType::CornStalks)).unwrap();

        assert!(sim(&dec, &jan) > sim(&dec, &jun));
    }

    #[test]
    fn test_burn_vector_hour_wraps() {
        let g = EmbeddingGenerator::default();
        let late = g.burn_vector(&burn_at(23, 10, 100.0, FuelType::RiceStraw)).unwrap();
        let midnight = g.burn_vector(&burn_at(0, 10, 100.0, FuelType::RiceStraw)).unwrap();
        let noon = g.burn_vector(&burn_at(12, 10, 100.0, FuelType::RiceStraw)).unwrap();
        assert!(sim(&late, &midnight) > sim(&late, &noon));

        let morning = g.burn_vector(&burn_at(6, 10, 100.0, FuelType::RiceStraw)).unwrap();
        let evening = g.burn_vector(&burn_at(18, 10, 100.0, FuelType::RiceStraw)).unwrap();
        assert_ne!(morning, evening);
    }

    #[test]
    fn test_unknown_fuel_uses_midpoint_ordinal() {
        use crate::burn::UNKNOWN_ORDINAL;

        let fuel = FuelType::Other("hemp".into());
        assert_relative_eq!(fuel.ordinal(), UNKNOWN_ORDINAL);

        // Moderate intensity also encodes as 0.5, so slots 1 and 2 match
        // after normalisation.
        let g = EmbeddingGenerator::default();
        let v = g.burn_vector(&burn_at(9, 10, 100.0, fuel)).unwrap();
        assert_relative_eq!(BurnIntensity::Moderate.ordinal(), UNKNOWN_ORDINAL);
        assert_eq!(v.values()[1], v.values()[2]);
        assert!(v.values()[1] > 0.0);
    }

    #[test]
    fn test_decision_vectors_separate_outcomes() {
        let g = EmbeddingGenerator::default();
        let now = Utc::now();
        let approved = SchedulingDecision::new(DecisionOutcome::Approved, 0.9, 0.1, now)
            .unwrap()
            .weather_window_ok(true);
        let approved2 = SchedulingDecision::new(DecisionOutcome::Approved, 0.85, 0.15, now)
            .unwrap()
            .weather_window_ok(true);
        let rejected = SchedulingDecision::new(DecisionOutcome::Rejected, 0.9, 0.9, now)
            .unwrap()
            .has_conflicts(true)
            .requires_approval(true);

        let a = g.decision_vector(&approved).unwrap();
        let a2 = g.decision_vector(&approved2).unwrap();
        let r = g.decision_vector(&rejected).unwrap();
        assert!(sim(&a, &a2) > sim(&a, &r));
    }

    #[test]
    fn test_scale_clamps() {
        assert_eq!(scale(-100.0, TEMPERATURE_RANGE), 0.0);
        assert_eq!(scale(100.0, TEMPERATURE_RANGE), 1.0);
        assert_relative_eq!(scale(15.0, TEMPERATURE_RANGE), 0.5);
    }

    #[test]
    fn test_concentration_strength_bounds() {
        assert_eq!(concentration_strength(0.0), 0.0);
        assert_eq!(concentration_strength(-5.0), 0.0);
        assert_eq!(concentration_strength(1e9), 1.0);
        assert_relative_eq!(concentration_strength(CONCENTRATION_REFERENCE), 1.0);
    }
}
