//! Priority and weather-suitability scores.
//!
//! Both scores are additive heuristics on a 1..=10 scale. They are
//! deterministic apart from an injected [`Jitter`] source, which callers use
//! to break ties between otherwise identical requests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::burn::BurnRequest;
use crate::weather::{AtmosphericStability, WeatherObservation};

/// Lowest score either function returns.
pub const MIN_SCORE: f64 = 1.0;
/// Highest score either function returns.
pub const MAX_SCORE: f64 = 10.0;
/// Largest absolute jitter a [`SeededJitter`] will produce.
pub const MAX_JITTER: f64 = 0.5;

const BASE_SCORE: f64 = 5.0;

/// Source of small score perturbations.
pub trait Jitter {
    /// Next perturbation, expected within `[-MAX_JITTER, MAX_JITTER]`.
    fn sample(&mut self) -> f64;
}

/// Disables jitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn sample(&mut self) -> f64 {
        0.0
    }
}

/// Uniform jitter from a seeded `StdRng`.
#[derive(Debug, Clone)]
pub struct SeededJitter {
    rng: StdRng,
    amplitude: f64,
}

impl SeededJitter {
    /// Full-amplitude (±0.5) jitter.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_amplitude(seed, MAX_JITTER)
    }

    /// Jitter in `±amplitude`; the amplitude is clamped into `[0, 0.5]`.
    #[must_use]
    pub fn with_amplitude(seed: u64, amplitude: f64) -> Self {
        let amplitude = if amplitude.is_finite() {
            amplitude.clamp(0.0, MAX_JITTER)
        } else {
            0.0
        };
        Self {
            rng: StdRng::seed_from_u64(seed),
            amplitude,
        }
    }

    /// Half-width of the jitter interval.
    #[must_use]
    pub const fn amplitude(&self) -> f64 {
        self.amplitude
    }
}

impl Jitter for SeededJitter {
    fn sample(&mut self) -> f64 {
        if self.amplitude == 0.0 {
            return 0.0;
        }
        self.rng.random_range(-self.amplitude..=self.amplitude)
    }
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Scheduling priority of a burn request.
///
/// Larger fields and fuels that are hard to dispose of otherwise rank higher;
/// calm, very windy or very dry conditions rank lower.
pub fn priority_score(
    burn: &BurnRequest,
    weather: &WeatherObservation,
    jitter: &mut dyn Jitter,
) -> f64 {
    let mut score = BASE_SCORE + (burn.acreage / 100.0).min(2.0);

    if weather.wind_speed < 5.0 {
        score -= 1.0;
    }
    if weather.wind_speed > 15.0 {
        score -= 1.5;
    }
    if weather.humidity < 30.0 {
        score -= 1.0;
    }
    if weather.humidity > 70.0 {
        score += 0.5;
    }

    score += burn.fuel_type.priority_bonus();
    score += jitter.sample();
    clamp_score(score)
}

/// Additive stability term of the suitability score.
#[must_use]
pub const fn stability_bonus(stability: AtmosphericStability) -> f64 {
    match stability {
        AtmosphericStability::VeryUnstable => 2.0,
        AtmosphericStability::Unstable => 1.0,
        AtmosphericStability::Neutral => 0.0,
        AtmosphericStability::Stable => -1.0,
        AtmosphericStability::VeryStable => -1.5,
    }
}

/// How suitable the weather is for burning at all.
///
/// Rewards moderate wind, moderate humidity, mild temperature (Celsius) and
/// unstable air that mixes smoke upward.
pub fn weather_suitability_score(weather: &WeatherObservation, jitter: &mut dyn Jitter) -> f64 {
    let mut score = BASE_SCORE;

    let wind = weather.wind_speed;
    if (5.0..=12.0).contains(&wind) {
        score += 2.0;
    } else if !(3.0..=20.0).contains(&wind) {
        score -= 2.0;
    }

    let humidity = weather.humidity;
    if (40.0..=70.0).contains(&humidity) {
        score += 1.5;
    } else if !(25.0..=85.0).contains(&humidity) {
        score -= 1.5;
    }

    score += stability_bonus(weather.atmospheric_stability);

    if (15.0..=30.0).contains(&weather.temperature) {
        score += 1.0;
    }

    score += jitter.sample();
    clamp_score(score)
}
