//! Weather observations.
//!
//! A `WeatherObservation` is an immutable snapshot produced by an external
//! weather feed. The builder enforces the required fields and rejects values
//! that would make the plume model meaningless.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Atmospheric stability class, ordered from most to least vertical mixing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AtmosphericStability {
    /// Pasquill A.
    VeryUnstable,
    /// Pasquill B.
    Unstable,
    /// Pasquill C/D.
    #[default]
    Neutral,
    /// Pasquill E.
    Stable,
    /// Pasquill F.
    VeryStable,
}

impl AtmosphericStability {
    /// All classes in order.
    pub const ALL: [Self; 5] = [
        Self::VeryUnstable,
        Self::Unstable,
        Self::Neutral,
        Self::Stable,
        Self::VeryStable,
    ];

    /// Parses a class name, falling back to `Neutral` for anything unknown.
    ///
    /// Accepts the snake_case names and Pasquill letters A–F (C and D both
    /// map to neutral).
    #[must_use]
    pub fn parse_or_neutral(s: &str) -> Self {
        s.parse().unwrap_or_else(|()| {
            tracing::debug!(class = s, "unknown stability class, using neutral");
            Self::Neutral
        })
    }

    /// Canonical snake_case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VeryUnstable => "very_unstable",
            Self::Unstable => "unstable",
            Self::Neutral => "neutral",
            Self::Stable => "stable",
            Self::VeryStable => "very_stable",
        }
    }
}

impl FromStr for AtmosphericStability {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "very_unstable" | "a" => Ok(Self::VeryUnstable),
            "unstable" | "b" => Ok(Self::Unstable),
            "neutral" | "c" | "d" => Ok(Self::Neutral),
            "stable" | "e" => Ok(Self::Stable),
            "very_stable" | "f" => Ok(Self::VeryStable),
            _ => Err(()),
        }
    }
}

impl fmt::Display for AtmosphericStability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time weather snapshot at a burn site.
///
/// Temperature is in degrees Celsius. Wind speed is in m/s; the plume model
/// and the scoring thresholds share that unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Air temperature, degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent [0, 100].
    pub humidity: f64,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Direction the wind blows from, degrees [0, 360).
    pub wind_direction: f64,
    /// Station pressure in hPa.
    pub pressure: f64,
    /// Visibility in km.
    pub visibility: f64,
    /// Stability class.
    pub atmospheric_stability: AtmosphericStability,
    /// Observation time, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

/// Standard sea-level pressure used when the feed omits pressure.
pub const STANDARD_PRESSURE_HPA: f64 = 1013.25;

/// Visibility used when the feed omits it.
pub const DEFAULT_VISIBILITY_KM: f64 = 10.0;

impl WeatherObservation {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> WeatherObservationBuilder {
        WeatherObservationBuilder::default()
    }
}

/// Builder for `WeatherObservation`.
#[derive(Debug, Default, Clone)]
pub struct WeatherObservationBuilder {
    temperature: Option<f64>,
    humidity: Option<f64>,
    wind_speed: Option<f64>,
    wind_direction: Option<f64>,
    pressure: Option<f64>,
    visibility: Option<f64>,
    atmospheric_stability: Option<AtmosphericStability>,
    observed_at: Option<DateTime<Utc>>,
}

impl WeatherObservationBuilder {
    /// Sets the temperature in degrees Celsius.
    #[must_use]
    pub fn temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    /// Sets relative humidity in percent.
    #[must_use]
    pub fn humidity(mut self, percent: f64) -> Self {
        self.humidity = Some(percent);
        self
    }

    /// Sets wind speed in m/s.
    #[must_use]
    pub fn wind_speed(mut self, speed: f64) -> Self {
        self.wind_speed = Some(speed);
        self
    }

    /// Sets the direction the wind blows from.
    #[must_use]
    pub fn wind_direction(mut self, degrees: f64) -> Self {
        self.wind_direction = Some(degrees);
        self
    }

    /// Sets station pressure in hPa.
    #[must_use]
    pub fn pressure(mut self, hpa: f64) -> Self {
        self.pressure = Some(hpa);
        self
    }

    /// Sets visibility in km.
    #[must_use]
    pub fn visibility(mut self, km: f64) -> Self {
        self.visibility = Some(km);
        self
    }

    /// Sets the stability class.
    #[must_use]
    pub fn atmospheric_stability(mut self, stability: AtmosphericStability) -> Self {
        self.atmospheric_stability = Some(stability);
        self
    }

    /// Sets the stability class from a free-form name (unknown → neutral).
    #[must_use]
    pub fn stability_name(self, name: &str) -> Self {
        self.atmospheric_stability(AtmosphericStability::parse_or_neutral(name))
    }

    /// Sets the observation time.
    #[must_use]
    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = Some(at);
        self
    }

    /// Builds the observation.
    ///
    /// # Errors
    ///
    /// - `MissingField` if temperature, humidity, wind speed or stability is unset
    /// - `NegativeWindSpeed` if wind speed is below zero
    /// - `HumidityOutOfRange` if humidity is outside [0, 100]
    /// - `ValueOutOfRange` for non-finite numeric inputs
    pub fn build(self) -> Result<WeatherObservation, ValidationError> {
        let temperature = required("temperature", self.temperature)?;
        let humidity = required("humidity", self.humidity)?;
        let wind_speed = required("wind_speed", self.wind_speed)?;
        let atmospheric_stability = self
            .atmospheric_stability
            .ok_or_else(|| ValidationError::missing("atmospheric_stability"))?;

        if wind_speed < 0.0 {
            return Err(ValidationError::NegativeWindSpeed { value: wind_speed });
        }
        if !(0.0..=100.0).contains(&humidity) {
            return Err(ValidationError::HumidityOutOfRange { value: humidity });
        }

        let wind_direction =
            finite("wind_direction", self.wind_direction.unwrap_or(0.0))?.rem_euclid(360.0);
        let pressure = finite("pressure", self.pressure.unwrap_or(STANDARD_PRESSURE_HPA))?;
        let visibility = finite("visibility", self.visibility.unwrap_or(DEFAULT_VISIBILITY_KM))?;

        Ok(WeatherObservation {
            temperature,
            humidity,
            wind_speed,
            wind_direction,
            pressure,
            visibility,
            atmospheric_stability,
            observed_at: self.observed_at,
        })
    }
}

fn required(field: &str, value: Option<f64>) -> Result<f64, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::missing(field))?;
    finite(field, value)
}

fn finite(field: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::ValueOutOfRange {
            field: field.to_string(),
            value,
            min: f64::MIN,
            max: f64::MAX,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> WeatherObservationBuilder {
        WeatherObservation::builder()
            .temperature(20.0)
            .humidity(50.0)
            .wind_speed(5.0)
            .atmospheric_stability(AtmosphericStability::Neutral)
    }

    #[test]
    fn test_builder_defaults() {
        let obs = base().build().unwrap();
        assert_eq!(obs.pressure, STANDARD_PRESSURE_HPA);
        assert_eq!(obs.visibility, DEFAULT_VISIBILITY_KM);
        assert_eq!(obs.wind_direction, 0.0);
        assert!(obs.observed_at.is_none());
    }

    #[test]
    fn test_missing_required_fields() {
        let err = WeatherObservation::builder()
            .humidity(50.0)
            .wind_speed(5.0)
            .atmospheric_stability(AtmosphericStability::Neutral)
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::missing("temperature"));

        let err = WeatherObservation::builder()
            .temperature(20.0)
            .humidity(50.0)
            .wind_speed(5.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::missing("atmospheric_stability"));
    }

    #[test]
    fn test_negative_wind_rejected() {
        let err = base().wind_speed(-0.5).build().unwrap_err();
        assert!(matches!(err, ValidationError::NegativeWindSpeed { .. }));
    }

    #[test]
    fn test_zero_wind_accepted() {
        assert!(base().wind_speed(0.0).build().is_ok());
    }

    #[test]
    fn test_humidity_range() {
        assert!(base().humidity(101.0).build().is_err());
        assert!(base().humidity(-1.0).build().is_err());
        assert!(base().humidity(100.0).build().is_ok());
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = base().temperature(f64::NAN).build().unwrap_err();
        assert!(matches!(err, ValidationError::ValueOutOfRange { .. }));
    }

    #[test]
    fn test_wind_direction_wraps() {
        let obs = base().wind_direction(370.0).build().unwrap();
        assert!((obs.wind_direction - 10.0).abs() < 1e-9);
        let obs = base().wind_direction(-90.0).build().unwrap();
        assert!((obs.wind_direction - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_stability_parsing() {
        use AtmosphericStability as S;
        let cases = [
            ("very_unstable", S::VeryUnstable),
            ("Very Stable", S::VeryStable),
            ("B", S::Unstable),
            ("D", S::Neutral),
            ("F", S::VeryStable),
            ("hurricane", S::Neutral),
        ];
        for (name, expected) in cases {
            assert_eq!(S::parse_or_neutral(name), expected, "{name}");
        }
    }

    #[test]
    fn test_stability_round_trips_through_name() {
        for class in AtmosphericStability::ALL {
            assert_eq!(class.as_str().parse::<AtmosphericStability>(), Ok(class));
        }
    }

    #[test]
    fn test_stability_ordering() {
        assert!(AtmosphericStability::VeryUnstable < AtmosphericStability::Neutral);
        assert!(AtmosphericStability::Stable < AtmosphericStability::VeryStable);
    }
}
