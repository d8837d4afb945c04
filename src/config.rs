//! Engine configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides.

use serde::{Deserialize, Serialize};

use crate::conflict::{ConflictThresholds, ProximityPolicy, DEFAULT_MAX_DISTANCE};
use crate::embedding::DEFAULT_EMBEDDING_SEED;
use crate::error::{SmokeError, SmokeResult};
use crate::plume::PlumeConfig;
use crate::scoring::MAX_JITTER;

/// Largest accepted `search_slack_hours`: thirty days.
pub const MAX_SEARCH_SLACK_HOURS: i64 = 30 * 24;

/// Configuration for [`crate::SmokeEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Plume model constants.
    pub plume: PlumeConfig,
    /// Severity cutoffs.
    pub thresholds: ConflictThresholds,
    /// Candidates at or beyond this cosine distance are not conflicts.
    pub max_distance: f64,
    /// Keep only the nearest `top_k` conflicts.
    pub top_k: Option<usize>,
    /// Seed for the embedding tails.
    pub embedding_seed: u64,
    /// Radius of the spatial pre-filter around a located burn (km).
    pub search_radius_km: f64,
    /// Slack added on both sides of a burn window when querying candidates.
    pub search_slack_hours: i64,
    /// Time-and-distance conflict rule.
    pub proximity: ProximityPolicy,
    /// Amplitude of score jitter; 0 makes scores fully deterministic.
    pub score_jitter: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            plume: PlumeConfig::default(),
            thresholds: ConflictThresholds::default(),
            max_distance: DEFAULT_MAX_DISTANCE,
            top_k: None,
            embedding_seed: DEFAULT_EMBEDDING_SEED,
            search_radius_km: 50.0,
            search_slack_hours: 0,
            proximity: ProximityPolicy::default(),
            score_jitter: 0.0,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `SmokeError::Config` on malformed JSON or invalid values.
    pub fn from_json_str(json: &str) -> SmokeResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SmokeError::config(format!("invalid engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the model or search meaningless.
    ///
    /// # Errors
    ///
    /// Returns `SmokeError::Config` naming the first offending field.
    pub fn validate(&self) -> SmokeResult<()> {
        self.thresholds.validate()?;
        self.proximity.validate()?;

        if !(self.max_distance > 0.0 && self.max_distance <= 1.0) {
            return Err(SmokeError::config(format!(
                "max_distance must be in (0, 1], got {}",
                self.max_distance
            )));
        }
        if self.top_k == Some(0) {
            return Err(SmokeError::config("top_k must be at least 1 when set"));
        }
        if !(self.search_radius_km > 0.0 && self.search_radius_km.is_finite()) {
            return Err(SmokeError::config(format!(
                "search_radius_km must be positive, got {}",
                self.search_radius_km
            )));
        }
        if !(0..=MAX_SEARCH_SLACK_HOURS).contains(&self.search_slack_hours) {
            return Err(SmokeError::config(format!(
                "search_slack_hours must be in [0, {MAX_SEARCH_SLACK_HOURS}], got {}",
                self.search_slack_hours
            )));
        }
        if !(0.0..=MAX_JITTER).contains(&self.score_jitter) {
            return Err(SmokeError::config(format!(
                "score_jitter must be in [0, {MAX_JITTER}], got {}",
                self.score_jitter
            )));
        }

        let plume = &self.plume;
        let positive = [
            ("plume.base_height_m", plume.base_height_m),
            ("plume.burn_duration_hours", plume.burn_duration_hours),
            ("plume.min_wind_speed", plume.min_wind_speed),
            ("plume.dispersion_threshold", plume.dispersion_threshold),
        ];
        for (field, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(SmokeError::config(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }

        Ok(())
    }
}
