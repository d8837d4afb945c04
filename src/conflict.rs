//! Conflict records between scheduled burns.
//!
//! A conflict is derived, never ground truth: it is recomputed from the
//! current vectors every time a burn is assessed and is not persisted by this
//! crate.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::burn::BurnRequest;
use crate::error::{SmokeError, SmokeResult};
use crate::geo::GeoPoint;
use crate::storage::{RecordId, VectorMetadata};
use crate::time::TimeRange;

/// Distance below which a conflict is HIGH severity.
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.10;
/// Distance below which a conflict is MEDIUM severity.
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 0.20;
/// Distance at or beyond which a candidate is not a conflict at all.
pub const DEFAULT_MAX_DISTANCE: f64 = 0.30;
/// Largest start gap a [`ProximityPolicy`] accepts: one week.
pub const MAX_START_GAP_MINUTES: i64 = 7 * 24 * 60;

/// Conflict severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Loosely similar smoke.
    Low,
    /// Similar smoke.
    Medium,
    /// Near-identical smoke.
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Cosine-distance cutoffs for severity classification.
///
/// These are policy values, not physics; override them per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictThresholds {
    /// Distances below this are HIGH.
    pub high: f64,
    /// Distances below this (and not HIGH) are MEDIUM.
    pub medium: f64,
}

impl Default for ConflictThresholds {
    fn default() -> Self {
        Self {
            high: DEFAULT_HIGH_THRESHOLD,
            medium: DEFAULT_MEDIUM_THRESHOLD,
        }
    }
}

impl ConflictThresholds {
    /// Checks that `0 <= high <= medium <= 1`.
    ///
    /// # Errors
    ///
    /// Returns `SmokeError::Config` when the cutoffs are out of order.
    pub fn validate(&self) -> SmokeResult<()> {
        if (0.0..=self.medium).contains(&self.high) && self.medium <= 1.0 {
            Ok(())
        } else {
            Err(SmokeError::config(format!(
                "severity thresholds must satisfy 0 <= high ({}) <= medium ({}) <= 1",
                self.high, self.medium
            )))
        }
    }

    /// Classifies a cosine distance.
    #[must_use]
    pub fn classify(&self, distance: f64) -> Severity {
        if distance < self.high {
            Severity::High
        } else if distance < self.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// A detected similarity conflict between a query and one stored candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Record being assessed.
    pub query_id: RecordId,
    /// Stored record it conflicts with.
    pub candidate_id: RecordId,
    /// Cosine distance in [0, 1]; lower is more similar.
    pub cosine_distance: f64,
    /// Severity from the configured thresholds.
    pub severity: Severity,
    /// `(1 - distance) * 100`, rounded to one decimal, for display.
    pub overlap_percentage: f64,
    /// Metadata the store returned with the candidate.
    pub metadata: VectorMetadata,
}

impl ConflictRecord {
    /// Builds a record, classifying severity and computing overlap.
    #[must_use]
    pub fn new(
        query_id: RecordId,
        candidate_id: RecordId,
        cosine_distance: f64,
        thresholds: &ConflictThresholds,
        metadata: VectorMetadata,
    ) -> Self {
        Self {
            query_id,
            candidate_id,
            cosine_distance,
            severity: thresholds.classify(cosine_distance),
            overlap_percentage: overlap_percentage(cosine_distance),
            metadata,
        }
    }
}

/// `(1 - distance) * 100` rounded to one decimal place.
#[must_use]
pub fn overlap_percentage(distance: f64) -> f64 {
    ((1.0 - distance) * 1000.0).round() / 10.0
}

/// Time-and-distance rule for burns that conflict regardless of smoke
/// similarity: starts close together and fields close together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityPolicy {
    /// Maximum gap between window starts, in minutes.
    pub max_start_gap_minutes: i64,
    /// Maximum distance between fields, in km.
    pub max_distance_km: f64,
}

impl Default for ProximityPolicy {
    fn default() -> Self {
        Self {
            max_start_gap_minutes: 120,
            max_distance_km: 10.0,
        }
    }
}

impl ProximityPolicy {
    /// True when both burns have locations, start within the allowed gap,
    /// and lie within the allowed distance. Strict inequalities on both.
    #[must_use]
    pub fn conflicts(&self, a: &BurnRequest, b: &BurnRequest) -> bool {
        self.close(&a.window, a.location, &b.window, b.location)
    }

    /// Same rule against a stored record's metadata. A record without a
    /// window or location never conflicts.
    #[must_use]
    pub fn conflicts_with_record(&self, burn: &BurnRequest, metadata: &VectorMetadata) -> bool {
        metadata.window.as_ref().is_some_and(|window| {
            self.close(&burn.window, burn.location, window, metadata.location)
        })
    }

    /// Largest allowed gap between window starts.
    #[must_use]
    pub fn max_start_gap(&self) -> Duration {
        Duration::try_minutes(self.max_start_gap_minutes).unwrap_or(Duration::MAX)
    }

    /// Stored windows that can satisfy the start-gap rule against `window`
    /// all overlap the returned range.
    #[must_use]
    pub fn candidate_window(&self, window: &TimeRange) -> TimeRange {
        TimeRange {
            from: window.from,
            to: Some(window.from),
        }
        .widened(self.max_start_gap())
    }

    fn close(
        &self,
        window_a: &TimeRange,
        location_a: Option<GeoPoint>,
        window_b: &TimeRange,
        location_b: Option<GeoPoint>,
    ) -> bool {
        let (Some(pa), Some(pb)) = (location_a, location_b) else {
            return false;
        };
        window_a.start_gap(window_b) < self.max_start_gap()
            && pa.distance_km(&pb) < self.max_distance_km
    }

    /// Checks that the gap is in `1..=MAX_START_GAP_MINUTES` and the
    /// distance is positive and finite.
    ///
    /// # Errors
    ///
    /// Returns `SmokeError::Config` naming the offending limit.
    pub fn validate(&self) -> SmokeResult<()> {
        if !(1..=MAX_START_GAP_MINUTES).contains(&self.max_start_gap_minutes) {
            return Err(SmokeError::config(format!(
                "proximity.max_start_gap_minutes must be in [1, {MAX_START_GAP_MINUTES}], got {}",
                self.max_start_gap_minutes
            )));
        }
        if !(self.max_distance_km > 0.0 && self.max_distance_km.is_finite()) {
            return Err(SmokeError::config(format!(
                "proximity.max_distance_km must be positive, got {}",
                self.max_distance_km
            )));
        }
        Ok(())
    }
}

/// Shorthand for [`ProximityPolicy::conflicts`].
#[must_use]
pub fn proximity_conflict(a: &BurnRequest, b: &BurnRequest, policy: &ProximityPolicy) -> bool {
    policy.conflicts(a, b)
}
