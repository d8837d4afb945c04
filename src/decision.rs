//! Scheduling decisions.
//!
//! The scheduler that makes these decisions lives outside this crate. Each
//! decision is embedded so reviewers can search for past decisions made under
//! similar reasoning.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::burn::BurnId;
use crate::error::ValidationError;

/// Unique identifier for a scheduling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(Uuid);

impl DecisionId {
    /// Creates a new random decision id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a scheduling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// Burn may proceed.
    Approved,
    /// Waiting on a reviewer.
    PendingReview,
    /// Postponed to a later window.
    Deferred,
    /// Burn may not proceed.
    Rejected,
}

impl DecisionOutcome {
    /// All outcomes, most permissive first.
    pub const ALL: [Self; 4] = [
        Self::Approved,
        Self::PendingReview,
        Self::Deferred,
        Self::Rejected,
    ];

    /// Severity ordinal in [0, 1]; more restrictive outcomes map higher.
    #[must_use]
    pub const fn ordinal(&self) -> f64 {
        match self {
            Self::Approved => 0.2,
            Self::PendingReview => 0.5,
            Self::Deferred => 0.7,
            Self::Rejected => 0.9,
        }
    }
}

/// A scheduler's decision about one burn, with the factors behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingDecision {
    /// Decision identity.
    pub id: DecisionId,
    /// Burn the decision is about, if tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burn_id: Option<BurnId>,
    /// What was decided.
    pub outcome: DecisionOutcome,
    /// Scheduler confidence in [0, 1].
    pub confidence: f64,
    /// Assessed risk in [0, 1].
    pub risk_level: f64,
    /// Needs sign-off before the burn.
    pub requires_approval: bool,
    /// Conflicts were found at decision time.
    pub has_conflicts: bool,
    /// Weather was within limits.
    pub weather_window_ok: bool,
    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
}

impl SchedulingDecision {
    /// Creates a decision with all flags cleared.
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` if confidence or risk is outside [0, 1].
    pub fn new(
        outcome: DecisionOutcome,
        confidence: f64,
        risk_level: f64,
        decided_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        unit_interval("confidence", confidence)?;
        unit_interval("risk_level", risk_level)?;
        Ok(Self {
            id: DecisionId::new(),
            burn_id: None,
            outcome,
            confidence,
            risk_level,
            requires_approval: false,
            has_conflicts: false,
            weather_window_ok: false,
            decided_at,
        })
    }

    /// Links the decision to a burn.
    #[must_use]
    pub fn for_burn(mut self, burn_id: BurnId) -> Self {
        self.burn_id = Some(burn_id);
        self
    }

    /// Sets the approval flag.
    #[must_use]
    pub fn requires_approval(mut self, flag: bool) -> Self {
        self.requires_approval = flag;
        self
    }

    /// Sets the conflict flag.
    #[must_use]
    pub fn has_conflicts(mut self, flag: bool) -> Self {
        self.has_conflicts = flag;
        self
    }

    /// Sets the weather-window flag.
    #[must_use]
    pub fn weather_window_ok(mut self, flag: bool) -> Self {
        self.weather_window_ok = flag;
        self
    }
}

fn unit_interval(field: &str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::ValueOutOfRange {
            field: field.to_string(),
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}
