//! Burn windows.
//!
//! A burn is scheduled for a half-open window `[from, to)`. Candidate
//! retrieval from the vector store filters by window overlap, and the
//! proximity rule compares window start times.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A range of time (half-open interval: [from, to)).
///
/// # Examples
///
/// ```
/// use smokecheck::TimeRange;
/// use chrono::{Duration, Utc};
///
/// let start = Utc::now();
/// let window = TimeRange::new(start, start + Duration::hours(4)).unwrap();
/// let next = TimeRange::starting_for(start + Duration::hours(4), Duration::hours(1)).unwrap();
/// assert!(!window.overlaps(&next));
/// assert!(window.overlaps(&TimeRange::forever()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the range (inclusive).
    pub from: DateTime<Utc>,

    /// End of the range (exclusive). None means open-ended.
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Creates a time range from two timestamps.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidTimeRange` if `from >= to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, ValidationError> {
        if from >= to {
            return Err(ValidationError::InvalidTimeRange { from, to });
        }
        Ok(Self { from, to: Some(to) })
    }

    /// Creates a window of the given length starting at `from`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidTimeRange` if `duration` is not positive.
    pub fn starting_for(from: DateTime<Utc>, duration: Duration) -> Result<Self, ValidationError> {
        Self::new(from, from + duration)
    }

    /// Creates an open-ended time range starting at the given time.
    #[must_use]
    pub const fn starting_at(from: DateTime<Utc>) -> Self {
        Self { from, to: None }
    }

    /// Creates a time range covering all of time.
    #[must_use]
    pub fn forever() -> Self {
        Self {
            from: DateTime::<Utc>::MIN_UTC,
            to: None,
        }
    }

    /// True if the two half-open ranges share any instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let self_end = self.to.unwrap_or(DateTime::<Utc>::MAX_UTC);
        let other_end = other.to.unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.from < other_end && other.from < self_end
    }

    /// Absolute gap between the start times of two windows.
    #[must_use]
    pub fn start_gap(&self, other: &Self) -> Duration {
        (self.from - other.from).abs()
    }

    /// Returns this window widened by `slack` on both sides.
    ///
    /// Used to build the candidate search window around a proposed burn.
    #[must_use]
    pub fn widened(&self, slack: Duration) -> Self {
        Self {
            from: self.from.checked_sub_signed(slack).unwrap_or(DateTime::<Utc>::MIN_UTC),
            to: self
                .to
                .map(|to| to.checked_add_signed(slack).unwrap_or(DateTime::<Utc>::MAX_UTC)),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to {
            Some(to) => write!(f, "[{} → {})", self.from, to),
            None => write!(f, "[{} → ∞)", self.from),
        }
    }
}
