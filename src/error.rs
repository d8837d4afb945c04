//! Error types for smokecheck.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! specific failure conditions. Unknown categorical inputs (fuel type,
//! stability class, intensity) are *not* errors; they resolve to documented
//! defaults.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::storage::StorageError;

/// Validation errors raised before any computation runs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Acreage was zero or negative.
    #[error("Acreage must be positive, got {value}")]
    NonPositiveAcreage {
        value: f64,
    },

    /// Wind speed was negative.
    #[error("Wind speed cannot be negative, got {value}")]
    NegativeWindSpeed {
        value: f64,
    },

    /// Humidity was outside [0, 100].
    #[error("Humidity {value} is out of range [0, 100]")]
    HumidityOutOfRange {
        value: f64,
    },

    /// A builder was missing a required field.
    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    /// A window ended at or before its start.
    #[error("Invalid time range: from ({from}) must be before to ({to})")]
    InvalidTimeRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    /// Latitude or longitude out of range.
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate {
        latitude: f64,
        longitude: f64,
    },

    /// A numeric field was outside its domain.
    #[error("Field '{field}' value {value} is out of range [{min}, {max}]")]
    ValueOutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ValidationError {
    /// Creates a missing-field error.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

/// Top-level error type for smokecheck.
#[derive(Debug, Error)]
pub enum SmokeError {
    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Two embedding vectors of different lengths were compared.
    ///
    /// This is a programming or configuration error and is never recovered
    /// locally.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
    },

    /// Vector store failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid configuration.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },
}

impl SmokeError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a dimension mismatch.
    #[must_use]
    pub const fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }

    /// Returns true if retrying the same call could succeed.
    ///
    /// Core computations are deterministic, so only backend failures of the
    /// external store qualify.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(e) => matches!(e, StorageError::BackendError(_)),
            Self::Validation(_) | Self::DimensionMismatch { .. } | Self::Config { .. } => false,
        }
    }
}

/// Result type alias for smokecheck operations.
pub type SmokeResult<T> = Result<T, SmokeError>;
