//! Fixed-dimension embedding vectors.
//!
//! Weather observations, burn requests, smoke plumes and scheduling decisions
//! are each summarised as a unit-length `f32` vector so the external vector
//! store can find near-duplicate situations by cosine distance.
//!
//! Vectors are built into a scratch buffer, normalised once, and frozen into
//! an [`EmbeddingVector`]; there is no API to mutate one afterwards.

mod generator;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SmokeError, SmokeResult};

pub use generator::{EmbeddingGenerator, DEFAULT_EMBEDDING_SEED};

/// Dimension of weather vectors.
pub const WEATHER_DIM: usize = 128;
/// Dimension of smoke vectors.
pub const SMOKE_DIM: usize = 64;
/// Dimension of burn vectors.
pub const BURN_DIM: usize = 32;
/// Dimension of decision vectors.
pub const DECISION_DIM: usize = 32;

/// What an embedding summarises. Each kind has a fixed dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingKind {
    /// Weather snapshot, 128-d.
    Weather,
    /// Smoke footprint of a burn, 64-d.
    Smoke,
    /// Burn request, 32-d.
    Burn,
    /// Scheduling decision, 32-d.
    Decision,
}

impl EmbeddingKind {
    /// Every kind.
    pub const ALL: [Self; 4] = [Self::Weather, Self::Smoke, Self::Burn, Self::Decision];

    /// Declared dimension for this kind.
    #[must_use]
    pub const fn dim(&self) -> usize {
        match self {
            Self::Weather => WEATHER_DIM,
            Self::Smoke => SMOKE_DIM,
            Self::Burn => BURN_DIM,
            Self::Decision => DECISION_DIM,
        }
    }

    /// Snake-case name, as serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Smoke => "smoke",
            Self::Burn => "burn",
            Self::Decision => "decision",
        }
    }
}

impl fmt::Display for EmbeddingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable embedding of a known kind and dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    kind: EmbeddingKind,
    values: Box<[f32]>,
}

impl EmbeddingVector {
    /// L2-normalises `raw` and freezes it as a vector of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `SmokeError::DimensionMismatch` if `raw.len()` differs from
    /// `kind.dim()`.
    pub fn normalized(kind: EmbeddingKind, raw: &[f64]) -> SmokeResult<Self> {
        check_dim(kind, raw.len())?;
        #[allow(clippy::cast_possible_truncation)]
        let values = l2_normalize(raw).into_iter().map(|x| x as f32).collect();
        Ok(Self { kind, values })
    }

    /// Wraps values received from a store without renormalising them.
    ///
    /// # Errors
    ///
    /// Returns `SmokeError::DimensionMismatch` if `values.len()` differs from
    /// `kind.dim()`.
    pub fn from_stored(kind: EmbeddingKind, values: Vec<f32>) -> SmokeResult<Self> {
        check_dim(kind, values.len())?;
        Ok(Self {
            kind,
            values: values.into_boxed_slice(),
        })
    }

    /// What the vector summarises.
    #[must_use]
    pub const fn kind(&self) -> EmbeddingKind {
        self.kind
    }

    /// Raw components.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of components.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Euclidean norm, accumulated in f64.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.values
            .iter()
            .map(|&x| f64::from(x) * f64::from(x))
            .sum::<f64>()
            .sqrt()
    }

    /// True if every component is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&x| x == 0.0)
    }
}

impl AsRef<[f32]> for EmbeddingVector {
    fn as_ref(&self) -> &[f32] {
        &self.values
    }
}

fn check_dim(kind: EmbeddingKind, actual: usize) -> SmokeResult<()> {
    if actual == kind.dim() {
        Ok(())
    } else {
        Err(SmokeError::DimensionMismatch {
            expected: kind.dim(),
            actual,
        })
    }
}

/// Divides every component by the Euclidean norm.
///
/// A zero vector (or one whose norm is not finite) is returned unchanged.
#[must_use]
pub fn l2_normalize(raw: &[f64]) -> Vec<f64> {
    let norm = raw.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        let inv = norm.recip();
        raw.iter().map(|x| x * inv).collect()
    } else {
        raw.to_vec()
    }
}
