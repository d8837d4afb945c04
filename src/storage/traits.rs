//! The vector store contract.
//!
//! Persistence and indexing belong to the surrounding system. This crate only
//! requires a backend that can upsert vectors with metadata and return
//! candidates filtered by time window and a rough spatial bound:
//! - In-memory brute force for tests and small deployments
//! - A proper ANN index for production

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::burn::BurnId;
use crate::decision::DecisionId;
use crate::embedding::{EmbeddingKind, EmbeddingVector};
use crate::geo::{GeoPoint, SpatialHint};
use crate::time::TimeRange;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Record not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A vector of the wrong length was offered for a kind.
    #[error("Vector for {kind} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        kind: EmbeddingKind,
        expected: usize,
        actual: usize,
    },

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Identity of the entity a stored vector describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum RecordId {
    /// A burn's vectors.
    Burn(BurnId),
    /// A decision's vector.
    Decision(DecisionId),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Burn(id) => write!(f, "burn:{id}"),
            Self::Decision(id) => write!(f, "decision:{id}"),
        }
    }
}

impl From<BurnId> for RecordId {
    fn from(id: BurnId) -> Self {
        Self::Burn(id)
    }
}

impl From<DecisionId> for RecordId {
    fn from(id: DecisionId) -> Self {
        Self::Decision(id)
    }
}

/// Filterable attributes stored alongside a vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    /// Burn window, used by time-window queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeRange>,

    /// Field location, used by spatial queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,

    /// Arbitrary attributes for display.
    #[serde(default)]
    pub attributes: serde_json::Value,
}

impl VectorMetadata {
    /// Whether this record passes the given filters.
    ///
    /// Records without a window match any window; records without a location
    /// match any spatial hint.
    #[must_use]
    pub fn matches(&self, window: &TimeRange, spatial: Option<&SpatialHint>) -> bool {
        let in_window = self.window.as_ref().map_or(true, |w| w.overlaps(window));
        let in_area = match (spatial, self.location.as_ref()) {
            (Some(hint), Some(location)) => hint.admits(location),
            _ => true,
        };
        in_window && in_area
    }
}

/// A stored vector returned by a candidate query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Record the vector belongs to.
    pub id: RecordId,
    /// Stored vector.
    pub vector: EmbeddingVector,
    /// Metadata stored alongside.
    pub metadata: VectorMetadata,
}

/// Storage trait for embedding vectors.
///
/// Implementations must be safe for concurrent use. Vectors are keyed by
/// `(id, kind)`: one burn owns a weather, smoke and burn vector.
pub trait VectorStore: Send + Sync {
    /// Inserts or replaces the vector of `vector.kind()` for `id`.
    ///
    /// # Errors
    /// - `DimensionMismatch`: if the vector length differs from its kind's dimension
    fn upsert(
        &self,
        id: RecordId,
        vector: EmbeddingVector,
        metadata: VectorMetadata,
    ) -> Result<(), StorageError>;

    /// Fetches one stored vector.
    fn get(&self, id: RecordId, kind: EmbeddingKind) -> Result<Option<Candidate>, StorageError>;

    /// Removes every vector stored for `id`. Returns how many were removed.
    fn remove(&self, id: RecordId) -> Result<usize, StorageError>;

    /// Returns vectors of `kind` whose window overlaps `window` and whose
    /// location falls within `spatial` (when given).
    ///
    /// Backends may over-return; the caller ranks and filters by distance.
    fn query_candidates(
        &self,
        kind: EmbeddingKind,
        window: &TimeRange,
        spatial: Option<&SpatialHint>,
    ) -> Result<Vec<Candidate>, StorageError>;
}
