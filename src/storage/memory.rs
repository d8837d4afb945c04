//! In-memory storage backend.
//!
//! Thread-safe brute-force implementation of [`VectorStore`]. It is intended
//! for embedded usage, tests, and as a reference implementation of the
//! filtering contract.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::embedding::{EmbeddingKind, EmbeddingVector};
use crate::geo::SpatialHint;
use crate::storage::traits::{Candidate, RecordId, StorageError, VectorMetadata, VectorStore};
use crate::time::TimeRange;

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Clone)]
struct StoredVector {
    vector: EmbeddingVector,
    metadata: VectorMetadata,
}

/// Thread-safe in-memory vector store.
///
/// Entries are kept in a `BTreeMap`, so query results come back in a stable
/// `(id, kind)` order.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    state: RwLock<BTreeMap<(RecordId, EmbeddingKind), StoredVector>>,
}

impl InMemoryVectorStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored vectors across all kinds.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("vector.len"))?;
        Ok(state.len())
    }

    /// Whether the store holds no vectors.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl VectorStore for InMemoryVectorStore {
    fn upsert(
        &self,
        id: RecordId,
        vector: EmbeddingVector,
        metadata: VectorMetadata,
    ) -> Result<(), StorageError> {
        let kind = vector.kind();
        if vector.dim() != kind.dim() {
            return Err(StorageError::DimensionMismatch {
                kind,
                expected: kind.dim(),
                actual: vector.dim(),
            });
        }

        let mut state = self.state.write().map_err(|_| lock_err("vector.upsert"))?;
        let replaced = state
            .insert((id, kind), StoredVector { vector, metadata })
            .is_some();
        tracing::debug!(%id, %kind, replaced, "upserted vector");
        Ok(())
    }

    fn get(&self, id: RecordId, kind: EmbeddingKind) -> Result<Option<Candidate>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("vector.get"))?;
        Ok(state.get(&(id, kind)).map(|stored| Candidate {
            id,
            vector: stored.vector.clone(),
            metadata: stored.metadata.clone(),
        }))
    }

    fn remove(&self, id: RecordId) -> Result<usize, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("vector.remove"))?;
        let before = state.len();
        state.retain(|(stored_id, _), _| *stored_id != id);
        let removed = before - state.len();
        tracing::debug!(%id, removed, "removed vectors");
        Ok(removed)
    }

    fn query_candidates(
        &self,
        kind: EmbeddingKind,
        window: &TimeRange,
        spatial: Option<&SpatialHint>,
    ) -> Result<Vec<Candidate>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_err("vector.query_candidates"))?;

        Ok(state
            .iter()
            .filter(|((_, k), stored)| *k == kind && stored.metadata.matches(window, spatial))
            .map(|((id, _), stored)| Candidate {
                id: *id,
                vector: stored.vector.clone(),
                metadata: stored.metadata.clone(),
            })
            .collect())
    }
}
