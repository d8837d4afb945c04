//! Cosine similarity and conflict detection over stored embeddings.
//!
//! Similarity here is clamped into `[0, 1]`: opposed vectors are treated as
//! unrelated rather than "anti-similar", so cosine distance is always in
//! `[0, 1]` as well.

use std::cmp::Ordering;

use crate::conflict::{ConflictRecord, ConflictThresholds};
use crate::embedding::EmbeddingVector;
use crate::error::{SmokeError, SmokeResult};
use crate::storage::{Candidate, RecordId};

/// Cosine similarity of two equal-length vectors, clamped into `[0, 1]`.
///
/// Accumulates in f64. A zero-magnitude operand yields 0. Never NaN.
///
/// # Errors
///
/// Returns `SmokeError::DimensionMismatch` when the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> SmokeResult<f64> {
    if a.len() != b.len() {
        return Err(SmokeError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let xf = f64::from(x);
        let yf = f64::from(y);
        dot += xf * yf;
        norm_a += xf * xf;
        norm_b += yf * yf;
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return Ok(0.0);
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if sim.is_finite() {
        Ok(sim.clamp(0.0, 1.0))
    } else {
        Ok(0.0)
    }
}

/// `1 - cosine_similarity(a, b)`, in `[0, 1]`.
///
/// # Errors
///
/// Returns `SmokeError::DimensionMismatch` when the lengths differ.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> SmokeResult<f64> {
    Ok(1.0 - cosine_similarity(a, b)?)
}

/// Ranks stored candidates against a query vector and reports conflicts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConflictDetector {
    thresholds: ConflictThresholds,
}

impl ConflictDetector {
    /// Creates a detector with the given severity cutoffs.
    #[must_use]
    pub const fn new(thresholds: ConflictThresholds) -> Self {
        Self { thresholds }
    }

    /// Severity cutoffs in use.
    #[must_use]
    pub const fn thresholds(&self) -> &ConflictThresholds {
        &self.thresholds
    }

    /// Returns candidates closer than `max_distance`, nearest first.
    ///
    /// A candidate whose id equals `query_id` is skipped. A candidate of the
    /// wrong dimension is an error rather than a silent skip.
    ///
    /// # Errors
    ///
    /// Returns `SmokeError::DimensionMismatch` if any candidate vector length
    /// differs from the query's.
    pub fn find_conflicts(
        &self,
        query_id: RecordId,
        query: &EmbeddingVector,
        candidates: &[Candidate],
        max_distance: f64,
        top_k: Option<usize>,
    ) -> SmokeResult<Vec<ConflictRecord>> {
        let mut conflicts = Vec::new();

        for candidate in candidates {
            if candidate.id == query_id {
                continue;
            }
            let distance = cosine_distance(query.values(), candidate.vector.values())?;
            if distance >= max_distance {
                continue;
            }
            conflicts.push(ConflictRecord::new(
                query_id,
                candidate.id,
                distance,
                &self.thresholds,
                candidate.metadata.clone(),
            ));
        }

        conflicts.sort_by(|a, b| {
            a.cosine_distance
                .partial_cmp(&b.cosine_distance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        });
        if let Some(k) = top_k {
            conflicts.truncate(k);
        }

        tracing::debug!(
            %query_id,
            kind = %query.kind(),
            scanned = candidates.len(),
            found = conflicts.len(),
            "conflict search complete"
        );
        Ok(conflicts)
    }
}

/// [`ConflictDetector::find_conflicts`] with default severity thresholds.
///
/// Pass [`DEFAULT_MAX_DISTANCE`](crate::conflict::DEFAULT_MAX_DISTANCE) for
/// the usual cutoff.
///
/// # Errors
///
/// Returns `SmokeError::DimensionMismatch` on mismatched candidate vectors.
pub fn find_conflicts(
    query_id: RecordId,
    query: &EmbeddingVector,
    candidates: &[Candidate],
    max_distance: f64,
    top_k: Option<usize>,
) -> SmokeResult<Vec<ConflictRecord>> {
    ConflictDetector::default().find_conflicts(query_id, query, candidates, max_distance, top_k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    use crate::burn::BurnId;
    use crate::conflict::{Severity, DEFAULT_MAX_DISTANCE};
    use crate::embedding::{EmbeddingKind, BURN_DIM, SMOKE_DIM};
    use crate::storage::VectorMetadata;

    /// A unit vector in the plane of axes 0 and 1 at the given cosine distance
    /// from axis 0.
    fn at_distance(distance: f64) -> EmbeddingVector {
        let sim = 1.0 - distance;
        let mut raw = vec![0.0; SMOKE_DIM];
        raw[0] = sim;
        raw[1] = (1.0 - sim * sim).max(0.0).sqrt();
        EmbeddingVector::normalized(EmbeddingKind::Smoke, &raw).unwrap()
    }

    fn candidate(vector: EmbeddingVector) -> Candidate {
        Candidate {
            id: RecordId::Burn(BurnId::new()),
            vector,
            metadata: VectorMetadata::default(),
        }
    }

    #[test]
    fn test_cosine_symmetry_and_self_similarity() {
        let a = [0.3_f32, -0.2, 0.9, 0.1];
        let b = [0.5_f32, 0.4, 0.1, 0.7];
        let ab = cosine_similarity(&a, &b).unwrap();
        let ba = cosine_similarity(&b, &a).unwrap();
        assert_relative_eq!(ab, ba, epsilon = 1e-12);
        assert_relative_eq!(cosine_similarity(&a, &a).unwrap(), 1.0, epsilon = 1e-9);
        assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn test_cosine_clamps_and_handles_zero() {
        let a = [1.0_f32, 0.0];
        let opposite = [-1.0_f32, 0.0];
        assert_eq!(cosine_similarity(&a, &opposite).unwrap(), 0.0);
        assert_eq!(cosine_distance(&a, &opposite).unwrap(), 1.0);

        let zero = [0.0_f32, 0.0];
        assert_eq!(cosine_similarity(&a, &zero).unwrap(), 0.0);
        assert_eq!(cosine_distance(&zero, &zero).unwrap(), 1.0);

        let huge = [f32::MAX, f32::MAX];
        let sim = cosine_similarity(&huge, &huge).unwrap();
        assert!(!sim.is_nan());
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let err = cosine_similarity(&[1.0; 4], &[1.0; 3]).unwrap_err();
        assert!(matches!(
            err,
            SmokeError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_find_conflicts_severity_and_order() {
        let query = at_distance(0.0);
        let candidates = vec![
            candidate(at_distance(0.25)),
            candidate(at_distance(0.05)),
            candidate(at_distance(0.15)),
            candidate(at_distance(0.45)),
        ];

        let query_id = RecordId::Burn(BurnId::new());
        let found =
            find_conflicts(query_id, &query, &candidates, DEFAULT_MAX_DISTANCE, None).unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].severity, Severity::High);
        assert_eq!(found[1].severity, Severity::Medium);
        assert_eq!(found[2].severity, Severity::Low);
        assert!(found.windows(2).all(|w| w[0].cosine_distance <= w[1].cosine_distance));
        assert_relative_eq!(found[0].overlap_percentage, 95.0, epsilon = 0.11);
    }

    #[test]
    fn test_find_conflicts_excludes_at_max_distance() {
        let query = at_distance(0.0);
        let candidates = vec![candidate(at_distance(0.3)), candidate(at_distance(0.5))];
        let detector = ConflictDetector::default();
        let found = detector
            .find_conflicts(RecordId::Burn(BurnId::new()), &query, &candidates, 0.3, None)
            .unwrap();
        // f32 rounding can land 0.3 a hair either side; the far one never qualifies.
        assert!(found.len() <= 1);
        assert!(found.iter().all(|c| c.cosine_distance < 0.3));

        let none = detector
            .find_conflicts(RecordId::Burn(BurnId::new()), &query, &candidates, 0.0, None)
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_find_conflicts_top_k_and_self_skip() {
        let query = at_distance(0.0);
        let own = candidate(query.clone());
        let query_id = own.id;
        let candidates = vec![
            own,
            candidate(at_distance(0.01)),
            candidate(at_distance(0.02)),
            candidate(at_distance(0.03)),
        ];

        let found =
            find_conflicts(query_id, &query, &candidates, DEFAULT_MAX_DISTANCE, Some(2)).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| c.candidate_id != query_id));
        assert!(found.iter().all(|c| c.query_id == query_id));
    }

    #[test]
    fn test_find_conflicts_rejects_mismatched_candidate() {
        let query = at_distance(0.0);
        let burn = EmbeddingVector::normalized(EmbeddingKind::Burn, &[1.0; BURN_DIM]).unwrap();
        let err = find_conflicts(
            RecordId::Burn(BurnId::new()),
            &query,
            &[candidate(burn)],
            DEFAULT_MAX_DISTANCE,
            None,
        )
        .unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_custom_thresholds_change_severity() {
        let detector = ConflictDetector::new(ConflictThresholds {
            high: 0.02,
            medium: 0.04,
        });
        let found = detector
            .find_conflicts(
                RecordId::Burn(BurnId::new()),
                &at_distance(0.0),
                &[candidate(at_distance(0.05))],
                0.3,
                None,
            )
            .unwrap();
        assert_eq!(found[0].severity, Severity::Low);
    }
}
