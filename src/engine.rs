//! Assessment engine.
//!
//! Ties the plume model, embedding generator, vector store and scoring
//! together. The engine is synchronous; batch assessment fans out with rayon.

use chrono::Duration;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::burn::{BurnId, BurnRequest};
use crate::config::EngineConfig;
use crate::conflict::ConflictRecord;
use crate::decision::SchedulingDecision;
use crate::embedding::{EmbeddingGenerator, EmbeddingKind, EmbeddingVector};
use crate::error::SmokeResult;
use crate::geo::SpatialHint;
use crate::plume::{PlumeModel, PlumeProfile};
use crate::scoring::{priority_score, weather_suitability_score, SeededJitter};
use crate::similarity::{cosine_distance, ConflictDetector};
use crate::storage::{RecordId, VectorMetadata, VectorStore};
use crate::time::TimeRange;
use crate::weather::WeatherObservation;

/// The three vectors describing one burn under one weather observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnVectors {
    /// 128-d weather vector.
    pub weather: EmbeddingVector,
    /// 64-d smoke vector, used for conflict search.
    pub smoke: EmbeddingVector,
    /// 32-d burn vector.
    pub burn: EmbeddingVector,
}

/// Everything the engine knows about a proposed burn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnAssessment {
    /// Burn that was assessed.
    pub burn_id: BurnId,
    /// Dispersion profile under the given weather.
    pub plume: PlumeProfile,
    /// Vectors computed for the burn.
    pub vectors: BurnVectors,
    /// Smoke-similar burns, nearest first.
    pub conflicts: Vec<ConflictRecord>,
    /// Registered burns that start too soon and too close, regardless of
    /// smoke similarity.
    pub proximity_conflicts: Vec<RecordId>,
    /// Priority score in [1, 10].
    pub priority: f64,
    /// Weather suitability score in [1, 10].
    pub suitability: f64,
}

impl BurnAssessment {
    /// True if any smoke or proximity conflict was found.
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty() || !self.proximity_conflicts.is_empty()
    }
}

/// A past decision ranked by similarity to a query decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarDecision {
    /// Stored decision.
    pub id: RecordId,
    /// Distance from the query decision.
    pub cosine_distance: f64,
    /// Metadata stored with the decision.
    pub metadata: VectorMetadata,
}

/// Smoke assessment engine over a vector store.
#[derive(Debug)]
pub struct SmokeEngine<S: VectorStore> {
    store: S,
    config: EngineConfig,
    plume: PlumeModel,
    generator: EmbeddingGenerator,
    detector: ConflictDetector,
}

impl<S: VectorStore> SmokeEngine<S> {
    /// Creates an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns `SmokeError::Config` if the configuration is invalid.
    pub fn new(store: S, config: EngineConfig) -> SmokeResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            plume: PlumeModel::new(config.plume.clone()),
            generator: EmbeddingGenerator::new(config.embedding_seed),
            detector: ConflictDetector::new(config.thresholds),
            config,
        })
    }

    /// Underlying vector store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Validated configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Embedding generator, seeded from the config.
    #[must_use]
    pub const fn generator(&self) -> &EmbeddingGenerator {
        &self.generator
    }

    /// Computes the plume and the three burn vectors.
    ///
    /// # Errors
    ///
    /// Returns validation errors from the plume model.
    pub fn embed_burn(
        &self,
        burn: &BurnRequest,
        weather: &WeatherObservation,
    ) -> SmokeResult<(PlumeProfile, BurnVectors)> {
        let plume = self.plume.compute(burn, weather)?;
        let vectors = BurnVectors {
            weather: self.generator.weather_vector(weather)?,
            smoke: self.generator.smoke_vector(burn, weather, &plume)?,
            burn: self.generator.burn_vector(burn)?,
        };
        Ok((plume, vectors))
    }

    /// Assesses a proposed burn against everything registered so far.
    ///
    /// The burn itself is not registered; see [`Self::register_burn`].
    ///
    /// # Errors
    ///
    /// - `Validation` if the burn or weather is invalid
    /// - `DimensionMismatch` if the store returns a malformed smoke vector
    /// - `Storage` if the candidate query fails
    pub fn assess_burn(
        &self,
        burn: &BurnRequest,
        weather: &WeatherObservation,
    ) -> SmokeResult<BurnAssessment> {
        let (plume, vectors) = self.embed_burn(burn, weather)?;

        let window = self.search_window(&burn.window);
        let hint = self.search_hint(burn);
        let candidates = self
            .store
            .query_candidates(EmbeddingKind::Smoke, &window, hint.as_ref())?;

        let query_id = RecordId::Burn(burn.id);
        let conflicts = self.detector.find_conflicts(
            query_id,
            &vectors.smoke,
            &candidates,
            self.config.max_distance,
            self.config.top_k,
        )?;

        let proximity_conflicts = self.proximity_conflicts(burn, query_id)?;

        let mut jitter = self.jitter_for(burn.id);
        let priority = priority_score(burn, weather, &mut jitter);
        let suitability = weather_suitability_score(weather, &mut jitter);

        tracing::info!(
            burn_id = %burn.id,
            candidates = candidates.len(),
            conflicts = conflicts.len(),
            proximity_conflicts = proximity_conflicts.len(),
            priority,
            suitability,
            "assessed burn"
        );

        Ok(BurnAssessment {
            burn_id: burn.id,
            plume,
            vectors,
            conflicts,
            proximity_conflicts,
            priority,
            suitability,
        })
    }

    /// Assesses many burns in parallel, preserving input order.
    #[must_use]
    pub fn assess_many(
        &self,
        inputs: &[(BurnRequest, WeatherObservation)],
    ) -> Vec<SmokeResult<BurnAssessment>> {
        inputs
            .par_iter()
            .map(|(burn, weather)| self.assess_burn(burn, weather))
            .collect()
    }

    /// Stores the burn's weather, smoke and burn vectors so later
    /// assessments see it. Re-registering a burn replaces its vectors.
    ///
    /// # Errors
    ///
    /// Returns validation errors from the plume model or storage errors.
    pub fn register_burn(
        &self,
        burn: &BurnRequest,
        weather: &WeatherObservation,
    ) -> SmokeResult<PlumeProfile> {
        let (plume, vectors) = self.embed_burn(burn, weather)?;
        let id = RecordId::Burn(burn.id);
        let metadata = VectorMetadata {
            window: Some(burn.window.clone()),
            location: burn.location,
            attributes: serde_json::json!({
                "fuel_type": burn.fuel_type.as_str(),
                "acreage": burn.acreage,
                "intensity": burn.intensity.as_str(),
                "max_concentration": plume.max_concentration(),
                "max_dispersion_radius": plume.max_dispersion_radius(),
            }),
        };

        self.store.upsert(id, vectors.weather, metadata.clone())?;
        self.store.upsert(id, vectors.smoke, metadata.clone())?;
        self.store.upsert(id, vectors.burn, metadata)?;

        tracing::info!(burn_id = %burn.id, "registered burn");
        Ok(plume)
    }

    /// Removes every vector stored for a burn.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub fn unregister_burn(&self, id: BurnId) -> SmokeResult<usize> {
        let removed = self.store.remove(RecordId::Burn(id))?;
        tracing::info!(burn_id = %id, removed, "unregistered burn");
        Ok(removed)
    }

    /// Embeds and stores a scheduling decision.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub fn record_decision(&self, decision: &SchedulingDecision) -> SmokeResult<EmbeddingVector> {
        let vector = self.generator.decision_vector(decision)?;
        let metadata = VectorMetadata {
            window: Some(TimeRange::starting_at(decision.decided_at)),
            location: None,
            attributes: serde_json::json!({
                "outcome": decision.outcome,
                "burn_id": decision.burn_id,
                "confidence": decision.confidence,
                "risk_level": decision.risk_level,
            }),
        };
        self.store.upsert(RecordId::Decision(decision.id), vector.clone(), metadata)?;
        tracing::debug!(decision_id = %decision.id, "recorded decision");
        Ok(vector)
    }

    /// Past decisions nearest to `decision`, nearest first. The decision
    /// itself is excluded if it was recorded.
    ///
    /// # Errors
    ///
    /// Returns storage errors or `DimensionMismatch` for malformed stored
    /// vectors.
    pub fn similar_decisions(
        &self,
        decision: &SchedulingDecision,
        top_k: usize,
    ) -> SmokeResult<Vec<SimilarDecision>> {
        let query = self.generator.decision_vector(decision)?;
        let query_id = RecordId::Decision(decision.id);
        let candidates = self
            .store
            .query_candidates(EmbeddingKind::Decision, &TimeRange::forever(), None)?;

        let mut ranked = candidates
            .into_iter()
            .filter(|c| c.id != query_id)
            .map(|c| {
                Ok(SimilarDecision {
                    id: c.id,
                    cosine_distance: cosine_distance(query.values(), c.vector.values())?,
                    metadata: c.metadata,
                })
            })
            .collect::<SmokeResult<Vec<_>>>()?;

        ranked.sort_by(|a, b| a.cosine_distance.total_cmp(&b.cosine_distance));
        ranked.truncate(top_k);
        Ok(ranked)
    }

    /// Registered burns that break the start-gap and distance rule. These
    /// are looked up separately from smoke candidates because two short
    /// windows can start close together without overlapping.
    fn proximity_conflicts(
        &self,
        burn: &BurnRequest,
        query_id: RecordId,
    ) -> SmokeResult<Vec<RecordId>> {
        let Some(center) = burn.location else {
            return Ok(Vec::new());
        };
        let policy = &self.config.proximity;
        let hint = SpatialHint::new(center, policy.max_distance_km);
        let nearby = self.store.query_candidates(
            EmbeddingKind::Burn,
            &policy.candidate_window(&burn.window),
            Some(&hint),
        )?;

        Ok(nearby
            .iter()
            .filter(|c| c.id != query_id)
            .filter(|c| policy.conflicts_with_record(burn, &c.metadata))
            .map(|c| c.id)
            .collect())
    }

    fn search_window(&self, window: &TimeRange) -> TimeRange {
        let slack = Duration::try_hours(self.config.search_slack_hours).unwrap_or(Duration::MAX);
        window.widened(slack)
    }

    fn search_hint(&self, burn: &BurnRequest) -> Option<SpatialHint> {
        burn.location
            .map(|center| SpatialHint::new(center, self.config.search_radius_km))
    }

    fn jitter_for(&self, id: BurnId) -> SeededJitter {
        let (hi, lo) = id.as_uuid().as_u64_pair();
        SeededJitter::with_amplitude(
            self.config.embedding_seed ^ hi ^ lo,
            self.config.score_jitter,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::burn::{BurnIntensity, FuelType};
    use crate::decision::DecisionOutcome;
    use crate::geo::GeoPoint;
    use crate::storage::InMemoryVectorStore;
    use crate::weather::AtmosphericStability;

    fn engine() -> SmokeEngine<InMemoryVectorStore> {
        SmokeEngine::new(InMemoryVectorStore::new(), EngineConfig::default()).unwrap()
    }

    fn weather() -> WeatherObservation {
        WeatherObservation::builder()
            .temperature(22.0)
            .humidity(55.0)
            .wind_speed(8.0)
            .wind_direction(270.0)
            .atmospheric_stability(AtmosphericStability::Neutral)
            .build()
            .unwrap()
    }

    fn burn(hour: u32, lat: f64) -> BurnRequest {
        let start = Utc.with_ymd_and_hms(2024, 10, 1, hour, 0, 0).unwrap();
        BurnRequest::builder()
            .acreage(100.0)
            .fuel_type(FuelType::RiceStraw)
            .intensity(BurnIntensity::Moderate)
            .window(TimeRange::starting_for(start, Duration::hours(4)).unwrap())
            .location(GeoPoint::new(lat, -121.7).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EngineConfig {
            max_distance: 0.0,
            ..EngineConfig::default()
        };
        assert!(SmokeEngine::new(InMemoryVectorStore::new(), config).is_err());
    }

    #[test]
    fn test_empty_store_has_no_conflicts() {
        let engine = engine();
        let a = engine.assess_burn(&burn(8, 38.5), &weather()).unwrap();
        assert!(!a.has_conflicts());
        assert_eq!(a.suitability, 9.5);
        assert_eq!(a.priority, 7.5);
        assert!(a.plume.max_concentration() > 0.0);
    }

    #[test]
    fn test_registered_twin_is_a_conflict() {
        let engine = engine();
        let first = burn(8, 38.5);
        engine.register_burn(&first, &weather()).unwrap();
        assert_eq!(engine.store().len().unwrap(), 3);

        let twin = burn(8, 38.51);
        let a = engine.assess_burn(&twin, &weather()).unwrap();
        assert_eq!(a.conflicts.len(), 1);
        assert_eq!(a.conflicts[0].candidate_id, RecordId::Burn(first.id));
        assert_eq!(a.conflicts[0].severity, crate::conflict::Severity::High);
        assert_eq!(a.proximity_conflicts, vec![RecordId::Burn(first.id)]);

        // A burn never conflicts with itself.
        let own = engine.assess_burn(&first, &weather()).unwrap();
        assert!(!own.has_conflicts());
    }

    #[test]
    fn test_non_overlapping_window_is_not_a_candidate() {
        let engine = engine();
        engine.register_burn(&burn(6, 38.5), &weather()).unwrap();
        let later = engine.assess_burn(&burn(14, 38.5), &weather()).unwrap();
        assert!(!later.has_conflicts());
    }

    #[test]
    fn test_proximity_found_without_window_overlap() {
        let engine = engine();
        let eight = Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).unwrap();
        let short_burn = |start: chrono::DateTime<Utc>, lat: f64| {
            BurnRequest::builder()
                .acreage(100.0)
                .fuel_type(FuelType::RiceStraw)
                .window(TimeRange::starting_for(start, Duration::hours(1)).unwrap())
                .location(GeoPoint::new(lat, -121.7).unwrap())
                .build()
                .unwrap()
        };

        let first = short_burn(eight, 38.5);
        engine.register_burn(&first, &weather()).unwrap();

        // Starts 90 minutes later, about 1.1 km north; the windows do not overlap.
        let next = short_burn(eight + Duration::minutes(90), 38.51);
        let a = engine.assess_burn(&next, &weather()).unwrap();
        assert!(a.conflicts.is_empty());
        assert_eq!(a.proximity_conflicts, vec![RecordId::Burn(first.id)]);

        // Three hours later is outside the start gap.
        let late = short_burn(eight + Duration::hours(3), 38.51);
        assert!(!engine.assess_burn(&late, &weather()).unwrap().has_conflicts());
    }

    #[test]
    fn test_unregister_removes_all_vectors() {
        let engine = engine();
        let b = burn(8, 38.5);
        engine.register_burn(&b, &weather()).unwrap();
        assert_eq!(engine.unregister_burn(b.id).unwrap(), 3);
        assert!(engine.store().is_empty().unwrap());
    }

    #[test]
    fn test_invalid_burn_is_rejected() {
        let engine = engine();
        let mut b = burn(8, 38.5);
        b.acreage = 0.0;
        let err = engine.assess_burn(&b, &weather()).unwrap_err();
        assert!(err.is_validation());
        assert!(engine.register_burn(&b, &weather()).is_err());
    }

    #[test]
    fn test_similar_decisions_ranked() {
        let engine = engine();
        let now = Utc.with_ymd_and_hms(2024, 10, 1, 7, 0, 0).unwrap();
        let approved = SchedulingDecision::new(DecisionOutcome::Approved, 0.9, 0.1, now)
            .unwrap()
            .weather_window_ok(true);
        let rejected = SchedulingDecision::new(DecisionOutcome::Rejected, 0.8, 0.9, now)
            .unwrap()
            .has_conflicts(true)
            .requires_approval(true);
        engine.record_decision(&approved).unwrap();
        engine.record_decision(&rejected).unwrap();

        let query = SchedulingDecision::new(DecisionOutcome::Approved, 0.85, 0.15, now)
            .unwrap()
            .weather_window_ok(true);
        let found = engine.similar_decisions(&query, 5).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, RecordId::Decision(approved.id));
        assert!(found[0].cosine_distance <= found[1].cosine_distance);

        // The recorded decision does not find itself.
        let own = engine.similar_decisions(&approved, 5).unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(engine.similar_decisions(&query, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_assess_many_preserves_order() {
        let engine = engine();
        let inputs: Vec<_> = [7, 9, 11]
            .into_iter()
            .map(|h| (burn(h, 38.5), weather()))
            .collect();
        let results = engine.assess_many(&inputs);
        assert_eq!(results.len(), 3);
        for ((b, _), r) in inputs.iter().zip(&results) {
            assert_eq!(r.as_ref().unwrap().burn_id, b.id);
        }
    }

    #[test]
    fn test_score_jitter_is_bounded_and_stable() {
        let config = EngineConfig {
            score_jitter: 0.5,
            ..EngineConfig::default()
        };
        let engine = SmokeEngine::new(InMemoryVectorStore::new(), config).unwrap();
        let b = burn(8, 38.5);
        let first = engine.assess_burn(&b, &weather()).unwrap();
        let again = engine.assess_burn(&b, &weather()).unwrap();
        assert_eq!(first.suitability, again.suitability);
        assert!((first.suitability - 9.5).abs() <= 0.5);
        assert!((first.priority - 7.5).abs() <= 0.5);
    }
}
