//! # smokecheck - smoke dispersion and burn conflict screening
//!
//! smokecheck estimates where smoke from an agricultural burn will go and
//! flags proposed burns whose smoke footprint resembles one already scheduled.
//!
//! ## Core Concepts
//!
//! - **Plume**: A Gaussian plume profile of ground-level PM2.5 downwind of a burn
//! - **Embedding**: A fixed-length unit vector summarising weather, smoke, a burn, or a decision
//! - **Conflict**: A stored burn whose smoke vector lies within a cosine-distance cutoff
//! - **Score**: Additive 1-10 priority and weather-suitability heuristics
//!
//! ## Usage
//!
//! ```rust,ignore
//! use smokecheck::{
//!     AtmosphericStability, BurnRequest, EngineConfig, FuelType, InMemoryVectorStore,
//!     SmokeEngine, TimeRange, WeatherObservation,
//! };
//!
//! let engine = SmokeEngine::new(InMemoryVectorStore::new(), EngineConfig::default())?;
//!
//! let weather = WeatherObservation::builder()
//!     .temperature(22.0)
//!     .humidity(55.0)
//!     .wind_speed(8.0)
//!     .atmospheric_stability(AtmosphericStability::Neutral)
//!     .build()?;
//!
//! let burn = BurnRequest::builder()
//!     .acreage(100.0)
//!     .fuel_type(FuelType::RiceStraw)
//!     .window(TimeRange::starting_for(start, chrono::Duration::hours(4))?)
//!     .build()?;
//!
//! let assessment = engine.assess_burn(&burn, &weather)?;
//! engine.register_burn(&burn, &weather)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Domain inputs
pub mod burn;
pub mod decision;
pub mod error;
pub mod geo;
pub mod time;
pub mod weather;

// Models
pub mod conflict;
pub mod embedding;
pub mod plume;
pub mod scoring;
pub mod similarity;

// Storage and orchestration
pub mod config;
pub mod engine;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use burn::{BurnId, BurnIntensity, BurnRequest, FuelType};
pub use config::EngineConfig;
pub use conflict::{
    proximity_conflict, ConflictRecord, ConflictThresholds, ProximityPolicy, Severity,
};
pub use decision::{DecisionId, DecisionOutcome, SchedulingDecision};
pub use embedding::{EmbeddingGenerator, EmbeddingKind, EmbeddingVector};
pub use engine::{BurnAssessment, BurnVectors, SimilarDecision, SmokeEngine};
pub use error::{SmokeError, SmokeResult, ValidationError};
pub use geo::{GeoPoint, SpatialHint};
pub use plume::{compute_plume, PlumeConfig, PlumeModel, PlumeProfile};
pub use scoring::{priority_score, weather_suitability_score, Jitter, NoJitter, SeededJitter};
pub use similarity::{cosine_distance, cosine_similarity, find_conflicts, ConflictDetector};
pub use storage::{
    Candidate, InMemoryVectorStore, RecordId, StorageError, VectorMetadata, VectorStore,
};
pub use time::TimeRange;
pub use weather::{AtmosphericStability, WeatherObservation};
