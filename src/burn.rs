//! Burn requests and their categorical inputs.
//!
//! Fuel types and burn intensities are closed enums with an explicit
//! fallback. Every per-category constant the engine needs (emission factor,
//! ordinal encoding, priority bonus) lives in a `match` here so that adding a
//! variant is a compile error everywhere it matters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::geo::GeoPoint;
use crate::time::TimeRange;

/// Emission factor (kg/acre) used for unrecognised fuel types.
pub const DEFAULT_EMISSION_FACTOR: f64 = 10.0;

/// Ordinal used for any unrecognised category.
pub const UNKNOWN_ORDINAL: f64 = 0.5;

/// Priority bonus used for unrecognised fuel types.
pub const DEFAULT_FUEL_PRIORITY_BONUS: f64 = 1.0;

/// Unique identifier for a burn request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BurnId(Uuid);

impl BurnId {
    /// Creates a new random burn ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a burn ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Crop residue being burned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    /// Wheat stubble.
    WheatStubble,
    /// Rice straw.
    RiceStraw,
    /// Corn stalks.
    CornStalks,
    /// Barley stubble.
    BarleyStubble,
    /// Grass seed residue.
    GrassResidue,
    /// Orchard prunings.
    OrchardPrunings,
    /// Cotton stalks.
    CottonStalks,
    /// Any fuel without a dedicated table entry.
    Other(String),
}

impl FuelType {
    /// Every fuel with a dedicated table entry.
    pub const KNOWN: [Self; 7] = [
        Self::WheatStubble,
        Self::RiceStraw,
        Self::CornStalks,
        Self::BarleyStubble,
        Self::GrassResidue,
        Self::OrchardPrunings,
        Self::CottonStalks,
    ];

    /// Parses a fuel name; unknown names become `Other`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let key = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "wheat_stubble" | "wheat" => Self::WheatStubble,
            "rice_straw" | "rice" => Self::RiceStraw,
            "corn_stalks" | "corn" => Self::CornStalks,
            "barley_stubble" | "barley" => Self::BarleyStubble,
            "grass_residue" | "grass" => Self::GrassResidue,
            "orchard_prunings" | "orchard" => Self::OrchardPrunings,
            "cotton_stalks" | "cotton" => Self::CottonStalks,
            _ => {
                tracing::debug!(fuel = name, "unknown fuel type, table defaults apply");
                Self::Other(key)
            }
        }
    }

    /// Canonical snake_case name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::WheatStubble => "wheat_stubble",
            Self::RiceStraw => "rice_straw",
            Self::CornStalks => "corn_stalks",
            Self::BarleyStubble => "barley_stubble",
            Self::GrassResidue => "grass_residue",
            Self::OrchardPrunings => "orchard_prunings",
            Self::CottonStalks => "cotton_stalks",
            Self::Other(name) => name,
        }
    }

    /// PM emission factor in kg per acre burned.
    #[must_use]
    pub const fn emission_factor(&self) -> f64 {
        match self {
            Self::WheatStubble => 11.0,
            Self::RiceStraw => 13.5,
            Self::CornStalks => 9.5,
            Self::BarleyStubble => 10.5,
            Self::GrassResidue => 7.0,
            Self::OrchardPrunings => 15.0,
            Self::CottonStalks => 12.0,
            Self::Other(_) => DEFAULT_EMISSION_FACTOR,
        }
    }

    /// Volatility ordinal in [0, 1]; more volatile fuels map higher.
    #[must_use]
    pub const fn ordinal(&self) -> f64 {
        match self {
            Self::BarleyStubble => 0.3,
            Self::WheatStubble => 0.4,
            Self::CornStalks => 0.55,
            Self::CottonStalks => 0.6,
            Self::RiceStraw => 0.7,
            Self::GrassResidue => 0.8,
            Self::OrchardPrunings => 0.9,
            Self::Other(_) => UNKNOWN_ORDINAL,
        }
    }

    /// Scheduling priority bonus added by the scoring engine.
    #[must_use]
    pub const fn priority_bonus(&self) -> f64 {
        match self {
            Self::RiceStraw => 1.5,
            Self::OrchardPrunings => 1.3,
            Self::CornStalks => 1.2,
            Self::CottonStalks => 1.1,
            Self::WheatStubble | Self::BarleyStubble => 1.0,
            Self::GrassResidue => 0.8,
            Self::Other(_) => DEFAULT_FUEL_PRIORITY_BONUS,
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How hot the burn is planned to run.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BurnIntensity {
    /// Smouldering, slow consumption.
    Low,
    /// Typical field burn.
    #[default]
    Moderate,
    /// Hot, fast consumption.
    High,
}

impl BurnIntensity {
    /// All intensities, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Moderate, Self::High];

    /// Parses an intensity name, falling back to `Moderate`.
    #[must_use]
    pub fn parse_or_moderate(s: &str) -> Self {
        s.parse().unwrap_or_else(|()| {
            tracing::debug!(intensity = s, "unknown burn intensity, using moderate");
            Self::Moderate
        })
    }

    /// Multiplier applied to the fuel emission factor.
    #[must_use]
    pub const fn emission_multiplier(&self) -> f64 {
        match self {
            Self::Low => 0.7,
            Self::Moderate => 1.0,
            Self::High => 1.4,
        }
    }

    /// Buoyancy factor in the plume-rise term.
    #[must_use]
    pub const fn rise_factor(&self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Moderate => 1.5,
            Self::High => 2.0,
        }
    }

    /// Severity ordinal in [0, 1].
    #[must_use]
    pub const fn ordinal(&self) -> f64 {
        match self {
            Self::Low => 0.2,
            Self::Moderate => 0.5,
            Self::High => 0.9,
        }
    }

    /// Snake-case name, as serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

impl FromStr for BurnIntensity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "moderate" | "medium" => Ok(Self::Moderate),
            "high" => Ok(Self::High),
            _ => Err(()),
        }
    }
}

impl fmt::Display for BurnIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to burn a field within a time window.
///
/// Created by the surrounding system and read-only to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnRequest {
    /// Burn identity.
    pub id: BurnId,
    /// Field area in acres, always > 0.
    pub acreage: f64,
    /// Residue being burned.
    pub fuel_type: FuelType,
    /// Planned intensity.
    pub intensity: BurnIntensity,
    /// Scheduled burn window.
    pub window: TimeRange,
    /// Field location, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl BurnRequest {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> BurnRequestBuilder {
        BurnRequestBuilder::default()
    }

    /// Re-checks invariants on a request that may have been deserialized.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAcreage` if acreage is not a positive finite number.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_acreage(self.acreage)
    }
}

fn validate_acreage(acreage: f64) -> Result<(), ValidationError> {
    if acreage.is_finite() && acreage > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveAcreage { value: acreage })
    }
}

/// Builder for `BurnRequest`.
#[derive(Debug, Default, Clone)]
pub struct BurnRequestBuilder {
    id: Option<BurnId>,
    acreage: Option<f64>,
    fuel_type: Option<FuelType>,
    intensity: Option<BurnIntensity>,
    window: Option<TimeRange>,
    location: Option<GeoPoint>,
}

impl BurnRequestBuilder {
    /// Uses a caller-supplied ID instead of a fresh random one.
    #[must_use]
    pub fn id(mut self, id: BurnId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the field area in acres.
    #[must_use]
    pub fn acreage(mut self, acres: f64) -> Self {
        self.acreage = Some(acres);
        self
    }

    /// Sets the fuel type.
    #[must_use]
    pub fn fuel_type(mut self, fuel: FuelType) -> Self {
        self.fuel_type = Some(fuel);
        self
    }

    /// Sets the fuel from a free-form name.
    #[must_use]
    pub fn fuel_name(self, name: &str) -> Self {
        self.fuel_type(FuelType::parse(name))
    }

    /// Sets the intensity.
    #[must_use]
    pub fn intensity(mut self, intensity: BurnIntensity) -> Self {
        self.intensity = Some(intensity);
        self
    }

    /// Sets the burn window.
    #[must_use]
    pub fn window(mut self, window: TimeRange) -> Self {
        self.window = Some(window);
        self
    }

    /// Sets the field location.
    #[must_use]
    pub fn location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    /// Builds the request. Intensity defaults to moderate.
    ///
    /// # Errors
    ///
    /// - `MissingField` if acreage, fuel type or window is unset
    /// - `NonPositiveAcreage` if acreage ≤ 0 or non-finite
    pub fn build(self) -> Result<BurnRequest, ValidationError> {
        let acreage = self.acreage.ok_or_else(|| ValidationError::missing("acreage"))?;
        validate_acreage(acreage)?;
        let fuel_type = self
            .fuel_type
            .ok_or_else(|| ValidationError::missing("fuel_type"))?;
        let window = self.window.ok_or_else(|| ValidationError::missing("window"))?;

        Ok(BurnRequest {
            id: self.id.unwrap_or_default(),
            acreage,
            fuel_type,
            intensity: self.intensity.unwrap_or_default(),
            window,
            location: self.location,
        })
    }
}
