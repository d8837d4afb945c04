//! Dispersion coefficients per stability class.
//!
//! Briggs-style open-country fits of the form
//! `sigma_y = a·x·(1 + x/c)^-0.5`, `sigma_z = b·x·(1 + x/d)^-0.5`.
//! Classes whose vertical spread is unbounded in the Briggs tables get a very
//! large `d` so the correction term stays near 1 over the sampled range.

use serde::{Deserialize, Serialize};

use crate::weather::AtmosphericStability;

/// Four dispersion coefficients for one stability class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityParameters {
    /// Horizontal growth rate.
    pub a: f64,
    /// Vertical growth rate.
    pub b: f64,
    /// Horizontal attenuation length (m).
    pub c: f64,
    /// Vertical attenuation length (m).
    pub d: f64,
}

const VERY_UNSTABLE: StabilityParameters = StabilityParameters {
    a: 0.22,
    b: 0.20,
    c: 10_000.0,
    d: 1_000_000.0,
};

const UNSTABLE: StabilityParameters = StabilityParameters {
    a: 0.16,
    b: 0.12,
    c: 10_000.0,
    d: 1_000_000.0,
};

const NEUTRAL: StabilityParameters = StabilityParameters {
    a: 0.08,
    b: 0.06,
    c: 10_000.0,
    d: 667.0,
};

const STABLE: StabilityParameters = StabilityParameters {
    a: 0.06,
    b: 0.03,
    c: 10_000.0,
    d: 3_333.0,
};

const VERY_STABLE: StabilityParameters = StabilityParameters {
    a: 0.04,
    b: 0.016,
    c: 10_000.0,
    d: 3_333.0,
};

impl StabilityParameters {
    /// Looks up the coefficients for a class.
    #[must_use]
    pub const fn for_class(class: AtmosphericStability) -> Self {
        match class {
            AtmosphericStability::VeryUnstable => VERY_UNSTABLE,
            AtmosphericStability::Unstable => UNSTABLE,
            AtmosphericStability::Neutral => NEUTRAL,
            AtmosphericStability::Stable => STABLE,
            AtmosphericStability::VeryStable => VERY_STABLE,
        }
    }

    /// Looks up coefficients by class name; unknown names use neutral.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        Self::for_class(AtmosphericStability::parse_or_neutral(name))
    }

    /// Horizontal dispersion coefficient at downwind distance `x` (m).
    #[must_use]
    pub fn sigma_y(&self, x: f64) -> f64 {
        self.a * x * (1.0 + x / self.c).powf(-0.5)
    }

    /// Vertical dispersion coefficient at downwind distance `x` (m).
    #[must_use]
    pub fn sigma_z(&self, x: f64) -> f64 {
        self.b * x * (1.0 + x / self.d).powf(-0.5)
    }
}
