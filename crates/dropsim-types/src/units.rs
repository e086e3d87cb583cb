//! Unit-tagged quantities at the request boundary.
//!
//! Internally everything is SI. Packaging engineers specify drop heights
//! in inches, so lengths carry their unit until they are resolved.

use serde::{Deserialize, Serialize};

use crate::constants::{KILOGRAMS_PER_POUND, METERS_PER_INCH, PASCALS_PER_PSI};

/// Unit of a length value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Meters,
    Inches,
}

/// A length with an explicit unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Length {
    pub value: f64,
    #[serde(default)]
    pub unit: LengthUnit,
}

impl Length {
    /// A length in metres.
    pub fn meters(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::Meters,
        }
    }

    /// A length in inches.
    pub fn inches(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::Inches,
        }
    }

    /// Converts to metres.
    pub fn to_meters(self) -> f64 {
        match self.unit {
            LengthUnit::Meters => self.value,
            LengthUnit::Inches => inches_to_meters(self.value),
        }
    }
}

#[inline]
pub fn inches_to_meters(inches: f64) -> f64 {
    inches * METERS_PER_INCH
}

#[inline]
pub fn psi_to_pascals(psi: f64) -> f64 {
    psi * PASCALS_PER_PSI
}

#[inline]
pub fn pounds_to_kilograms(pounds: f64) -> f64 {
    pounds * KILOGRAMS_PER_POUND
}
