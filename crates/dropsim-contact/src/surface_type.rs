//! Impact surface catalogue.

use serde::{Deserialize, Serialize};

/// Kind of floor the product lands on.
///
/// Compliant surfaces lower the automatic contact stiffness when they
/// are softer than the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceType {
    /// Steel impact plate of a drop tester.
    #[default]
    Rigid,
    Concrete,
    Wood,
    /// Foam mat or carpet underlay.
    Foam,
}

impl SurfaceType {
    /// Surface modulus (Pa). `None` for a perfectly rigid plane.
    pub fn modulus(&self) -> Option<f64> {
        match self {
            SurfaceType::Rigid => None,
            SurfaceType::Concrete => Some(3.0e10),
            SurfaceType::Wood => Some(1.1e10),
            SurfaceType::Foam => Some(1.0e6),
        }
    }

    /// Coulomb friction coefficient against typical product surfaces.
    pub fn friction(&self) -> f64 {
        match self {
            SurfaceType::Rigid => 0.3,
            SurfaceType::Concrete => 0.6,
            SurfaceType::Wood => 0.45,
            SurfaceType::Foam => 0.8,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SurfaceType::Rigid => "rigid",
            SurfaceType::Concrete => "concrete",
            SurfaceType::Wood => "wood",
            SurfaceType::Foam => "foam",
        }
    }
}
