//! Impact plane.
//!
//! An infinite horizontal plane at `y = height`, normal `+Y`. Every
//! boundary node below it is in contact, whatever body it belongs to.

use dropsim_math::DVec3;
use serde::{Deserialize, Serialize};

use crate::contact::{ContactPair, ContactSurface};
use crate::surface_type::SurfaceType;

/// Horizontal impact surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPlane {
    /// Height of the plane (Y coordinate).
    pub height: f64,
    /// Surface material.
    pub surface: SurfaceType,
}

impl GroundPlane {
    /// Creates a plane at `y = 0`.
    pub fn new(surface: SurfaceType) -> Self {
        Self {
            height: 0.0,
            surface,
        }
    }

    /// Builder: set the plane height.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Contacts of the given candidate nodes with the plane, in node
    /// order. Areas are left at zero for the caller to fill in.
    pub fn detect(&self, positions: &[DVec3], nodes: &[u32]) -> Vec<ContactPair> {
        nodes
            .iter()
            .filter_map(|&n| {
                let depth = self.height - positions[n as usize].y;
                (depth > 0.0).then_some(ContactPair {
                    node: n,
                    surface: ContactSurface::Ground,
                    penetration_depth: depth,
                    normal: DVec3::Y,
                    barycentric: [1.0, 0.0, 0.0],
                    area: 0.0,
                })
            })
            .collect()
    }
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self::new(SurfaceType::default())
    }
}
