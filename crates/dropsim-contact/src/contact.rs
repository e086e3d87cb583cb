//! Contact pair data types.

use dropsim_math::DVec3;
use dropsim_types::FaceId;
use serde::{Deserialize, Serialize};

/// What a node is pressed against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ContactSurface {
    /// The impact plane.
    Ground,
    /// A boundary face of another body, with its three nodes.
    Face { face: FaceId, nodes: [u32; 3] },
}

/// A detected penetration of one node into a surface.
///
/// Carries all geometric data needed by the response phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactPair {
    /// Penetrating node.
    pub node: u32,
    /// Surface being penetrated.
    pub surface: ContactSurface,
    /// Penetration depth δ > 0 (m).
    pub penetration_depth: f64,
    /// Unit normal of the surface, pointing out of the obstacle. The
    /// penalty force on `node` acts along it.
    pub normal: DVec3,
    /// Barycentric weights of the foot point on the face. For the
    /// ground these are unused and set to `[1, 0, 0]`.
    pub barycentric: [f64; 3],
    /// Tributary area carried by the node (m²).
    pub area: f64,
}

impl ContactPair {
    /// Returns true for contacts against the impact plane.
    pub fn is_ground(&self) -> bool {
        matches!(self.surface, ContactSurface::Ground)
    }
}
