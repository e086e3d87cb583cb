//! Linear tetrahedron geometry.
//!
//! A 4-node tetrahedron has constant shape-function gradients, so the
//! deformation gradient is uniform over the element:
//!
//! ```text
//! Dm = [X1-X0, X2-X0, X3-X0]      (reference edge matrix)
//! ∇N_1..3 = rows of Dm⁻¹,   ∇N_0 = -(∇N_1 + ∇N_2 + ∇N_3)
//! F = Σ_a x_a ⊗ ∇N_a
//! ```

use glam::{DMat3, DVec3};

/// Local node triples of the four faces, wound so the normal points
/// out of a positively oriented tetrahedron.
pub const TET_FACES: [[usize; 3]; 4] = [[1, 2, 3], [0, 3, 2], [0, 1, 3], [0, 2, 1]];

/// Signed volume. Positive when `(p1-p0, p2-p0, p3-p0)` is right-handed.
#[inline]
pub fn signed_volume(p: &[DVec3; 4]) -> f64 {
    (p[1] - p[0]).dot((p[2] - p[0]).cross(p[3] - p[0])) / 6.0
}

/// Length of the longest edge.
pub fn max_edge_length(p: &[DVec3; 4]) -> f64 {
    let mut longest = 0.0f64;
    for a in 0..4 {
        for b in (a + 1)..4 {
            longest = longest.max(p[a].distance(p[b]));
        }
    }
    longest
}

/// Reference-configuration data of one tetrahedron.
#[derive(Debug, Clone, Copy)]
pub struct TetShape {
    /// Reference volume (positive).
    pub volume: f64,
    /// Shape-function gradients `∇N_a` in the reference configuration.
    pub gradients: [DVec3; 4],
    /// Inscribed-sphere diameter `6V / ΣA_faces`, used as the
    /// characteristic length for the stable timestep.
    pub inscribed_diameter: f64,
    /// Shortest edge.
    pub min_edge: f64,
}

impl TetShape {
    /// Precompute shape data. Returns `None` for inverted or flat elements.
    pub fn from_points(p: &[DVec3; 4]) -> Option<Self> {
        let volume = signed_volume(p);
        if volume.is_nan() || volume <= 0.0 {
            return None;
        }

        let dm = DMat3::from_cols(p[1] - p[0], p[2] - p[0], p[3] - p[0]);
        let dm_inv = dm.inverse();
        if !dm_inv.is_finite() {
            return None;
        }

        let g1 = dm_inv.row(0);
        let g2 = dm_inv.row(1);
        let g3 = dm_inv.row(2);
        let gradients = [-(g1 + g2 + g3), g1, g2, g3];

        let face_area_sum: f64 = TET_FACES
            .iter()
            .map(|f| 0.5 * (p[f[1]] - p[f[0]]).cross(p[f[2]] - p[f[0]]).length())
            .sum();

        let mut min_edge = f64::INFINITY;
        for a in 0..4 {
            for b in (a + 1)..4 {
                min_edge = min_edge.min(p[a].distance(p[b]));
            }
        }

        Some(Self {
            volume,
            gradients,
            inscribed_diameter: 6.0 * volume / face_area_sum,
            min_edge,
        })
    }
}

/// Deformation gradient `F = Σ_a x_a ⊗ ∇N_a` from current node positions.
#[inline]
pub fn deformation_gradient(x: &[DVec3; 4], gradients: &[DVec3; 4]) -> DMat3 {
    let mut cols = [DVec3::ZERO; 3];
    for a in 0..4 {
        cols[0] += x[a] * gradients[a].x;
        cols[1] += x[a] * gradients[a].y;
        cols[2] += x[a] * gradients[a].z;
    }
    DMat3::from_cols(cols[0], cols[1], cols[2])
}
