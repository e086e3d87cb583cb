//! Element kernels for linear tetrahedra.
//!
//! Precomputes per-element reference data once and evaluates the
//! internal nodal forces of one element from current positions:
//!
//! 1. `F = Σ x_a ⊗ ∇N_a`
//! 2. `σ` from the element's material
//! 3. First Piola stress `P = J·σ·F⁻ᵀ`
//! 4. `f_a = −V₀·P·∇N_a`
//!
//! The four nodal forces of an element always sum to zero.

use dropsim_material::{cauchy_stress, strain_energy_density, Material};
use dropsim_math::tet::{deformation_gradient, TetShape};
use dropsim_math::{DMat3, DVec3};
use dropsim_mesh::TetMesh;
use dropsim_types::{DropError, DropResult, MaterialId};

/// Precomputed reference data for a single tetrahedron.
#[derive(Debug, Clone, Copy)]
pub struct ElementData {
    /// Node indices (into the global node buffers).
    pub nodes: [u32; 4],
    /// Material of the element.
    pub material: MaterialId,
    /// Reference volume V₀.
    pub volume: f64,
    /// Reference shape-function gradients.
    pub gradients: [DVec3; 4],
    /// Inscribed-sphere diameter (timestep length scale).
    pub inscribed_diameter: f64,
    /// Shortest reference edge.
    pub min_edge: f64,
}

impl ElementData {
    /// Compute reference data for every element of `mesh`.
    pub fn from_mesh(mesh: &TetMesh) -> DropResult<Vec<Self>> {
        (0..mesh.element_count())
            .map(|e| {
                let shape = TetShape::from_points(&mesh.element_points(e)).ok_or_else(|| {
                    DropError::InvalidMesh(format!("Element {e} has no valid reference shape"))
                })?;
                Ok(Self {
                    nodes: mesh.elements[e],
                    material: mesh.material_ids[e],
                    volume: shape.volume,
                    gradients: shape.gradients,
                    inscribed_diameter: shape.inscribed_diameter,
                    min_edge: shape.min_edge,
                })
            })
            .collect()
    }

    /// Current positions of the element's nodes.
    #[inline]
    pub fn gather(&self, positions: &[DVec3]) -> [DVec3; 4] {
        self.nodes.map(|n| positions[n as usize])
    }

    /// Deformation gradient at the current configuration.
    #[inline]
    pub fn deformation_gradient(&self, positions: &[DVec3]) -> DMat3 {
        deformation_gradient(&self.gather(positions), &self.gradients)
    }

    /// Volume ratio `J = det F` at the current configuration.
    pub fn jacobian(&self, positions: &[DVec3]) -> f64 {
        self.deformation_gradient(positions).determinant()
    }

    /// Cauchy stress at the current configuration.
    pub fn stress(&self, positions: &[DVec3], material: &Material) -> DropResult<DMat3> {
        cauchy_stress(material, &self.deformation_gradient(positions))
    }

    /// Internal nodal forces at the current configuration.
    pub fn internal_forces(&self, positions: &[DVec3], material: &Material) -> DropResult<[DVec3; 4]> {
        let f = self.deformation_gradient(positions);
        let sigma = cauchy_stress(material, &f)?;
        let j = f.determinant();
        let piola = sigma * f.inverse().transpose() * j;
        Ok(self.gradients.map(|g| -(piola * g) * self.volume))
    }

    /// Elastic energy stored in the element.
    pub fn strain_energy(&self, positions: &[DVec3], material: &Material) -> DropResult<f64> {
        Ok(self.volume * strain_energy_density(material, &self.deformation_gradient(positions))?)
    }
}
