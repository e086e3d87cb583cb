//! Sensor node sets.
//!
//! A sensor stands in for an accelerometer glued to the product: its
//! reading is the acceleration of the centre of gravity of its nodes.

use dropsim_math::DVec3;
use dropsim_mesh::TetMesh;
use dropsim_solver::SimulationState;
use dropsim_types::{DropError, DropResult, MaterialId};
use serde::{Deserialize, Serialize};

/// Named set of nodes read as one mass-weighted point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSet {
    pub name: String,
    pub nodes: Vec<u32>,
}

impl SensorSet {
    pub fn new(name: impl Into<String>, nodes: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            nodes,
        }
    }

    /// Every node of the mesh.
    pub fn whole_body(mesh: &TetMesh) -> Self {
        Self::new("body", (0..mesh.node_count() as u32).collect())
    }

    /// Nodes of every element made of `material`.
    pub fn from_material(name: impl Into<String>, mesh: &TetMesh, material: MaterialId) -> Self {
        Self::new(name, mesh.nodes_with_material(material))
    }

    /// Checks that the set is non-empty and refers to existing nodes.
    pub fn validate(&self, node_count: usize) -> DropResult<()> {
        if self.nodes.is_empty() {
            return Err(DropError::InvalidConfig(format!("sensor '{}' has no nodes", self.name)));
        }
        if let Some(&n) = self.nodes.iter().find(|&&n| n as usize >= node_count) {
            return Err(DropError::InvalidConfig(format!(
                "sensor '{}' refers to node {n}, mesh has {node_count}",
                self.name
            )));
        }
        Ok(())
    }

    /// Total lumped mass of the set.
    pub fn mass(&self, state: &SimulationState) -> f64 {
        self.nodes.iter().map(|&n| state.masses[n as usize]).sum()
    }

    /// Mass-weighted velocity of the set.
    pub fn cg_velocity(&self, state: &SimulationState) -> DVec3 {
        self.weighted(state, &state.velocities)
    }

    /// Mass-weighted acceleration of the set.
    pub fn cg_acceleration(&self, state: &SimulationState) -> DVec3 {
        self.weighted(state, &state.accelerations)
    }

    fn weighted(&self, state: &SimulationState, field: &[DVec3]) -> DVec3 {
        let mut sum = DVec3::ZERO;
        let mut mass = 0.0;
        for &n in &self.nodes {
            let m = state.masses[n as usize];
            sum += field[n as usize] * m;
            mass += m;
        }
        if mass > 0.0 {
            sum / mass
        } else {
            DVec3::ZERO
        }
    }
}
