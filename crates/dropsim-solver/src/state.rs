//! Simulation state: per-node buffers for one run.
//!
//! This is the primary mutable data structure during simulation. The
//! integrator reads and writes these buffers each step; everything else
//! (mesh, elements, materials) is immutable after initialization.
//!
//! # Time levels
//!
//! After step `n` completes:
//! ```text
//! positions      x(t_n)           t_n = time
//! velocities     v(t_n − Δt/2)    leapfrog half step
//! accelerations  a(t_{n−1})       from the forces that produced this step
//! ```
//! `accel_time` records the instant the stored accelerations belong to.

use dropsim_math::DVec3;
use dropsim_mesh::TetMesh;
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

/// Per-node simulation buffers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Current positions.
    pub positions: Vec<DVec3>,
    /// Velocities (half-step behind positions once stepping has begun).
    pub velocities: Vec<DVec3>,
    /// Accelerations from the last force evaluation.
    pub accelerations: Vec<DVec3>,
    /// Force accumulator of the last step.
    pub forces: Vec<DVec3>,
    /// Lumped nodal masses.
    pub masses: Vec<f64>,
    /// Dirichlet flags. Fixed nodes never move.
    pub fixed: Vec<bool>,

    /// Simulated time of `positions` (s).
    pub time: f64,
    /// Completed steps.
    pub step: u64,
    /// Timestep in use (s).
    pub dt: f64,
    /// Time at which `accelerations` were evaluated (s).
    pub accel_time: f64,
}

impl SimulationState {
    /// Initialize state from a mesh, its lumped masses and per-node
    /// initial velocities. Fixed nodes start at rest.
    pub fn from_mesh(mesh: &TetMesh, masses: Vec<f64>, velocities: Vec<DVec3>, dt: f64) -> DropResult<Self> {
        let n = mesh.node_count();
        if masses.len() != n || velocities.len() != n {
            return Err(DropError::InvalidMesh(format!(
                "Mass ({}) and velocity ({}) arrays must match the node count ({n})",
                masses.len(),
                velocities.len()
            )));
        }
        if let Some(i) = masses.iter().position(|&m| !(m.is_finite() && m > 0.0)) {
            return Err(DropError::InvalidMesh(format!("Node {i} has no mass")));
        }

        let velocities = velocities
            .into_iter()
            .zip(&mesh.fixed)
            .map(|(v, &fixed)| if fixed { DVec3::ZERO } else { v })
            .collect();

        Ok(Self {
            positions: mesh.positions(),
            velocities,
            accelerations: vec![DVec3::ZERO; n],
            forces: vec![DVec3::ZERO; n],
            masses,
            fixed: mesh.fixed.clone(),
            time: 0.0,
            step: 0,
            dt,
            accel_time: 0.0,
        })
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    /// Total mass.
    pub fn total_mass(&self) -> f64 {
        self.masses.iter().sum()
    }

    /// Kinetic energy `½ Σ m v²` from the stored (half-step) velocities.
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self
            .masses
            .iter()
            .zip(&self.velocities)
            .map(|(m, v)| m * v.length_squared())
            .sum::<f64>()
    }

    /// Gravitational potential energy `−Σ m g·x` (zero at the origin).
    pub fn potential_energy(&self, gravity: DVec3) -> f64 {
        -self
            .masses
            .iter()
            .zip(&self.positions)
            .map(|(m, x)| m * gravity.dot(*x))
            .sum::<f64>()
    }

    /// Linear momentum `Σ m v`.
    pub fn total_momentum(&self) -> DVec3 {
        self.masses
            .iter()
            .zip(&self.velocities)
            .map(|(m, v)| *v * *m)
            .sum()
    }

    /// Mass-weighted centroid.
    pub fn center_of_mass(&self) -> DVec3 {
        let weighted: DVec3 = self.masses.iter().zip(&self.positions).map(|(m, x)| *x * *m).sum();
        weighted / self.total_mass()
    }

    /// Largest node speed.
    pub fn max_speed(&self) -> f64 {
        self.velocities
            .iter()
            .map(|v| v.length())
            .fold(0.0, f64::max)
    }

    /// Displacement of every node from its reference position.
    pub fn displacements(&self, mesh: &TetMesh) -> Vec<DVec3> {
        self.positions
            .iter()
            .enumerate()
            .map(|(i, x)| *x - mesh.position(i))
            .collect()
    }
}
