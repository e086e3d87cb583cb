//! Resolution of a request against a mesh.

use std::sync::Arc;

use dropsim_contact::{ContactConfig, GroundPlane};
use dropsim_material::{MaterialLibrary, MaterialTable};
use dropsim_math::DVec3;
use dropsim_mesh::TetMesh;
use dropsim_results::{ResultRecorder, SamplingConfig, SensorSet};
use dropsim_solver::{Integrator, SolverConfig};
use dropsim_types::DropResult;

use crate::contract::SimulationRequest;
use crate::validator::validate_request_for_mesh;

/// A validated request with its body placed for the drop.
///
/// Mesh and materials are behind `Arc` so that several integrators
/// (a local run and a server run of the same job, say) can share them.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub name: String,
    /// Mesh rotated to the drop orientation, lowest node on the surface.
    pub mesh: Arc<TetMesh>,
    pub materials: Arc<MaterialTable>,
    pub solver: SolverConfig,
    pub contact: ContactConfig,
    pub ground: GroundPlane,
    pub initial_velocity: DVec3,
    pub impact_speed: f64,
    pub sensors: Vec<SensorSet>,
    pub sampling: SamplingConfig,
    pub snapshot_times: Vec<f64>,
}

impl PreparedRun {
    /// Validates `request` against `mesh` and places the body.
    pub fn prepare(request: &SimulationRequest, mesh: &TetMesh, library: &MaterialLibrary) -> DropResult<Self> {
        validate_request_for_mesh(request, mesh, library)?;
        let materials = request.material_table(library)?;
        let placed = request.drop_setup().place(mesh)?;
        let sensors = request.sensor_sets(&placed.mesh);

        tracing::info!(
            name = %request.name,
            height = request.drop_spec.height.to_meters(),
            orientation = request.drop_spec.orientation.name(),
            impact_speed = placed.impact_speed,
            "request prepared"
        );

        Ok(Self {
            name: request.name.clone(),
            mesh: Arc::new(placed.mesh),
            materials: Arc::new(materials),
            solver: request.solver_config(),
            contact: request.contact.clone(),
            ground: request.ground(),
            initial_velocity: placed.initial_velocity,
            impact_speed: placed.impact_speed,
            sensors,
            sampling: request.sampling.clone(),
            snapshot_times: request.snapshot_times.clone(),
        })
    }

    pub fn element_count(&self) -> usize {
        self.mesh.element_count()
    }

    /// A fresh, initialized integrator for this run.
    pub fn integrator(&self) -> DropResult<Integrator> {
        let mut integrator = Integrator::new(Arc::clone(&self.mesh), Arc::clone(&self.materials), self.solver.clone())
            .with_contact(self.contact.clone(), Some(self.ground));
        integrator.initialize(self.initial_velocity)?;
        Ok(integrator)
    }

    /// A recorder for this run's sensors, sampling and snapshot times.
    pub fn recorder(&self) -> DropResult<ResultRecorder> {
        Ok(ResultRecorder::new(self.sensors.clone(), self.sampling.clone())?
            .with_snapshot_times(self.snapshot_times.clone()))
    }
}
