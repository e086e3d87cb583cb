//! Request validation.
//!
//! Everything that can be rejected before a mesh is touched is checked
//! by [`validate_request`]; [`validate_request_for_mesh`] adds the
//! checks that need the mesh (material ids, sensor nodes).

use std::collections::HashSet;

use dropsim_material::MaterialLibrary;
use dropsim_mesh::TetMesh;
use dropsim_types::{DropError, DropResult};

use crate::contract::SimulationRequest;

const MAX_DROP_HEIGHT: f64 = 100.0;
const MAX_GRAVITY: f64 = 100.0;
const MAX_DURATION: f64 = 10.0;

fn invalid(message: String) -> DropError {
    DropError::InvalidConfig(message)
}

/// Checks the ranges and internal consistency of a request.
pub fn validate_request(request: &SimulationRequest, library: &MaterialLibrary) -> DropResult<()> {
    let height = request.drop_spec.height.to_meters();
    if !height.is_finite() || !(0.0..=MAX_DROP_HEIGHT).contains(&height) {
        return Err(invalid(format!(
            "drop height must lie in [0, {MAX_DROP_HEIGHT}] m, got {height} m"
        )));
    }
    if !request.gravity.is_finite() || request.gravity <= 0.0 || request.gravity > MAX_GRAVITY {
        return Err(invalid(format!(
            "gravity must lie in (0, {MAX_GRAVITY}] m/s², got {}",
            request.gravity
        )));
    }

    let solver = request.solver_config();
    solver.validate()?;
    if solver.duration > MAX_DURATION {
        return Err(invalid(format!(
            "duration must not exceed {MAX_DURATION} s, got {}",
            solver.duration
        )));
    }
    if let Some(dt) = solver.timestep {
        if dt > solver.duration {
            return Err(invalid(format!(
                "timestep {dt} exceeds the duration {}",
                solver.duration
            )));
        }
    }

    if request.materials.is_empty() {
        return Err(DropError::InvalidMaterial("request defines no materials".into()));
    }
    request.material_table(library)?.validate()?;

    request.contact.validate()?;
    request.sampling.validate()?;

    let mut names = HashSet::new();
    for sensor in &request.sensors {
        if sensor.name().is_empty() {
            return Err(invalid("sensor names must not be empty".into()));
        }
        if !names.insert(sensor.name()) {
            return Err(invalid(format!("duplicate sensor name '{}'", sensor.name())));
        }
    }

    if let Some(t) = request
        .snapshot_times
        .iter()
        .find(|t| !t.is_finite() || **t < 0.0 || **t > solver.duration)
    {
        return Err(invalid(format!(
            "snapshot time {t} lies outside [0, {}]",
            solver.duration
        )));
    }
    Ok(())
}

/// [`validate_request`] plus the checks against the mesh it will run on.
pub fn validate_request_for_mesh(
    request: &SimulationRequest,
    mesh: &TetMesh,
    library: &MaterialLibrary,
) -> DropResult<()> {
    validate_request(request, library)?;
    mesh.validate()?;
    request.material_table(library)?.validate_assignments(&mesh.material_ids)?;
    for sensor in request.sensor_sets(mesh) {
        sensor.validate(mesh.node_count())?;
    }
    Ok(())
}
