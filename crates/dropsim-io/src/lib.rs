//! # dropsim-io
//!
//! The I/O boundary of the solver: mesh codecs, the simulation request
//! contract, and validation of requests before anything is dispatched.
//!
//! ## Key Types
//!
//! - [`binary`] — `DSMESH` little-endian binary mesh format
//! - [`JsonMesh`] — JSON mesh interchange
//! - [`SimulationRequest`] — Drop test definition, loadable from TOML or JSON
//! - [`PreparedRun`] — Validated request resolved against a mesh, ready to run

pub mod binary;
pub mod contract;
pub mod json;
pub mod prepare;
pub mod validator;

pub use contract::{DropSpec, MaterialSpec, SensorSpec, SimulationRequest, SolverSpec};
pub use json::JsonMesh;
pub use prepare::PreparedRun;
pub use validator::{validate_request, validate_request_for_mesh};

use std::path::Path;

use dropsim_mesh::TetMesh;
use dropsim_types::DropResult;

/// Loads a mesh, choosing the codec from the file extension
/// (`.json` for JSON, anything else for the binary format).
pub fn load_mesh(path: &Path) -> DropResult<TetMesh> {
    let bytes = std::fs::read(path)?;
    let mesh = if has_extension(path, "json") {
        JsonMesh::from_slice(&bytes)?.to_mesh()?
    } else {
        binary::decode(&bytes)?
    };
    tracing::info!(
        path = %path.display(),
        nodes = mesh.node_count(),
        elements = mesh.element_count(),
        "mesh loaded"
    );
    Ok(mesh)
}

/// Saves a mesh with 0-based indices, codec chosen as in [`load_mesh`].
pub fn save_mesh(path: &Path, mesh: &TetMesh) -> DropResult<()> {
    let bytes = if has_extension(path, "json") {
        JsonMesh::from_mesh(mesh).to_vec()?
    } else {
        binary::encode(mesh, dropsim_mesh::IndexBase::Zero)
    };
    std::fs::write(path, bytes)?;
    Ok(())
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(ext))
}
