//! Simulation request contract.
//!
//! A request describes one drop test: height and orientation, impact
//! surface, materials, solver and contact settings, and which results
//! to record. It is what the CLI reads from a TOML file and what the
//! job queue receives as JSON.

use std::path::Path;

use dropsim_compute::Backend;
use dropsim_contact::{ContactConfig, GroundPlane, SurfaceType};
use dropsim_material::{Material, MaterialLibrary, MaterialTable};
use dropsim_math::DVec3;
use dropsim_mesh::TetMesh;
use dropsim_results::{SamplingConfig, SensorSet};
use dropsim_solver::{DropSetup, Orientation, SolverConfig};
use dropsim_types::constants::STANDARD_GRAVITY;
use dropsim_types::{DropError, DropResult, Length, MaterialId};
use serde::{Deserialize, Serialize};

/// Drop geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropSpec {
    /// Height of the lowest point above the surface.
    pub height: Length,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub surface: SurfaceType,
}

/// A material either by preset name or given in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialSpec {
    Preset { preset: String },
    Model(Material),
}

impl MaterialSpec {
    pub fn resolve(&self, library: &MaterialLibrary) -> DropResult<Material> {
        match self {
            MaterialSpec::Preset { preset } => library.get(preset).cloned().ok_or_else(|| {
                DropError::InvalidMaterial(format!(
                    "unknown preset '{preset}' (available: {})",
                    library.names().join(", ")
                ))
            }),
            MaterialSpec::Model(material) => Ok(material.clone()),
        }
    }
}

/// Sensor node set definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorSpec {
    WholeBody { name: String },
    Material { name: String, material: u16 },
    Nodes { name: String, nodes: Vec<u32> },
}

impl SensorSpec {
    pub fn name(&self) -> &str {
        match self {
            SensorSpec::WholeBody { name } | SensorSpec::Material { name, .. } | SensorSpec::Nodes { name, .. } => {
                name
            }
        }
    }

    pub fn resolve(&self, mesh: &TetMesh) -> SensorSet {
        match self {
            SensorSpec::WholeBody { name } => SensorSet::new(name.clone(), (0..mesh.node_count() as u32).collect()),
            SensorSpec::Material { name, material } => {
                SensorSet::from_material(name.clone(), mesh, MaterialId(*material))
            }
            SensorSpec::Nodes { name, nodes } => SensorSet::new(name.clone(), nodes.clone()),
        }
    }
}

/// Integrator settings of a request. Gravity comes from the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSpec {
    pub duration: f64,
    pub timestep: Option<f64>,
    pub timestep_safety: f64,
    pub divergence_factor: f64,
    pub backend: Backend,
}

impl Default for SolverSpec {
    fn default() -> Self {
        let config = SolverConfig::default();
        Self {
            duration: config.duration,
            timestep: config.timestep,
            timestep_safety: config.timestep_safety,
            divergence_factor: config.divergence_factor,
            backend: config.backend,
        }
    }
}

impl SolverSpec {
    pub fn to_config(&self, gravity: f64) -> SolverConfig {
        SolverConfig {
            duration: self.duration,
            timestep: self.timestep,
            timestep_safety: self.timestep_safety,
            gravity: DVec3::new(0.0, -gravity, 0.0),
            divergence_factor: self.divergence_factor,
            backend: self.backend,
        }
    }
}

fn default_gravity() -> f64 {
    STANDARD_GRAVITY
}

/// Complete definition of one drop simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "drop")]
    pub drop_spec: DropSpec,
    /// Gravitational acceleration magnitude (m/s²).
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    /// Material table; `MaterialId(i)` in the mesh refers to entry `i`.
    pub materials: Vec<MaterialSpec>,
    #[serde(default)]
    pub solver: SolverSpec,
    #[serde(default)]
    pub contact: ContactConfig,
    /// Defaults to one whole-body sensor.
    #[serde(default)]
    pub sensors: Vec<SensorSpec>,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub snapshot_times: Vec<f64>,
}

impl SimulationRequest {
    /// A request with defaults for everything but the drop and materials.
    pub fn new(drop_spec: DropSpec, materials: Vec<MaterialSpec>) -> Self {
        Self {
            name: String::new(),
            drop_spec,
            gravity: STANDARD_GRAVITY,
            materials,
            solver: SolverSpec::default(),
            contact: ContactConfig::default(),
            sensors: Vec::new(),
            sampling: SamplingConfig::default(),
            snapshot_times: Vec::new(),
        }
    }

    pub fn from_toml_str(text: &str) -> DropResult<Self> {
        toml::from_str(text).map_err(|e| DropError::Serialization(e.to_string()))
    }

    pub fn from_json_str(text: &str) -> DropResult<Self> {
        serde_json::from_str(text).map_err(|e| DropError::Serialization(e.to_string()))
    }

    /// Loads from `.toml` or `.json`.
    pub fn load(path: &Path) -> DropResult<Self> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(DropError::InvalidConfig(format!(
                "unsupported request format: {} (use .toml or .json)",
                path.display()
            ))),
        }
    }

    pub fn to_toml(&self) -> DropResult<String> {
        toml::to_string_pretty(self).map_err(|e| DropError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> DropResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DropError::Serialization(e.to_string()))
    }

    /// Resolves presets into a material table.
    pub fn material_table(&self, library: &MaterialLibrary) -> DropResult<MaterialTable> {
        let materials = self
            .materials
            .iter()
            .map(|m| m.resolve(library))
            .collect::<DropResult<Vec<_>>>()?;
        Ok(MaterialTable::new(materials))
    }

    pub fn drop_setup(&self) -> DropSetup {
        DropSetup {
            height: self.drop_spec.height.to_meters(),
            orientation: self.drop_spec.orientation,
            gravity: self.gravity,
            surface_height: 0.0,
        }
    }

    pub fn solver_config(&self) -> SolverConfig {
        self.solver.to_config(self.gravity)
    }

    pub fn ground(&self) -> GroundPlane {
        GroundPlane::new(self.drop_spec.surface)
    }

    /// Sensor sets on `mesh`; a single whole-body set when none are given.
    pub fn sensor_sets(&self, mesh: &TetMesh) -> Vec<SensorSet> {
        if self.sensors.is_empty() {
            vec![SensorSet::whole_body(mesh)]
        } else {
            self.sensors.iter().map(|s| s.resolve(mesh)).collect()
        }
    }
}
