//! Full-field snapshots.
//!
//! A snapshot is serialized with bincode when it is captured and only
//! the bytes are kept, so serving it again never re-encodes.

use dropsim_material::MaterialTable;
use dropsim_math::tensor::{to_voigt, von_mises};
use dropsim_math::DVec3;
use dropsim_mesh::TetMesh;
use dropsim_solver::{ElementData, SimulationState};
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

/// Displacement and stress fields at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub step: u64,
    pub time: f64,
    /// Per-node displacement from the reference configuration.
    pub displacements: Vec<DVec3>,
    /// Per-element Cauchy stress in Voigt order (xx, yy, zz, yz, xz, xy).
    pub stress: Vec<[f64; 6]>,
    /// Per-element von Mises stress.
    pub von_mises: Vec<f64>,
}

impl FieldSnapshot {
    /// Evaluates the fields at the current state.
    pub fn capture(
        state: &SimulationState,
        mesh: &TetMesh,
        elements: &[ElementData],
        materials: &MaterialTable,
    ) -> DropResult<Self> {
        let mut stress = Vec::with_capacity(elements.len());
        let mut von_mises_stress = Vec::with_capacity(elements.len());
        for (e, element) in elements.iter().enumerate() {
            let material = materials
                .get(element.material)
                .ok_or_else(|| DropError::InvalidMaterial(format!("Element {e} has an unknown material")))?;
            let sigma = element
                .stress(&state.positions, material)
                .map_err(|err| err.at_element(e as u32))?;
            stress.push(to_voigt(&sigma));
            von_mises_stress.push(von_mises(&sigma));
        }

        Ok(Self {
            step: state.step,
            time: state.time,
            displacements: state.displacements(mesh),
            stress,
            von_mises: von_mises_stress,
        })
    }

    /// Largest von Mises stress and its element.
    pub fn max_von_mises(&self) -> Option<(usize, f64)> {
        self.von_mises
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (e, s)| match best {
                Some((_, b)) if b >= s => best,
                _ => Some((e, s)),
            })
    }

    /// Largest displacement magnitude.
    pub fn max_displacement(&self) -> f64 {
        self.displacements.iter().map(|u| u.length()).fold(0.0, f64::max)
    }
}

/// Index entry of a cached snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub index: usize,
    pub step: u64,
    pub time: f64,
    /// Encoded size in bytes.
    pub bytes: usize,
}

#[derive(Debug, Clone)]
struct CachedSnapshot {
    info: SnapshotInfo,
    bytes: Vec<u8>,
}

/// Snapshots of one run, held as encoded bytes.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    entries: Vec<CachedSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes and stores `snapshot`. Returns its index.
    pub fn insert(&mut self, snapshot: &FieldSnapshot) -> DropResult<usize> {
        let bytes = bincode::serialize(snapshot).map_err(|e| DropError::Serialization(e.to_string()))?;
        let index = self.entries.len();
        self.entries.push(CachedSnapshot {
            info: SnapshotInfo {
                index,
                step: snapshot.step,
                time: snapshot.time,
                bytes: bytes.len(),
            },
            bytes,
        });
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> Vec<SnapshotInfo> {
        self.entries.iter().map(|e| e.info).collect()
    }

    /// Cached encoding of snapshot `index`.
    pub fn bytes(&self, index: usize) -> Option<&[u8]> {
        self.entries.get(index).map(|e| e.bytes.as_slice())
    }

    /// Decodes snapshot `index`.
    pub fn get(&self, index: usize) -> DropResult<FieldSnapshot> {
        let bytes = self
            .bytes(index)
            .ok_or_else(|| DropError::InvalidConfig(format!("no snapshot with index {index}")))?;
        bincode::deserialize(bytes).map_err(|e| DropError::Serialization(e.to_string()))
    }

    /// Snapshot closest to `time`.
    pub fn nearest(&self, time: f64) -> Option<SnapshotInfo> {
        self.entries
            .iter()
            .map(|e| e.info)
            .min_by(|a, b| (a.time - time).abs().total_cmp(&(b.time - time).abs()))
    }
}
