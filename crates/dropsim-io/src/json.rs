//! JSON mesh interchange.

use dropsim_mesh::{IndexBase, TetMesh};
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

/// JSON form of a mesh. `index_base` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonMesh {
    /// 0 or 1.
    pub index_base: u8,
    pub positions: Vec<[f64; 3]>,
    pub elements: Vec<[u32; 4]>,
    pub material_ids: Vec<u16>,
}

impl JsonMesh {
    /// 0-based JSON form of `mesh`.
    pub fn from_mesh(mesh: &TetMesh) -> Self {
        Self {
            index_base: 0,
            positions: (0..mesh.node_count()).map(|i| mesh.position(i).to_array()).collect(),
            elements: mesh.elements.clone(),
            material_ids: mesh.material_ids.iter().map(|m| m.0).collect(),
        }
    }

    /// Converts to a validated, 0-based mesh.
    pub fn to_mesh(&self) -> DropResult<TetMesh> {
        let base = IndexBase::from_u8(self.index_base)?;
        let positions: Vec<f64> = self.positions.iter().flatten().copied().collect();
        let connectivity: Vec<u32> = self.elements.iter().flatten().copied().collect();
        TetMesh::from_interleaved(&positions, &connectivity, &self.material_ids, base)
    }

    pub fn from_slice(bytes: &[u8]) -> DropResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| DropError::Serialization(e.to_string()))
    }

    pub fn parse(json: &str) -> DropResult<Self> {
        serde_json::from_str(json).map_err(|e| DropError::Serialization(e.to_string()))
    }

    pub fn to_vec(&self) -> DropResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| DropError::Serialization(e.to_string()))
    }
}
