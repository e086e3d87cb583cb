//! Material table indexed by `MaterialId`.

use dropsim_types::{DropError, DropResult, MaterialId};
use serde::{Deserialize, Serialize};

use crate::material::Material;

/// Materials of one simulation. Element material ids index into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialTable {
    materials: Vec<Material>,
}

impl MaterialTable {
    pub fn new(materials: Vec<Material>) -> Self {
        Self { materials }
    }

    /// Appends a material and returns its id.
    pub fn push(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len() as u16);
        self.materials.push(material);
        id
    }

    /// Looks up a material. Returns `None` for ids outside the table.
    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId(i as u16), m))
    }

    /// Validates every material's parameters.
    pub fn validate(&self) -> DropResult<()> {
        if self.materials.is_empty() {
            return Err(DropError::InvalidMaterial("Material table is empty".into()));
        }
        for (id, material) in self.iter() {
            material.validate().map_err(|e| match e {
                DropError::InvalidMaterial(msg) => {
                    DropError::InvalidMaterial(format!("material {}: {msg}", id.0))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Checks that every element's material id resolves in this table.
    pub fn validate_assignments(&self, material_ids: &[MaterialId]) -> DropResult<()> {
        if let Some((e, id)) = material_ids
            .iter()
            .enumerate()
            .find(|(_, id)| id.index() >= self.materials.len())
        {
            return Err(DropError::InvalidMaterial(format!(
                "Element {e} uses material {} but the table has {} entries",
                id.0,
                self.materials.len()
            )));
        }
        Ok(())
    }

    /// Smallest effective modulus among the materials actually used.
    /// Drives the automatic contact stiffness.
    pub fn softest_modulus(&self, material_ids: &[MaterialId]) -> Option<f64> {
        let mut used = vec![false; self.materials.len()];
        for id in material_ids {
            if let Some(flag) = used.get_mut(id.index()) {
                *flag = true;
            }
        }
        self.materials
            .iter()
            .zip(used)
            .filter(|(_, u)| *u)
            .map(|(m, _)| m.effective_modulus())
            .reduce(f64::min)
    }
}
