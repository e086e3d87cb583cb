//! Lumped (diagonal) mass matrix.

use dropsim_material::MaterialTable;
use dropsim_types::{DropError, DropResult};

use crate::element::ElementData;

/// Nodal masses: each element gives `ρ·V₀/4` to each of its nodes.
pub fn lumped_masses(node_count: usize, elements: &[ElementData], materials: &MaterialTable) -> DropResult<Vec<f64>> {
    let mut mass = vec![0.0; node_count];
    for (e, element) in elements.iter().enumerate() {
        let material = materials.get(element.material).ok_or_else(|| {
            DropError::InvalidMaterial(format!(
                "Element {e} uses material {} which is not in the table",
                element.material.0
            ))
        })?;
        let share = material.density() * element.volume / 4.0;
        for &n in &element.nodes {
            mass[n as usize] += share;
        }
    }
    Ok(mass)
}
