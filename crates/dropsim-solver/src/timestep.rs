//! Stable timestep estimate.
//!
//! For central differences the step must stay below the time a
//! dilatational wave needs to cross the smallest element:
//! `Δt_crit = min_e L_e / c_e` with `L_e` the inscribed-sphere
//! diameter and `c_e = sqrt(M_eff / ρ)`.

use dropsim_material::MaterialTable;
use dropsim_types::{DropError, DropResult};

use crate::element::ElementData;

/// Result of the critical timestep search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestepEstimate {
    /// Critical timestep (s).
    pub critical: f64,
    /// Element that sets it.
    pub controlling_element: u32,
}

/// Smallest per-element wave transit time.
pub fn critical_timestep(elements: &[ElementData], materials: &MaterialTable) -> DropResult<TimestepEstimate> {
    let mut best: Option<TimestepEstimate> = None;
    for (e, element) in elements.iter().enumerate() {
        let material = materials
            .get(element.material)
            .ok_or_else(|| DropError::InvalidMaterial(format!("Element {e} has an unknown material")))?;
        let dt = element.inscribed_diameter / material.wave_speed();
        if best.map_or(true, |b| dt < b.critical) {
            best = Some(TimestepEstimate {
                critical: dt,
                controlling_element: e as u32,
            });
        }
    }
    let estimate = best.ok_or_else(|| DropError::InvalidMesh("Mesh has no elements".into()))?;
    if !estimate.critical.is_finite() || estimate.critical <= 0.0 {
        return Err(DropError::InvalidMaterial(format!(
            "critical timestep is not positive ({:e})",
            estimate.critical
        )));
    }
    Ok(estimate)
}
