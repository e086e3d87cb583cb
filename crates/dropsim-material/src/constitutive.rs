//! Constitutive law trait and the stress entry points used by the solver.
//!
//! Every law maps a deformation gradient `F` with `J = det F > 0` to a
//! Cauchy stress. Inversion and non-finite output are caught here, once,
//! so individual laws can assume a valid `J`.

use dropsim_math::tensor::is_finite_mat;
use dropsim_math::DMat3;
use dropsim_types::{DropError, DropResult};

use crate::material::Material;

/// Behaviour shared by all constitutive laws.
///
/// Implementations are pure: no history, no allocation.
pub trait ConstitutiveLaw: Send + Sync {
    /// Cauchy stress for deformation gradient `f` with `j = det f > 0`.
    fn cauchy_stress(&self, f: &DMat3, j: f64) -> DMat3;

    /// Strain energy per unit reference volume.
    fn strain_energy_density(&self, f: &DMat3, j: f64) -> f64;

    /// Small-strain P-wave (constrained) modulus. Governs the dilatational
    /// wave speed and therefore the stable timestep.
    fn effective_modulus(&self) -> f64;

    /// Rejects out-of-range parameters with `InvalidMaterial`.
    fn validate(&self) -> DropResult<()>;

    /// Returns the name of this law.
    fn name(&self) -> &str;
}

/// Cauchy stress of `material` at deformation gradient `f`.
///
/// # Errors
/// `MaterialFailure` when the element is inverted (`J ≤ 0`) or the
/// law produces a non-finite stress.
pub fn cauchy_stress(material: &Material, f: &DMat3) -> DropResult<DMat3> {
    let j = checked_jacobian(f)?;
    let sigma = match material {
        Material::LinearElastic(law) => law.cauchy_stress(f, j),
        Material::OgdenHyperfoam(law) => law.cauchy_stress(f, j),
        Material::CrushableFoam(law) => law.cauchy_stress(f, j),
    };
    if !is_finite_mat(&sigma) {
        return Err(DropError::material_failure(format!(
            "{} law produced a non-finite stress (J = {j:.6})",
            material.model_name()
        )));
    }
    Ok(sigma)
}

/// Strain energy per unit reference volume of `material` at `f`.
pub fn strain_energy_density(material: &Material, f: &DMat3) -> DropResult<f64> {
    let j = checked_jacobian(f)?;
    let w = match material {
        Material::LinearElastic(law) => law.strain_energy_density(f, j),
        Material::OgdenHyperfoam(law) => law.strain_energy_density(f, j),
        Material::CrushableFoam(law) => law.strain_energy_density(f, j),
    };
    if w.is_finite() {
        Ok(w)
    } else {
        Err(DropError::material_failure(format!(
            "{} law produced a non-finite strain energy",
            material.model_name()
        )))
    }
}

fn checked_jacobian(f: &DMat3) -> DropResult<f64> {
    let j = f.determinant();
    if j.is_nan() || j <= 0.0 {
        return Err(DropError::material_failure(format!(
            "inverted element (J = {j:.6e})"
        )));
    }
    if !j.is_finite() {
        return Err(DropError::material_failure("non-finite deformation gradient"));
    }
    Ok(j)
}
