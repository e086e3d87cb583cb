//! The closed set of material models.

use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

use crate::constitutive::ConstitutiveLaw;
use crate::crushable::CrushableFoam;
use crate::hyperfoam::OgdenHyperfoam;
use crate::linear::LinearElastic;

/// A material model with its parameters and density.
///
/// Serialized with a `model` tag:
///
/// ```
/// use dropsim_material::Material;
///
/// let json = r#"{"model":"linear_elastic","youngs_modulus":2e11,"poisson_ratio":0.3,"density":7850.0}"#;
/// let steel: Material = serde_json::from_str(json).unwrap();
/// assert_eq!(steel.density(), 7850.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Material {
    LinearElastic(LinearElastic),
    OgdenHyperfoam(OgdenHyperfoam),
    CrushableFoam(CrushableFoam),
}

impl Material {
    /// Shorthand for a linear elastic material.
    pub fn linear_elastic(youngs_modulus: f64, poisson_ratio: f64, density: f64) -> Self {
        Material::LinearElastic(LinearElastic::new(youngs_modulus, poisson_ratio, density))
    }

    /// Shorthand for a single-term Ogden hyperfoam.
    pub fn ogden(mu: f64, alpha: f64, beta: f64, density: f64) -> Self {
        Material::OgdenHyperfoam(OgdenHyperfoam::single(mu, alpha, beta, density))
    }

    /// Shorthand for a crushable foam with the default densification strain.
    pub fn crushable_foam(modulus: f64, plateau_stress: f64, density: f64) -> Self {
        Material::CrushableFoam(CrushableFoam::new(modulus, plateau_stress, density))
    }

    /// Mass density (kg/m³).
    pub fn density(&self) -> f64 {
        match self {
            Material::LinearElastic(m) => m.density,
            Material::OgdenHyperfoam(m) => m.density,
            Material::CrushableFoam(m) => m.density,
        }
    }

    fn law(&self) -> &dyn ConstitutiveLaw {
        match self {
            Material::LinearElastic(m) => m,
            Material::OgdenHyperfoam(m) => m,
            Material::CrushableFoam(m) => m,
        }
    }

    /// Name of the underlying law (`linear_elastic`, `ogden_hyperfoam`,
    /// `crushable_foam`).
    pub fn model_name(&self) -> &str {
        self.law().name()
    }

    /// Small-strain P-wave modulus (Pa).
    pub fn effective_modulus(&self) -> f64 {
        self.law().effective_modulus()
    }

    /// Dilatational wave speed `sqrt(M / ρ)` (m/s).
    pub fn wave_speed(&self) -> f64 {
        (self.effective_modulus() / self.density()).sqrt()
    }

    /// Rejects out-of-range parameters.
    pub fn validate(&self) -> DropResult<()> {
        let rho = self.density();
        if !rho.is_finite() || rho <= 0.0 {
            return Err(DropError::InvalidMaterial(format!(
                "density must be positive, got {rho}"
            )));
        }
        self.law().validate()
    }
}
