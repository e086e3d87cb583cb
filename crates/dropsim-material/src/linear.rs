//! Small-strain isotropic linear elasticity.

use dropsim_math::tensor::{ddot, symmetric_part, trace};
use dropsim_math::DMat3;
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

use crate::constitutive::ConstitutiveLaw;

/// Hookean solid with engineering strain `ε = sym(F) − I`.
///
/// Adequate for metals and rigid plastics, whose strains in a drop stay
/// small. Not rotation invariant, so keep it away from tumbling parts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearElastic {
    /// Young's modulus (Pa).
    pub youngs_modulus: f64,
    /// Poisson's ratio, in (-1, 0.5).
    pub poisson_ratio: f64,
    /// Mass density (kg/m³).
    pub density: f64,
}

impl LinearElastic {
    pub fn new(youngs_modulus: f64, poisson_ratio: f64, density: f64) -> Self {
        Self {
            youngs_modulus,
            poisson_ratio,
            density,
        }
    }

    /// Lamé parameters `(λ, μ)`.
    pub fn lame(&self) -> (f64, f64) {
        let e = self.youngs_modulus;
        let nu = self.poisson_ratio;
        let lambda = e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu));
        let mu = e / (2.0 * (1.0 + nu));
        (lambda, mu)
    }

    fn strain(f: &DMat3) -> DMat3 {
        symmetric_part(f) - DMat3::IDENTITY
    }
}

impl ConstitutiveLaw for LinearElastic {
    fn cauchy_stress(&self, f: &DMat3, _j: f64) -> DMat3 {
        let (lambda, mu) = self.lame();
        let eps = Self::strain(f);
        DMat3::IDENTITY * (lambda * trace(&eps)) + eps * (2.0 * mu)
    }

    fn strain_energy_density(&self, f: &DMat3, _j: f64) -> f64 {
        let (lambda, mu) = self.lame();
        let eps = Self::strain(f);
        0.5 * lambda * trace(&eps).powi(2) + mu * ddot(&eps, &eps)
    }

    fn effective_modulus(&self) -> f64 {
        let e = self.youngs_modulus;
        let nu = self.poisson_ratio;
        e * (1.0 - nu) / ((1.0 + nu) * (1.0 - 2.0 * nu))
    }

    fn validate(&self) -> DropResult<()> {
        if !self.youngs_modulus.is_finite() || self.youngs_modulus <= 0.0 {
            return Err(DropError::InvalidMaterial(format!(
                "Young's modulus must be positive, got {}",
                self.youngs_modulus
            )));
        }
        let nu = self.poisson_ratio;
        if !nu.is_finite() || nu < 0.0 || nu >= 0.5 {
            return Err(DropError::InvalidMaterial(format!(
                "Poisson's ratio must lie in [0, 0.5), got {}",
                self.poisson_ratio
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "linear_elastic"
    }
}
