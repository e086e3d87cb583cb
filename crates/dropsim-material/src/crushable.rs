//! Crushable foam: elastic ramp, stress plateau, densification.
//!
//! Applied independently along each principal direction of `B = F·Fᵀ`.
//! With `ε = 1 − λ` the compressive nominal strain and `ε_y = ψ/k` the
//! yield strain, the compressive nominal stress is
//!
//! ```text
//! s(ε) = k·ε                              ε ≤ ε_y
//!      = ψ                                ε_y < ε ≤ ε_D
//!      = ψ + k·(ε − ε_D)/(1 − ε)          ε > ε_D
//! ```
//!
//! and tension is linear with modulus `k`. The law is elastic: unloading
//! retraces the curve, so crushed cells rebound. The densification
//! branch stiffens without bound as the cells close, which keeps
//! elements from inverting.

use dropsim_math::eigen::symmetric_eigen;
use dropsim_math::{DMat3, DVec3};
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

use crate::constitutive::ConstitutiveLaw;

fn default_densification_strain() -> f64 {
    0.8
}

/// Piecewise crushable foam (EPS, PE bead, honeycomb-like cores).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrushableFoam {
    /// Initial (elastic) compressive modulus k (Pa).
    pub modulus: f64,
    /// Plateau stress ψ_t (Pa).
    pub plateau_stress: f64,
    /// Nominal strain at which the cells are fully crushed.
    #[serde(default = "default_densification_strain")]
    pub densification_strain: f64,
    /// Mass density (kg/m³).
    pub density: f64,
}

impl CrushableFoam {
    pub fn new(modulus: f64, plateau_stress: f64, density: f64) -> Self {
        Self {
            modulus,
            plateau_stress,
            densification_strain: default_densification_strain(),
            density,
        }
    }

    /// Builder: set the densification strain.
    pub fn with_densification_strain(mut self, strain: f64) -> Self {
        self.densification_strain = strain;
        self
    }

    /// Strain at which the plateau begins.
    #[inline]
    pub fn yield_strain(&self) -> f64 {
        self.plateau_stress / self.modulus
    }

    /// Compressive nominal stress at compressive nominal strain `eps`
    /// (both positive in compression).
    pub fn compressive_stress(&self, eps: f64) -> f64 {
        let k = self.modulus;
        let ey = self.yield_strain();
        let ed = self.densification_strain;
        if eps <= ey {
            k * eps
        } else if eps <= ed {
            self.plateau_stress
        } else {
            self.plateau_stress + k * (eps - ed) / (1.0 - eps)
        }
    }

    /// Energy absorbed per unit volume up to compressive strain `eps`.
    pub fn compressive_energy(&self, eps: f64) -> f64 {
        let k = self.modulus;
        let ey = self.yield_strain();
        let ed = self.densification_strain;
        if eps <= ey {
            return 0.5 * k * eps * eps;
        }
        let ramp = 0.5 * k * ey * ey;
        if eps <= ed {
            return ramp + self.plateau_stress * (eps - ey);
        }
        let plateau = self.plateau_stress * (eps - ey);
        // ∫ k(u − ε_D)/(1 − u) du from ε_D
        let densify = k * (-(eps - ed) - (1.0 - ed) * ((1.0 - eps) / (1.0 - ed)).ln());
        ramp + plateau + densify
    }
}

impl ConstitutiveLaw for CrushableFoam {
    fn cauchy_stress(&self, f: &DMat3, j: f64) -> DMat3 {
        let eig = symmetric_eigen(&(*f * f.transpose()));
        let principal = |value: f64| {
            let lambda = value.max(0.0).sqrt();
            // Nominal stress along the direction, tension positive;
            // Kirchhoff τ = s·λ, Cauchy = τ/J.
            -self.compressive_stress(1.0 - lambda) * lambda / j
        };
        eig.compose(DVec3::new(
            principal(eig.values.x),
            principal(eig.values.y),
            principal(eig.values.z),
        ))
    }

    fn strain_energy_density(&self, f: &DMat3, _j: f64) -> f64 {
        let eig = symmetric_eigen(&(*f * f.transpose()));
        [eig.values.x, eig.values.y, eig.values.z]
            .into_iter()
            .map(|value| self.compressive_energy(1.0 - value.max(0.0).sqrt()))
            .sum()
    }

    fn effective_modulus(&self) -> f64 {
        self.modulus
    }

    fn validate(&self) -> DropResult<()> {
        if !self.modulus.is_finite() || self.modulus <= 0.0 {
            return Err(DropError::InvalidMaterial(format!(
                "Crushable foam modulus must be positive, got {}",
                self.modulus
            )));
        }
        if !self.plateau_stress.is_finite() || self.plateau_stress <= 0.0 {
            return Err(DropError::InvalidMaterial(format!(
                "Crushable foam plateau stress must be positive, got {}",
                self.plateau_stress
            )));
        }
        let ed = self.densification_strain;
        if !ed.is_finite() || ed <= 0.0 || ed >= 1.0 {
            return Err(DropError::InvalidMaterial(format!(
                "Densification strain must lie in (0, 1), got {ed}"
            )));
        }
        if self.yield_strain() >= ed {
            return Err(DropError::InvalidMaterial(format!(
                "Plateau onset strain {:.4} must be below the densification strain {ed}",
                self.yield_strain()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "crushable_foam"
    }
}
