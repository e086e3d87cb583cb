//! Ogden hyperfoam (compressible Ogden) law for cushion foams.
//!
//! Strain energy, summed over the terms `k`:
//!
//! ```text
//! W = Σ 2μ/α² · (λ1^α + λ2^α + λ3^α − 3 + (J^(−αβ) − 1)/β)
//! ```
//!
//! The principal Cauchy stresses follow as
//! `σ_i = (1/J) Σ (2μ/α)(λ_i^α − J^(−αβ))`, applied along the
//! eigenvectors of `B = F·Fᵀ`. `β = 0` gives a foam with zero lateral
//! expansion under uniaxial load, which is what low-density cushions
//! show in practice.

use dropsim_math::eigen::{symmetric_eigen, SymmetricEigen};
use dropsim_math::{DMat3, DVec3};
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

use crate::constitutive::ConstitutiveLaw;

/// One term of the Ogden series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OgdenTerm {
    /// Modulus coefficient μ (Pa).
    pub mu: f64,
    /// Stretch exponent α.
    pub alpha: f64,
    /// Compressibility β.
    pub beta: f64,
}

impl OgdenTerm {
    /// `J^(−αβ)`, the volumetric reference of this term.
    #[inline]
    fn volumetric(&self, j: f64) -> f64 {
        j.powf(-self.alpha * self.beta)
    }
}

/// N-term Ogden hyperfoam.
///
/// Coefficients are stored as parallel lists, the way test labs
/// tabulate fitted parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OgdenHyperfoam {
    /// μ_k (Pa).
    pub mu: Vec<f64>,
    /// α_k.
    pub alpha: Vec<f64>,
    /// β_k.
    pub beta: Vec<f64>,
    /// Mass density (kg/m³).
    pub density: f64,
}

impl OgdenHyperfoam {
    /// Single-term foam.
    pub fn single(mu: f64, alpha: f64, beta: f64, density: f64) -> Self {
        Self {
            mu: vec![mu],
            alpha: vec![alpha],
            beta: vec![beta],
            density,
        }
    }

    /// Iterates over the terms of the series.
    pub fn terms(&self) -> impl Iterator<Item = OgdenTerm> + '_ {
        self.mu
            .iter()
            .zip(&self.alpha)
            .zip(&self.beta)
            .map(|((&mu, &alpha), &beta)| OgdenTerm { mu, alpha, beta })
    }

    /// Initial shear modulus `Σ μ_k`.
    pub fn shear_modulus(&self) -> f64 {
        self.mu.iter().sum()
    }

    /// Axial stress of laterally confined compression to stretch
    /// `lambda`: `Σ (2μ/α)(λ^α − λ^(−αβ)) / λ`.
    ///
    /// Negative in compression. This is the curve a flat-drop cushion
    /// test traces, so it is useful for calibrating coefficients.
    pub fn uniaxial_strain_stress(&self, lambda: f64) -> f64 {
        self.terms()
            .map(|t| 2.0 * t.mu / t.alpha * (lambda.powf(t.alpha) - lambda.powf(-t.alpha * t.beta)))
            .sum::<f64>()
            / lambda
    }

    fn principal_stretches(f: &DMat3) -> (DVec3, SymmetricEigen) {
        let b = *f * f.transpose();
        let eig = symmetric_eigen(&b);
        let stretches = DVec3::new(
            eig.values.x.max(0.0).sqrt(),
            eig.values.y.max(0.0).sqrt(),
            eig.values.z.max(0.0).sqrt(),
        );
        (stretches, eig)
    }
}

impl ConstitutiveLaw for OgdenHyperfoam {
    fn cauchy_stress(&self, f: &DMat3, j: f64) -> DMat3 {
        let (lambda, eig) = Self::principal_stretches(f);
        let mut principal = DVec3::ZERO;
        for t in self.terms() {
            let c = 2.0 * t.mu / t.alpha;
            let vol = t.volumetric(j);
            principal += DVec3::new(
                c * (lambda.x.powf(t.alpha) - vol),
                c * (lambda.y.powf(t.alpha) - vol),
                c * (lambda.z.powf(t.alpha) - vol),
            );
        }
        eig.compose(principal / j)
    }

    fn strain_energy_density(&self, f: &DMat3, j: f64) -> f64 {
        let (lambda, _) = Self::principal_stretches(f);
        self.terms()
            .map(|t| {
                let stretch = lambda.x.powf(t.alpha) + lambda.y.powf(t.alpha) + lambda.z.powf(t.alpha) - 3.0;
                // β → 0 limit of (J^(−αβ) − 1)/β
                let volumetric = if t.beta == 0.0 {
                    -t.alpha * j.ln()
                } else {
                    (t.volumetric(j) - 1.0) / t.beta
                };
                2.0 * t.mu / (t.alpha * t.alpha) * (stretch + volumetric)
            })
            .sum()
    }

    /// `Σ 2μ_k(1 + β_k)`: bulk modulus `Σ 2μ(1/3 + β)` plus `4/3` of the
    /// shear modulus.
    fn effective_modulus(&self) -> f64 {
        self.terms().map(|t| 2.0 * t.mu * (1.0 + t.beta)).sum()
    }

    fn validate(&self) -> DropResult<()> {
        if self.mu.is_empty() {
            return Err(DropError::InvalidMaterial(
                "Ogden hyperfoam needs at least one term".into(),
            ));
        }
        if self.alpha.len() != self.mu.len() || self.beta.len() != self.mu.len() {
            return Err(DropError::InvalidMaterial(format!(
                "Ogden term lists differ in length (mu: {}, alpha: {}, beta: {})",
                self.mu.len(),
                self.alpha.len(),
                self.beta.len()
            )));
        }
        for (k, t) in self.terms().enumerate() {
            if !t.mu.is_finite() || t.mu == 0.0 {
                return Err(DropError::InvalidMaterial(format!(
                    "Ogden mu[{k}] must be finite and non-zero, got {}",
                    t.mu
                )));
            }
            if !t.alpha.is_finite() || t.alpha == 0.0 {
                return Err(DropError::InvalidMaterial(format!(
                    "Ogden alpha[{k}] must be finite and non-zero, got {}",
                    t.alpha
                )));
            }
            // Each term must stiffen, whatever the sign convention of the fit.
            if t.mu * t.alpha <= 0.0 {
                return Err(DropError::InvalidMaterial(format!(
                    "Ogden mu[{k}] and alpha[{k}] must share a sign, got {} and {}",
                    t.mu, t.alpha
                )));
            }
            if !t.beta.is_finite() || t.beta < 0.0 {
                return Err(DropError::InvalidMaterial(format!(
                    "Ogden beta[{k}] must be non-negative, got {}",
                    t.beta
                )));
            }
        }
        let shear = self.shear_modulus();
        if shear <= 0.0 {
            return Err(DropError::InvalidMaterial(format!(
                "Ogden initial shear modulus (sum of mu) must be positive, got {shear}"
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "ogden_hyperfoam"
    }
}
