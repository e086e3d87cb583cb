//! Preset library of product and packaging materials.
//!
//! Values are typical handbook figures, good enough for a first
//! drop study before lab-fitted coefficients are available.

use std::collections::HashMap;

use dropsim_types::constants::PASCALS_PER_PSI;

use crate::hyperfoam::OgdenHyperfoam;
use crate::material::Material;

/// A named collection of material presets.
///
/// Materials are looked up by name (e.g., "steel", "pe_foam").
/// Custom materials can be registered at runtime.
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    materials: HashMap<String, Material>,
}

impl MaterialLibrary {
    /// Creates a library with the built-in presets.
    pub fn with_defaults() -> Self {
        let mut lib = Self::empty();

        lib.register("steel", Material::linear_elastic(2.0e11, 0.3, 7850.0));
        lib.register("aluminium", Material::linear_elastic(6.9e10, 0.33, 2700.0));
        lib.register("abs", Material::linear_elastic(2.3e9, 0.35, 1050.0));
        lib.register("corrugated_board", Material::linear_elastic(5.0e8, 0.3, 150.0));
        lib.register("eps_foam", Material::crushable_foam(5.0e6, 1.2e5, 25.0));
        lib.register("pe_foam", pe_foam());
        lib.register("pu_foam", pu_foam());

        lib
    }

    /// Creates an empty library.
    pub fn empty() -> Self {
        Self {
            materials: HashMap::new(),
        }
    }

    /// Registers a material. Overwrites if the name already exists.
    pub fn register(&mut self, name: impl Into<String>, material: Material) {
        self.materials.insert(name.into(), material);
    }

    /// Looks up a material by name. Returns `None` if not found.
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Returns all registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.materials.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ─── Built-in Foam Presets ────────────────────────────────────────────

/// 2 lb/ft³ polyethylene cushion foam, single Ogden term fitted to
/// flat-drop cushion curves (μ = 15 psi, α = 3.5, no lateral expansion).
fn pe_foam() -> Material {
    Material::ogden(15.0 * PASCALS_PER_PSI, 3.5, 0.0, 32.0)
}

/// Flexible polyurethane foam. Two terms: a soft one for the plateau
/// and a stiff one for densification.
fn pu_foam() -> Material {
    Material::OgdenHyperfoam(OgdenHyperfoam {
        mu: vec![1.2e4, 3.0e3],
        alpha: vec![4.0, 8.0],
        beta: vec![0.0, 0.0],
        density: 40.0,
    })
}
