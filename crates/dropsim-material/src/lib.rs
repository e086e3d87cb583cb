//! # dropsim-material
//!
//! Constitutive laws and the material table.
//!
//! ## Design
//!
//! [`Material`] is a closed sum type. The stress function
//! [`cauchy_stress`] matches on it and forwards to the law-specific
//! [`ConstitutiveLaw`] implementation, so every law is statically
//! dispatched inside the element loop and a new law is a compile error
//! everywhere it is not handled.
//!
//! The [`MaterialLibrary`] stores named presets for common packaging
//! and product materials. Custom materials can be registered at runtime.

pub mod constitutive;
pub mod crushable;
pub mod hyperfoam;
pub mod library;
pub mod linear;
pub mod material;
pub mod table;

pub use constitutive::{cauchy_stress, strain_energy_density, ConstitutiveLaw};
pub use crushable::CrushableFoam;
pub use hyperfoam::{OgdenHyperfoam, OgdenTerm};
pub use library::MaterialLibrary;
pub use linear::LinearElastic;
pub use material::Material;
pub use table::MaterialTable;
