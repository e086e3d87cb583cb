//! # dropsim-math
//!
//! Geometry and tensor kernels for the dropsim solver.
//!
//! Provides:
//! - Re-exports of `glam` double-precision types (`DVec3`, `DMat3`, `DQuat`)
//! - Symmetric 3×3 eigen-decomposition (cyclic Jacobi) for principal stretches
//! - Tetrahedron shape functions, volumes, and characteristic lengths
//! - Point-to-triangle projection for contact queries

pub mod eigen;
pub mod tensor;
pub mod tet;
pub mod triangle;

// Re-export glam types as the canonical math types for dropsim.
pub use glam::{DMat3, DQuat, DVec3};
