//! # dropsim-mesh
//!
//! Tetrahedral mesh representation with Structure-of-Arrays (SoA) node
//! storage. Nodes live in an index arena; elements reference them by
//! `u32` index, which maps directly onto GPU buffer offsets.
//!
//! ## Key Types
//!
//! - [`TetMesh`] — Reference node positions, 4-node elements, per-element
//!   material ids and per-node fixed (Dirichlet) flags.
//! - [`Topology`] — Boundary faces, node adjacency, and body (connected
//!   component) labels.
//! - [`SurfaceGeometry`] — Boundary face areas/normals and nodal
//!   tributary areas used by contact.
//! - Structured generators for benchmark meshes (boxes, layered cushions).

pub mod generators;
pub mod mesh;
pub mod surface;
pub mod topology;

pub use mesh::{IndexBase, TetMesh};
pub use surface::SurfaceGeometry;
pub use topology::{BoundaryFace, Topology};
