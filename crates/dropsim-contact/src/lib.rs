//! # dropsim-contact
//!
//! Contact detection and penalty response for drop simulation.
//!
//! The contact pipeline is split into three phases:
//! 1. **Broad phase** — Spatial hash over boundary nodes, rebuilt every
//!    few steps
//! 2. **Narrow phase** — Signed node-to-face distance, inside-triangle
//!    test, deepest face per node and body
//! 3. **Contact response** — Hertzian penalty pressure, optional damping
//!    and regularized Coulomb friction
//!
//! The impact surface is an analytic plane handled beside the pipeline.
//! Each phase is a pluggable trait with a null implementation for
//! scenarios that do not need it.
//!
//! The crate works on plain position/velocity/force slices and knows
//! nothing about the integrator that owns them.

pub mod broad;
pub mod config;
pub mod contact;
pub mod ground;
pub mod narrow;
pub mod pipeline;
pub mod response;
pub mod spatial_hash;
pub mod surface_type;

pub use broad::{BroadPhase, BruteForce, CandidatePair};
pub use config::{auto_stiffness, ContactConfig};
pub use contact::{ContactPair, ContactSurface};
pub use ground::GroundPlane;
pub use narrow::{NarrowPhase, NodeFaceTest};
pub use pipeline::{ContactPipeline, ContactStepResult};
pub use response::{ContactResponse, ContactResult, HertzPenalty};
pub use spatial_hash::SpatialHash;
pub use surface_type::SurfaceType;
