//! # dropsim-types
//!
//! Shared types, identifiers, units, error types, and physical constants
//! for the dropsim drop-test solver.
//!
//! This crate has zero domain logic. It defines the vocabulary
//! that all other dropsim crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;
pub mod units;

pub use error::{DropError, DropResult};
pub use ids::{BodyId, ElementId, FaceId, MaterialId, NodeId};
pub use scalar::Scalar;
pub use units::{Length, LengthUnit};
