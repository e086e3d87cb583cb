//! # dropsim-solver
//!
//! Explicit time integration of a tetrahedral mesh under gravity and
//! penalty contact.
//!
//! ## Key Types
//!
//! - [`Integrator`] — Lifecycle state machine and the central-difference step
//! - [`SimulationState`] — Per-node buffers: positions, velocities,
//!   accelerations, forces, lumped masses
//! - [`SolverConfig`] — Duration, timestep policy, gravity, divergence limits
//! - [`ElementData`] — Precomputed reference data per tetrahedron
//! - [`StepObserver`] — Per-step hook used by result sampling and progress
//! - [`DropSetup`] — Places a body for a drop at a given orientation

pub mod checkpoint;
pub mod config;
pub mod element;
pub mod integrator;
pub mod mass;
pub mod observer;
pub mod setup;
pub mod state;
pub mod timestep;

pub use checkpoint::Checkpoint;
pub use config::SolverConfig;
pub use element::ElementData;
pub use integrator::{Integrator, IntegratorStatus, StepReport};
pub use observer::{Chain, NullObserver, StepControl, StepObserver, StepView};
pub use setup::{DropSetup, Orientation, PlacedBody};
pub use state::SimulationState;
pub use timestep::{critical_timestep, TimestepEstimate};
