//! # dropsim-results
//!
//! Turns a running simulation into the numbers a packaging engineer
//! reads: acceleration time histories at sensor node sets, the peak G,
//! and full-field snapshots.
//!
//! ## Key Types
//!
//! - [`SensorSet`] — Named node set read as one mass-weighted accelerometer
//! - [`SamplingConfig`] — Sampling cadence and window averaging
//! - [`ResultRecorder`] — [`StepObserver`](dropsim_solver::StepObserver)
//!   that records series and snapshots while the integrator runs
//! - [`ResultsArtifact`] / [`Summary`] — JSON output of a run

pub mod artifact;
pub mod recorder;
pub mod sampling;
pub mod sensor;
pub mod series;
pub mod snapshot;

pub use artifact::{ResultsArtifact, SensorSummary, Summary};
pub use recorder::ResultRecorder;
pub use sampling::{Cadence, SamplingConfig};
pub use sensor::SensorSet;
pub use series::{PeakG, TimeSeries};
pub use snapshot::{FieldSnapshot, SnapshotInfo, SnapshotStore};
