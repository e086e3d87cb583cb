//! Simulation event types.
//!
//! Events are small value types tagged with the integrator step they
//! were raised at.

use serde::{Deserialize, Serialize};

/// A simulation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Integrator step (0 before the first step).
    pub step: u64,
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    /// Integrator initialized and about to step.
    RunStarted {
        nodes: usize,
        elements: usize,
        dt: f64,
        duration: f64,
    },

    /// Lifecycle transition.
    StatusChanged { from: String, to: String },

    /// Periodic progress.
    Progress {
        /// Simulated time (s).
        time: f64,
        /// Percentage of the configured duration.
        progress_pct: f64,
        /// Wall-clock time since the run started (s).
        elapsed_time: f64,
    },

    /// Contact state changed.
    Contact {
        contact_count: u32,
        /// Normal force on the impact surface (N).
        ground_force: f64,
    },

    /// Energy balance.
    Energy {
        kinetic: f64,
        potential: f64,
        strain: f64,
    },

    /// Run ended.
    Finished {
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        peak_g: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl SimulationEvent {
    pub fn new(step: u64, kind: EventKind) -> Self {
        Self { step, kind }
    }

    /// Short label of the payload variant.
    pub fn label(&self) -> &'static str {
        match self.kind {
            EventKind::RunStarted { .. } => "run_started",
            EventKind::StatusChanged { .. } => "status_changed",
            EventKind::Progress { .. } => "progress",
            EventKind::Contact { .. } => "contact",
            EventKind::Energy { .. } => "energy",
            EventKind::Finished { .. } => "finished",
        }
    }
}
