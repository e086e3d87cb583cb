//! Solver configuration.
//!
//! Parameters that control the explicit integrator: run length,
//! timestep policy, body force and blow-up detection.

use dropsim_compute::Backend;
use dropsim_math::DVec3;
use dropsim_types::constants::{DEFAULT_DIVERGENCE_FACTOR, DEFAULT_TIMESTEP_SAFETY, STANDARD_GRAVITY};
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

/// Configuration for the explicit integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Simulated time span (s).
    pub duration: f64,

    /// Fixed timestep (s). `None` uses `timestep_safety × Δt_crit`.
    /// A value above the critical step is accepted with a warning.
    pub timestep: Option<f64>,

    /// Fraction of the critical timestep used when `timestep` is unset.
    pub timestep_safety: f64,

    /// Gravity vector (m/s²). Y is up.
    pub gravity: DVec3,

    /// A node faster than `divergence_factor × max(impact speed, 1 m/s)`
    /// marks the run as diverged.
    pub divergence_factor: f64,

    /// Execution strategy for the element loop.
    pub backend: Backend,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            duration: 0.05,
            timestep: None,
            timestep_safety: DEFAULT_TIMESTEP_SAFETY,
            gravity: DVec3::new(0.0, -STANDARD_GRAVITY, 0.0),
            divergence_factor: DEFAULT_DIVERGENCE_FACTOR,
            backend: Backend::Scalar,
        }
    }
}

impl SolverConfig {
    /// Creates a config for debugging (short run, coarse step).
    pub fn debug() -> Self {
        Self {
            duration: 0.005,
            timestep_safety: 0.5,
            ..Default::default()
        }
    }

    /// Creates a high-fidelity config (small step for stiff, late-impact foam).
    pub fn high_fidelity() -> Self {
        Self {
            duration: 0.1,
            timestep_safety: 0.1,
            ..Default::default()
        }
    }

    /// Builder: set the simulated duration.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Builder: fix the timestep.
    pub fn with_timestep(mut self, dt: f64) -> Self {
        self.timestep = Some(dt);
        self
    }

    /// Builder: select the execution backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DropResult<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(DropError::InvalidConfig(format!(
                "duration must be positive, got {}",
                self.duration
            )));
        }
        if let Some(dt) = self.timestep {
            if !dt.is_finite() || dt <= 0.0 {
                return Err(DropError::InvalidConfig(format!(
                    "timestep must be positive, got {dt}"
                )));
            }
        }
        if !self.timestep_safety.is_finite() || self.timestep_safety <= 0.0 || self.timestep_safety > 1.0 {
            return Err(DropError::InvalidConfig(format!(
                "timestep_safety must lie in (0, 1], got {}",
                self.timestep_safety
            )));
        }
        if !self.gravity.is_finite() {
            return Err(DropError::InvalidConfig("gravity must be finite".into()));
        }
        if !self.divergence_factor.is_finite() || self.divergence_factor <= 1.0 {
            return Err(DropError::InvalidConfig(format!(
                "divergence_factor must exceed 1, got {}",
                self.divergence_factor
            )));
        }
        Ok(())
    }
}
