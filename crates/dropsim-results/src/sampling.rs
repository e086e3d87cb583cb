//! Sampling configuration.

use dropsim_types::constants::DEFAULT_SAMPLE_INTERVAL;
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

/// When a sensor sample is taken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Every `n` integrator steps.
    EverySteps(u64),
    /// Every `interval` seconds of simulated time.
    Interval(f64),
}

/// Sensor sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub cadence: Cadence,
    /// Report the mean acceleration over each sampling window (`Δv/Δt`
    /// of the sensor centre of gravity) instead of the instantaneous
    /// value at the window end. This is the digital counterpart of an
    /// accelerometer's anti-alias filter.
    pub averaging: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            cadence: Cadence::Interval(DEFAULT_SAMPLE_INTERVAL),
            averaging: true,
        }
    }
}

impl SamplingConfig {
    /// One sample per step, no averaging.
    pub fn raw() -> Self {
        Self {
            cadence: Cadence::EverySteps(1),
            averaging: false,
        }
    }

    pub fn validate(&self) -> DropResult<()> {
        match self.cadence {
            Cadence::EverySteps(0) => Err(DropError::InvalidConfig(
                "sampling every 0 steps is not allowed".into(),
            )),
            Cadence::Interval(s) if !s.is_finite() || s <= 0.0 => Err(DropError::InvalidConfig(format!(
                "sampling interval must be positive, got {s}"
            ))),
            _ => Ok(()),
        }
    }
}
