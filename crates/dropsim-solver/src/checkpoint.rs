//! Binary state checkpoints.

use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

use crate::state::SimulationState;

/// Format version written into every checkpoint.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Everything needed to resume a run on the same mesh and materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub state: SimulationState,
    /// True until the first leapfrog half step has been taken.
    pub first_step: bool,
    pub impact_speed: f64,
}

impl Checkpoint {
    pub fn new(state: SimulationState, first_step: bool, impact_speed: f64) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            state,
            first_step,
            impact_speed,
        }
    }

    /// Serializes with bincode.
    pub fn to_bytes(&self) -> DropResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| DropError::Serialization(e.to_string()))
    }

    /// Deserializes and checks the format version.
    pub fn from_bytes(bytes: &[u8]) -> DropResult<Self> {
        let checkpoint: Self =
            bincode::deserialize(bytes).map_err(|e| DropError::Serialization(e.to_string()))?;
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(DropError::Serialization(format!(
                "unsupported checkpoint version {} (expected {CHECKPOINT_VERSION})",
                checkpoint.version
            )));
        }
        Ok(checkpoint)
    }
}
