//! Results artifact and summary.

use std::path::Path;

use dropsim_solver::IntegratorStatus;
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

use crate::series::{PeakG, TimeSeries};
use crate::snapshot::SnapshotInfo;

/// Headline numbers of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub peak_g: f64,
    pub peak_g_time: f64,
    /// Samples in the series the peak was taken from.
    pub samples_used: usize,
    pub status: IntegratorStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSummary {
    pub sensor: String,
    pub peak: Option<PeakG>,
    pub samples: usize,
}

/// Everything a run produced, ready for JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsArtifact {
    pub summary: Summary,
    pub sensors: Vec<SensorSummary>,
    pub series: Vec<TimeSeries>,
    pub snapshots: Vec<SnapshotInfo>,
}

impl ResultsArtifact {
    pub fn to_json(&self) -> DropResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DropError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> DropResult<Self> {
        serde_json::from_str(json).map_err(|e| DropError::Serialization(e.to_string()))
    }

    /// Summary object alone.
    pub fn summary_json(&self) -> DropResult<String> {
        serde_json::to_string_pretty(&self.summary).map_err(|e| DropError::Serialization(e.to_string()))
    }

    /// Writes the artifact as pretty JSON.
    pub fn write_json(&self, path: &Path) -> DropResult<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "results written");
        Ok(())
    }
}
