//! Benchmark metrics: timing and physics numbers from one scenario run.

use dropsim_solver::IntegratorStatus;
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

/// Metrics collected from a benchmark scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub scenario: String,
    pub backend: String,
    pub node_count: usize,
    pub element_count: usize,
    /// Steps actually taken.
    pub timesteps: u64,
    pub dt: f64,
    pub critical_dt: f64,
    /// Total wall-clock time (s).
    pub total_wall_time: f64,
    pub avg_step_time: f64,
    pub min_step_time: f64,
    pub max_step_time: f64,
    pub status: IntegratorStatus,
    pub peak_g: f64,
    pub peak_g_time: f64,
    /// `|E_end − E_start| / |E_start|` with E = kinetic + potential + strain.
    pub energy_drift: f64,
    /// `|p_end − p_start| / |p_start|`.
    pub momentum_drift: f64,
    /// Fastest node at the end of the run (m/s).
    pub max_speed: f64,
    /// Whether the peak G fell inside the scenario's expected band.
    pub within_band: Option<bool>,
}

impl BenchmarkMetrics {
    pub fn to_csv_header() -> String {
        "scenario,backend,node_count,element_count,timesteps,dt_s,critical_dt_s,total_wall_time_s,avg_step_ms,min_step_ms,max_step_ms,status,peak_g,peak_g_time_s,energy_drift,momentum_drift,max_speed,within_band".to_string()
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{:.6e},{:.6e},{:.6},{:.4},{:.4},{:.4},{},{:.3},{:.6},{:.3e},{:.3e},{:.4},{}",
            self.scenario,
            self.backend,
            self.node_count,
            self.element_count,
            self.timesteps,
            self.dt,
            self.critical_dt,
            self.total_wall_time,
            self.avg_step_time * 1000.0,
            self.min_step_time * 1000.0,
            self.max_step_time * 1000.0,
            self.status,
            self.peak_g,
            self.peak_g_time,
            self.energy_drift,
            self.momentum_drift,
            self.max_speed,
            self.within_band.map_or("", |ok| if ok { "pass" } else { "fail" }),
        )
    }

    /// Header plus one row per run.
    pub fn to_csv(metrics: &[BenchmarkMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }

    pub fn to_json(metrics: &[BenchmarkMetrics]) -> DropResult<String> {
        serde_json::to_string_pretty(metrics).map_err(|e| DropError::Serialization(e.to_string()))
    }
}
